//! Proptest strategies producing values whose canonical text reads back
//! unchanged.

use proptest::prelude::*;
use proptest::sample::{select, subsequence};

use studio_core::acl::{
    AclAccessKind, AclAccessLevel, AclControl, AclGroupStyle, AclGroupTarget, AclItem, AclLevel,
    AclPrivilege, AclPrivilegeModifier, AclWhatClause, AclWhatDn, AclWhatDnStyle, AclWho,
    AclWhoClause, AclWhoDnStyle,
};
use studio_core::syncrepl::{
    BindMethod, Scope, StartTls, SyncData, SyncRepl, SyncReplType, TlsReqCert,
};
use studio_core::values::{Interval, KeepAlive, Provider, Retry, RetryCount, RetryPair};

pub fn arb_attribute_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,10}"
}

/// `cn=x,ou=y,dc=z` shaped DNs.
pub fn arb_dn() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        (select(vec!["cn", "ou", "dc", "uid"]), "[a-z][a-z0-9]{0,8}"),
        1..4,
    )
    .prop_map(|rdns| {
        rdns.iter()
            .map(|(ty, v)| format!("{}={}", ty, v))
            .collect::<Vec<_>>()
            .join(",")
    })
}

pub fn arb_interval() -> impl Strategy<Value = Interval> {
    (0u32..100, 0u32..24, 0u32..60, 0u32..60).prop_map(|(d, h, m, s)| Interval::new(d, h, m, s))
}

pub fn arb_keep_alive() -> impl Strategy<Value = KeepAlive> {
    (any::<u32>(), any::<u32>(), any::<u32>()).prop_map(|(i, p, n)| KeepAlive::new(i, p, n))
}

pub fn arb_retry() -> impl Strategy<Value = Retry> {
    let count = prop_oneof![
        (0u32..1000).prop_map(RetryCount::Times),
        Just(RetryCount::Plus),
    ];
    proptest::collection::vec(
        (0u32..86400, count).prop_map(|(interval, retries)| RetryPair { interval, retries }),
        1..5,
    )
    .prop_map(Retry::new)
}

pub fn arb_provider() -> impl Strategy<Value = Provider> {
    let host = prop_oneof![
        "[a-z][a-z0-9-]{0,10}(\\.[a-z][a-z0-9]{0,6}){0,3}",
        "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        Just("[::1]".to_string()),
    ];
    (any::<bool>(), host, proptest::option::of(any::<u16>()))
        .prop_map(|(is_ldaps, host, port)| Provider::new(is_ldaps, host, port))
}

prop_compose! {
    pub fn arb_syncrepl()(
        rid in "[0-9]{3}",
        provider in proptest::option::of(arb_provider()),
        search_base in proptest::option::of(arb_dn()),
        sync_type in proptest::option::of(select(SyncReplType::ALL)),
        interval in proptest::option::of(arb_interval()),
        retry in proptest::option::of(arb_retry()),
        scope in proptest::option::of(select(Scope::ALL)),
        attributes in proptest::collection::vec(arb_attribute_name(), 0..4),
        attrs_only in any::<bool>(),
        size_limit in proptest::option::of(-1i32..100000),
        bind_method in proptest::option::of(select(BindMethod::ALL)),
        bind_dn in proptest::option::of(arb_dn()),
        credentials in proptest::option::of("[a-zA-Z0-9]{1,12}"),
        keep_alive in proptest::option::of(arb_keep_alive()),
        start_tls in proptest::option::of(select(StartTls::ALL)),
        tls_reqcert in proptest::option::of(select(TlsReqCert::ALL)),
        sync_data in proptest::option::of(select(SyncData::ALL)),
    ) -> SyncRepl {
        SyncRepl {
            rid: Some(rid),
            provider,
            search_base,
            sync_type,
            interval,
            retry,
            filter: Some("(objectClass=*)".to_string()),
            scope,
            attributes,
            attrs_only,
            size_limit,
            bind_method,
            bind_dn,
            credentials,
            keep_alive,
            start_tls,
            tls_reqcert,
            sync_data,
            ..SyncRepl::new()
        }
    }
}

fn arb_what() -> impl Strategy<Value = AclWhatClause> {
    let dn = (
        proptest::option::of(select(
            AclWhatDnStyle::ALL
                .iter()
                .copied()
                .filter(|s| *s != AclWhatDnStyle::Regex)
                .collect::<Vec<_>>(),
        )),
        arb_dn(),
    )
        .prop_map(|(style, pattern)| AclWhatDn { style, pattern });
    let filter = select(vec!["(objectClass=person)", "(&(uid=*)(mail=*))"]).prop_map(String::from);
    let attrs = proptest::collection::vec(arb_attribute_name(), 1..4);
    let specific = (
        proptest::option::of(dn),
        proptest::option::of(filter),
        proptest::option::of(attrs),
    )
        .prop_filter("at least one part", |(d, f, a)| {
            d.is_some() || f.is_some() || a.is_some()
        })
        .prop_map(|(dn, filter, attrs)| AclWhatClause {
            star: false,
            dn,
            filter,
            attrs,
        });
    prop_oneof![Just(AclWhatClause::star()), specific]
}

fn arb_who() -> impl Strategy<Value = AclWho> {
    let style = prop_oneof![
        Just(AclWhoDnStyle::Base),
        Just(AclWhoDnStyle::Exact),
        Just(AclWhoDnStyle::One),
        Just(AclWhoDnStyle::Subtree),
        Just(AclWhoDnStyle::Children),
        (0u32..10).prop_map(AclWhoDnStyle::Level),
    ];
    prop_oneof![
        Just(AclWho::Star),
        Just(AclWho::Anonymous),
        Just(AclWho::Users),
        Just(AclWho::SelfEntry),
        (proptest::option::of(style), arb_dn()).prop_map(|(style, pattern)| AclWho::Dn {
            style,
            modifier: None,
            pattern,
        }),
        arb_attribute_name().prop_map(|attribute| AclWho::DnAttr { attribute }),
        arb_group(),
        (0u32..512).prop_map(AclWho::Ssf),
        (0u32..512).prop_map(AclWho::TlsSsf),
    ]
}

fn arb_group() -> impl Strategy<Value = AclWho> {
    let target = (arb_attribute_name(), proptest::option::of(arb_attribute_name()))
        .prop_map(|(objectclass, attribute)| AclGroupTarget::new(objectclass, attribute));
    let style = select(vec![AclGroupStyle::Exact, AclGroupStyle::Expand]);
    (proptest::option::of(target), proptest::option::of(style), arb_dn())
        .prop_map(|(target, style, pattern)| AclWho::Group {
            target,
            style,
            pattern,
        })
}

fn arb_access() -> impl Strategy<Value = AclAccessLevel> {
    let kind = prop_oneof![
        select(AclLevel::ALL).prop_map(AclAccessKind::Level),
        (
            select(vec![
                AclPrivilegeModifier::Equal,
                AclPrivilegeModifier::Plus,
                AclPrivilegeModifier::Minus,
            ]),
            subsequence(AclPrivilege::ALL.to_vec(), 1..=4),
        )
            .prop_map(|(modifier, privileges)| AclAccessKind::Privileges {
                modifier,
                privileges,
            }),
    ];
    (any::<bool>(), kind).prop_map(|(is_self, kind)| AclAccessLevel { is_self, kind })
}

pub fn arb_acl_item() -> impl Strategy<Value = AclItem> {
    let who = (
        arb_who(),
        proptest::option::of(arb_access()),
        proptest::option::of(select(AclControl::ALL)),
    )
        .prop_map(|(who, access, control)| AclWhoClause {
            who,
            access,
            control,
        });
    (arb_what(), proptest::collection::vec(who, 1..4))
        .prop_map(|(what, who)| AclItem::new(what, who))
}
