//! OpenLDAP access control items.
//!
//! An [`AclItem`] is `access to <what> by <who> [<access>] [<control>] ...`.
//! `Display` writes the canonical form, which [`crate::parseacl`] reads back.

use std::fmt;
use std::str::FromStr;

use crate::error::AclParseError;
use crate::lexer::quote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclItem {
    pub what: AclWhatClause,
    pub who: Vec<AclWhoClause>,
}

impl AclItem {
    pub fn new(what: AclWhatClause, who: Vec<AclWhoClause>) -> Self {
        AclItem { what, who }
    }

    pub fn parse(s: &str) -> Result<AclItem, AclParseError> {
        crate::parseacl::parse_acl(s)
    }
}

impl FromStr for AclItem {
    type Err = AclParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AclItem::parse(s)
    }
}

impl fmt::Display for AclItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access to {}", self.what)?;
        for who in &self.who {
            write!(f, " by {}", who)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// What
// ---------------------------------------------------------------------------

/// The entries and attributes an item applies to.  `dn`, `filter` and
/// `attrs` may be combined; `star` stands alone.  A clause with nothing set
/// means every entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AclWhatClause {
    pub star: bool,
    pub dn: Option<AclWhatDn>,
    pub filter: Option<String>,
    pub attrs: Option<Vec<String>>,
}

impl AclWhatClause {
    pub fn star() -> Self {
        AclWhatClause {
            star: true,
            ..Default::default()
        }
    }

    /// True when the clause selects every entry.
    pub fn is_star(&self) -> bool {
        self.star || (self.dn.is_none() && self.filter.is_none() && self.attrs.is_none())
    }
}

impl fmt::Display for AclWhatClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_star() {
            return f.write_str("*");
        }
        let mut sep = "";
        if let Some(dn) = &self.dn {
            write!(f, "{}", dn)?;
            sep = " ";
        }
        if let Some(filter) = &self.filter {
            f.write_str(sep)?;
            if is_balanced_filter(filter) {
                write!(f, "filter={}", filter)?;
            } else {
                write!(f, "filter={}", quote(filter))?;
            }
            sep = " ";
        }
        if let Some(attrs) = &self.attrs {
            write!(f, "{}attrs={}", sep, attrs.join(","))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclWhatDnStyle {
    Regex,
    Base,
    Exact,
    One,
    OneLevel,
    BaseObject,
    Sub,
    Subtree,
    Children,
}

impl AclWhatDnStyle {
    pub const ALL: &'static [AclWhatDnStyle] = &[
        AclWhatDnStyle::Regex,
        AclWhatDnStyle::Base,
        AclWhatDnStyle::Exact,
        AclWhatDnStyle::One,
        AclWhatDnStyle::OneLevel,
        AclWhatDnStyle::BaseObject,
        AclWhatDnStyle::Sub,
        AclWhatDnStyle::Subtree,
        AclWhatDnStyle::Children,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AclWhatDnStyle::Regex => "regex",
            AclWhatDnStyle::Base => "base",
            AclWhatDnStyle::Exact => "exact",
            AclWhatDnStyle::One => "one",
            AclWhatDnStyle::OneLevel => "onelevel",
            AclWhatDnStyle::BaseObject => "baseobject",
            AclWhatDnStyle::Sub => "sub",
            AclWhatDnStyle::Subtree => "subtree",
            AclWhatDnStyle::Children => "children",
        }
    }

    pub fn from_name(s: &str) -> Option<AclWhatDnStyle> {
        AclWhatDnStyle::ALL
            .iter()
            .copied()
            .find(|style| style.as_str().eq_ignore_ascii_case(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclWhatDn {
    pub style: Option<AclWhatDnStyle>,
    pub pattern: String,
}

impl fmt::Display for AclWhatDn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dn")?;
        if let Some(style) = self.style {
            write!(f, ".{}", style.as_str())?;
        }
        write!(f, "={}", quote(&self.pattern))
    }
}

// ---------------------------------------------------------------------------
// Who
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclWhoClause {
    pub who: AclWho,
    pub access: Option<AclAccessLevel>,
    pub control: Option<AclControl>,
}

impl AclWhoClause {
    pub fn new(who: AclWho) -> Self {
        AclWhoClause {
            who,
            access: None,
            control: None,
        }
    }
}

impl fmt::Display for AclWhoClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.who)?;
        if let Some(access) = &self.access {
            write!(f, " {}", access)?;
        }
        if let Some(control) = self.control {
            write!(f, " {}", control)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclWhoDnStyle {
    Regex,
    Base,
    Exact,
    One,
    Subtree,
    Children,
    Level(u32),
}

impl fmt::Display for AclWhoDnStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclWhoDnStyle::Regex => f.write_str("regex"),
            AclWhoDnStyle::Base => f.write_str("base"),
            AclWhoDnStyle::Exact => f.write_str("exact"),
            AclWhoDnStyle::One => f.write_str("one"),
            AclWhoDnStyle::Subtree => f.write_str("subtree"),
            AclWhoDnStyle::Children => f.write_str("children"),
            AclWhoDnStyle::Level(n) => write!(f, "level{{{}}}", n),
        }
    }
}

/// The only DN modifier OpenLDAP knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Expand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclGroupStyle {
    Exact,
    Expand,
}

impl AclGroupStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            AclGroupStyle::Exact => "exact",
            AclGroupStyle::Expand => "expand",
        }
    }
}

/// `group/<objectclass>[/<attribute>]`. An attribute is only written after
/// an object class, so the grammar cannot express one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclGroupTarget {
    pub objectclass: String,
    pub attribute: Option<String>,
}

impl AclGroupTarget {
    pub fn new(objectclass: impl Into<String>, attribute: Option<String>) -> Self {
        AclGroupTarget {
            objectclass: objectclass.into(),
            attribute,
        }
    }
}

/// The requester a `by` clause matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclWho {
    Star,
    Anonymous,
    Users,
    SelfEntry,
    Dn {
        style: Option<AclWhoDnStyle>,
        modifier: Option<Expand>,
        pattern: String,
    },
    DnAttr {
        attribute: String,
    },
    Group {
        target: Option<AclGroupTarget>,
        style: Option<AclGroupStyle>,
        pattern: String,
    },
    Ssf(u32),
    TransportSsf(u32),
    TlsSsf(u32),
    SaslSsf(u32),
}

impl AclWho {
    /// DN style with the `base` default applied.
    pub fn effective_style(&self) -> Option<AclWhoDnStyle> {
        match self {
            AclWho::Dn { style, .. } => Some(style.unwrap_or(AclWhoDnStyle::Base)),
            _ => None,
        }
    }
}

impl fmt::Display for AclWho {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclWho::Star => f.write_str("*"),
            AclWho::Anonymous => f.write_str("anonymous"),
            AclWho::Users => f.write_str("users"),
            AclWho::SelfEntry => f.write_str("self"),
            AclWho::Dn {
                style,
                modifier,
                pattern,
            } => {
                f.write_str("dn")?;
                if let Some(style) = style {
                    write!(f, ".{}", style)?;
                }
                if modifier.is_some() {
                    f.write_str(",expand")?;
                }
                write!(f, "={}", quote(pattern))
            }
            AclWho::DnAttr { attribute } => write!(f, "dnattr={}", attribute),
            AclWho::Group {
                target,
                style,
                pattern,
            } => {
                f.write_str("group")?;
                if let Some(target) = target {
                    write!(f, "/{}", target.objectclass)?;
                    if let Some(attr) = &target.attribute {
                        write!(f, "/{}", attr)?;
                    }
                }
                if let Some(style) = style {
                    write!(f, ".{}", style.as_str())?;
                }
                write!(f, "={}", quote(pattern))
            }
            AclWho::Ssf(n) => write!(f, "ssf={}", n),
            AclWho::TransportSsf(n) => write!(f, "transport_ssf={}", n),
            AclWho::TlsSsf(n) => write!(f, "tls_ssf={}", n),
            AclWho::SaslSsf(n) => write!(f, "sasl_ssf={}", n),
        }
    }
}

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Named access levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AclLevel {
    None,
    Disclose,
    Auth,
    Compare,
    Search,
    Read,
    Write,
    Manage,
}

impl AclLevel {
    pub const ALL: &'static [AclLevel] = &[
        AclLevel::None,
        AclLevel::Disclose,
        AclLevel::Auth,
        AclLevel::Compare,
        AclLevel::Search,
        AclLevel::Read,
        AclLevel::Write,
        AclLevel::Manage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AclLevel::None => "none",
            AclLevel::Disclose => "disclose",
            AclLevel::Auth => "auth",
            AclLevel::Compare => "compare",
            AclLevel::Search => "search",
            AclLevel::Read => "read",
            AclLevel::Write => "write",
            AclLevel::Manage => "manage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclPrivilegeModifier {
    Equal,
    Plus,
    Minus,
}

impl AclPrivilegeModifier {
    pub fn as_char(self) -> char {
        match self {
            AclPrivilegeModifier::Equal => '=',
            AclPrivilegeModifier::Plus => '+',
            AclPrivilegeModifier::Minus => '-',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(AclPrivilegeModifier::Equal),
            '+' => Some(AclPrivilegeModifier::Plus),
            '-' => Some(AclPrivilegeModifier::Minus),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclPrivilege {
    Manage,
    Write,
    Add,
    Delete,
    Read,
    Search,
    Compare,
    Authentication,
    Disclose,
    None,
}

impl AclPrivilege {
    pub const ALL: &'static [AclPrivilege] = &[
        AclPrivilege::Manage,
        AclPrivilege::Write,
        AclPrivilege::Add,
        AclPrivilege::Delete,
        AclPrivilege::Read,
        AclPrivilege::Search,
        AclPrivilege::Compare,
        AclPrivilege::Authentication,
        AclPrivilege::Disclose,
        AclPrivilege::None,
    ];

    pub fn as_char(self) -> char {
        match self {
            AclPrivilege::Manage => 'm',
            AclPrivilege::Write => 'w',
            AclPrivilege::Add => 'a',
            AclPrivilege::Delete => 'z',
            AclPrivilege::Read => 'r',
            AclPrivilege::Search => 's',
            AclPrivilege::Compare => 'c',
            AclPrivilege::Authentication => 'x',
            AclPrivilege::Disclose => 'd',
            AclPrivilege::None => '0',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        AclPrivilege::ALL.iter().copied().find(|p| p.as_char() == c)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclAccessKind {
    Level(AclLevel),
    Privileges {
        modifier: AclPrivilegeModifier,
        privileges: Vec<AclPrivilege>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclAccessLevel {
    pub is_self: bool,
    pub kind: AclAccessKind,
}

impl AclAccessLevel {
    pub fn level(level: AclLevel) -> Self {
        AclAccessLevel {
            is_self: false,
            kind: AclAccessKind::Level(level),
        }
    }
}

impl fmt::Display for AclAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_self {
            f.write_str("self ")?;
        }
        match &self.kind {
            AclAccessKind::Level(level) => f.write_str(level.as_str()),
            AclAccessKind::Privileges {
                modifier,
                privileges,
            } => {
                write!(f, "{}", modifier.as_char())?;
                for p in privileges {
                    write!(f, "{}", p.as_char())?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclControl {
    Stop,
    Continue,
    Break,
}

impl AclControl {
    pub const ALL: &'static [AclControl] =
        &[AclControl::Stop, AclControl::Continue, AclControl::Break];

    pub fn as_str(self) -> &'static str {
        match self {
            AclControl::Stop => "stop",
            AclControl::Continue => "continue",
            AclControl::Break => "break",
        }
    }
}

impl fmt::Display for AclControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter that can be written bare: one parenthesized group, balanced,
/// with no whitespace outside it.
pub(crate) fn is_balanced_filter(filter: &str) -> bool {
    if !filter.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in filter.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = match depth.checked_sub(1) {
                    Some(d) => d,
                    None => return false,
                };
                if depth == 0 {
                    return i + 1 == filter.len();
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_what_displays_as_star() {
        let item = AclItem::new(
            AclWhatClause::default(),
            vec![AclWhoClause::new(AclWho::Star)],
        );
        assert_eq!(item.to_string(), "access to * by *");
    }

    #[test]
    fn composite_what_display() {
        let what = AclWhatClause {
            star: false,
            dn: Some(AclWhatDn {
                style: Some(AclWhatDnStyle::Subtree),
                pattern: "dc=example,dc=com".to_string(),
            }),
            filter: Some("(objectClass=person)".to_string()),
            attrs: Some(vec!["userPassword".to_string(), "cn".to_string()]),
        };
        assert_eq!(
            what.to_string(),
            "dn.subtree=\"dc=example,dc=com\" filter=(objectClass=person) attrs=userPassword,cn"
        );
    }

    #[test]
    fn who_display_variants() {
        let dn = AclWho::Dn {
            style: Some(AclWhoDnStyle::Level(2)),
            modifier: Some(Expand),
            pattern: "dc=x".to_string(),
        };
        assert_eq!(dn.to_string(), "dn.level{2},expand=\"dc=x\"");

        let group = AclWho::Group {
            target: Some(AclGroupTarget::new("groupOfNames", Some("member".to_string()))),
            style: Some(AclGroupStyle::Exact),
            pattern: "cn=admins".to_string(),
        };
        assert_eq!(
            group.to_string(),
            "group/groupOfNames/member.exact=\"cn=admins\""
        );
        assert_eq!(AclWho::TlsSsf(256).to_string(), "tls_ssf=256");
    }

    #[test]
    fn access_display() {
        let custom = AclAccessLevel {
            is_self: true,
            kind: AclAccessKind::Privileges {
                modifier: AclPrivilegeModifier::Minus,
                privileges: vec![AclPrivilege::Write, AclPrivilege::Authentication],
            },
        };
        assert_eq!(custom.to_string(), "self -wx");
        assert_eq!(AclAccessLevel::level(AclLevel::Read).to_string(), "read");
    }

    #[test]
    fn effective_style_defaults_to_base() {
        let who = AclWho::Dn {
            style: None,
            modifier: None,
            pattern: String::new(),
        };
        assert_eq!(who.effective_style(), Some(AclWhoDnStyle::Base));
        assert_eq!(AclWho::Users.effective_style(), None);
    }

    #[test]
    fn balanced_filter_detection() {
        assert!(is_balanced_filter("(cn=a)"));
        assert!(is_balanced_filter("(&(a=b)(!(c=d)))"));
        assert!(!is_balanced_filter("(cn=a"));
        assert!(!is_balanced_filter("(a)(b)"));
        assert!(!is_balanced_filter("cn=a"));
    }

    #[test]
    fn levels_are_ordered() {
        assert!(AclLevel::Manage > AclLevel::Write);
        assert!(AclLevel::None < AclLevel::Disclose);
    }
}
