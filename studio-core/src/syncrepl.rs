//! OpenLDAP `syncrepl` directive: model, parser and canonical serializer.
//!
//! The parser scans `key=value` options in any order.  A bad option does not
//! stop the scan; every failure is collected and reported together with the
//! options that did parse.

use std::fmt;

use log::debug;

use crate::error::{ParseError, ParseErrorKind, SyncReplErrors};
use crate::lexer::{quote, quote_if_needed, Cursor, DirectiveLexer};
use crate::values::{Interval, KeepAlive, Provider, Retry};

// ---------------------------------------------------------------------------
// Option enums
// ---------------------------------------------------------------------------

/// Defines a keyword enum with case-insensitive `parse` and a `Display`
/// that writes the canonical spelling.
macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(s: &str) -> Result<$name, ParseError> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ParseError::new(
                    ParseErrorKind::InvalidEnum,
                    0,
                    format!("unknown {} value '{}'", $label, s),
                ))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::parse(s)
            }
        }
    };
}

keyword_enum!(
    /// Replication mode.
    SyncReplType, "type" {
        RefreshOnly => "refreshOnly",
        RefreshAndPersist => "refreshAndPersist",
    }
);

keyword_enum!(Scope, "scope" {
    Sub => "sub",
    One => "one",
    Base => "base",
    Subord => "subord",
});

keyword_enum!(SchemaChecking, "schema checking" {
    On => "on",
    Off => "off",
});

keyword_enum!(BindMethod, "bind method" {
    Simple => "simple",
    Sasl => "sasl",
});

keyword_enum!(SaslMechanism, "SASL mechanism" {
    CramMd5 => "CRAM-MD5",
    DigestMd5 => "DIGEST-MD5",
    External => "EXTERNAL",
    Gssapi => "GSSAPI",
    Ntlm => "NTLM",
    Plain => "PLAIN",
    ScramSha1 => "SCRAM-SHA-1",
    ScramSha256 => "SCRAM-SHA-256",
});

keyword_enum!(StartTls, "starttls" {
    Yes => "yes",
    Critical => "critical",
});

keyword_enum!(TlsReqCert, "tls_reqcert" {
    Never => "never",
    Allow => "allow",
    Try => "try",
    Demand => "demand",
});

keyword_enum!(TlsCrlCheck, "tls_crlcheck" {
    None => "none",
    Peer => "peer",
    All => "all",
});

keyword_enum!(
    /// Format of the data received from the provider.
    SyncData, "syncdata" {
        Default => "default",
        AccessLog => "accesslog",
        ChangeLog => "changelog",
    }
);

// ---------------------------------------------------------------------------
// SyncRepl
// ---------------------------------------------------------------------------

/// One `syncrepl` consumer configuration.  Unset options are `None`/empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncRepl {
    pub rid: Option<String>,
    pub provider: Option<Provider>,
    pub search_base: Option<String>,
    pub sync_type: Option<SyncReplType>,
    pub interval: Option<Interval>,
    pub retry: Option<Retry>,
    pub filter: Option<String>,
    pub scope: Option<Scope>,
    pub attributes: Vec<String>,
    pub attrs_only: bool,
    pub size_limit: Option<i32>,
    pub time_limit: Option<i32>,
    pub schema_checking: Option<SchemaChecking>,
    pub network_timeout: Option<i32>,
    pub timeout: Option<i32>,
    pub bind_method: Option<BindMethod>,
    pub bind_dn: Option<String>,
    pub sasl_mech: Option<SaslMechanism>,
    pub authcid: Option<String>,
    pub authzid: Option<String>,
    pub credentials: Option<String>,
    pub realm: Option<String>,
    pub sec_props: Option<String>,
    pub keep_alive: Option<KeepAlive>,
    pub start_tls: Option<StartTls>,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
    pub tls_cacert: Option<String>,
    pub tls_cacert_dir: Option<String>,
    pub tls_reqcert: Option<TlsReqCert>,
    pub tls_cipher_suite: Option<String>,
    pub tls_crlcheck: Option<TlsCrlCheck>,
    pub log_base: Option<String>,
    pub log_filter: Option<String>,
    pub sync_data: Option<SyncData>,
}

impl SyncRepl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a directive.  `Ok(None)` when no known option appears at all.
    pub fn parse(s: &str) -> Result<Option<SyncRepl>, SyncReplErrors> {
        SyncReplParser::parse(s)
    }
}

/// Writes ` key=value` when the option is set.
struct Opts<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    first: bool,
}

impl Opts<'_, '_> {
    fn raw(&mut self, key: &str, value: &str) -> fmt::Result {
        if !self.first {
            self.f.write_str(" ")?;
        }
        self.first = false;
        write!(self.f, "{}={}", key, value)
    }

    fn bare<T: fmt::Display>(&mut self, key: &str, value: &Option<T>) -> fmt::Result {
        match value {
            Some(v) => self.raw(key, &quote_if_needed(&v.to_string())),
            None => Ok(()),
        }
    }

    fn quoted<T: fmt::Display>(&mut self, key: &str, value: &Option<T>) -> fmt::Result {
        match value {
            Some(v) => self.raw(key, &quote(&v.to_string())),
            None => Ok(()),
        }
    }

    fn flag(&mut self, key: &str, set: bool) -> fmt::Result {
        if !set {
            return Ok(());
        }
        if !self.first {
            self.f.write_str(" ")?;
        }
        self.first = false;
        self.f.write_str(key)
    }
}

/// Canonical directive text, options in a fixed order.
///
/// Quoted fields read back unchanged as long as they do not end in `\`:
/// the quote writer only escapes `"`, so a trailing backslash joins the
/// closing quote into `\"` and the reparse reports an unterminated quote.
impl fmt::Display for SyncRepl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut o = Opts { f, first: true };
        o.bare("rid", &self.rid)?;
        o.bare("provider", &self.provider)?;
        o.quoted("searchbase", &self.search_base)?;
        o.bare("type", &self.sync_type)?;
        o.bare("interval", &self.interval)?;
        o.quoted("retry", &self.retry)?;
        o.quoted("filter", &self.filter)?;
        o.bare("scope", &self.scope)?;
        if !self.attributes.is_empty() {
            o.raw("attrs", &quote(&self.attributes.join(",")))?;
        }
        o.flag("attrsonly", self.attrs_only)?;
        o.bare("sizelimit", &self.size_limit)?;
        o.bare("timelimit", &self.time_limit)?;
        o.bare("schemachecking", &self.schema_checking)?;
        o.bare("network-timeout", &self.network_timeout)?;
        o.bare("timeout", &self.timeout)?;
        o.bare("bindmethod", &self.bind_method)?;
        o.quoted("binddn", &self.bind_dn)?;
        o.bare("saslmech", &self.sasl_mech)?;
        o.quoted("authcid", &self.authcid)?;
        o.quoted("authzid", &self.authzid)?;
        o.bare("credentials", &self.credentials)?;
        o.bare("realm", &self.realm)?;
        o.bare("secprops", &self.sec_props)?;
        o.bare("keepalive", &self.keep_alive)?;
        o.bare("starttls", &self.start_tls)?;
        o.bare("tls_cert", &self.tls_cert)?;
        o.bare("tls_key", &self.tls_key)?;
        o.bare("tls_cacert", &self.tls_cacert)?;
        o.bare("tls_cacertdir", &self.tls_cacert_dir)?;
        o.bare("tls_reqcert", &self.tls_reqcert)?;
        o.bare("tls_ciphersuite", &self.tls_cipher_suite)?;
        o.bare("tls_crlcheck", &self.tls_crlcheck)?;
        o.quoted("logbase", &self.log_base)?;
        o.quoted("logfilter", &self.log_filter)?;
        o.bare("syncdata", &self.sync_data)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Rid,
    Provider,
    SearchBase,
    Type,
    Interval,
    Retry,
    Filter,
    Scope,
    AttrsOnly,
    Attrs,
    SizeLimit,
    TimeLimit,
    SchemaChecking,
    NetworkTimeout,
    Timeout,
    BindMethod,
    BindDn,
    SaslMech,
    AuthcId,
    AuthzId,
    Credentials,
    Realm,
    SecProps,
    KeepAlive,
    StartTls,
    TlsCert,
    TlsKey,
    TlsCacertDir,
    TlsCacert,
    TlsReqCert,
    TlsCipherSuite,
    TlsCrlCheck,
    LogBase,
    LogFilter,
    SyncData,
}

/// Longer keywords precede their prefixes.
const KEYWORDS: &[(&str, Keyword)] = &[
    ("rid", Keyword::Rid),
    ("provider", Keyword::Provider),
    ("searchbase", Keyword::SearchBase),
    ("type", Keyword::Type),
    ("interval", Keyword::Interval),
    ("retry", Keyword::Retry),
    ("filter", Keyword::Filter),
    ("scope", Keyword::Scope),
    ("attrsonly", Keyword::AttrsOnly),
    ("attrs", Keyword::Attrs),
    ("sizelimit", Keyword::SizeLimit),
    ("timelimit", Keyword::TimeLimit),
    ("schemachecking", Keyword::SchemaChecking),
    ("network-timeout", Keyword::NetworkTimeout),
    ("timeout", Keyword::Timeout),
    ("bindmethod", Keyword::BindMethod),
    ("binddn", Keyword::BindDn),
    ("saslmech", Keyword::SaslMech),
    ("authcid", Keyword::AuthcId),
    ("authzid", Keyword::AuthzId),
    ("credentials", Keyword::Credentials),
    ("realm", Keyword::Realm),
    ("secprops", Keyword::SecProps),
    ("keepalive", Keyword::KeepAlive),
    ("starttls", Keyword::StartTls),
    ("tls_cert", Keyword::TlsCert),
    ("tls_key", Keyword::TlsKey),
    ("tls_cacertdir", Keyword::TlsCacertDir),
    ("tls_cacert", Keyword::TlsCacert),
    ("tls_reqcert", Keyword::TlsReqCert),
    ("tls_ciphersuite", Keyword::TlsCipherSuite),
    ("tls_crlcheck", Keyword::TlsCrlCheck),
    ("logbase", Keyword::LogBase),
    ("logfilter", Keyword::LogFilter),
    ("syncdata", Keyword::SyncData),
];

/// Input the parser stepped over without recognizing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: usize,
    pub text: String,
}

/// Result of [`SyncReplParser::parse_with_diagnostics`].
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReplOutcome {
    pub result: Result<Option<SyncRepl>, SyncReplErrors>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Stateless, reentrant syncrepl parser.
pub struct SyncReplParser;

impl SyncReplParser {
    pub fn parse(s: &str) -> Result<Option<SyncRepl>, SyncReplErrors> {
        Self::parse_with_diagnostics(s).result
    }

    /// Parse and also report every run of unrecognized input.
    ///
    /// Input that starts no known option is stepped over one character at a
    /// time, so an option glued to noise (`(rid=1`) is still found.
    /// Adjacent skipped characters are reported as one [`Diagnostic`].
    pub fn parse_with_diagnostics(s: &str) -> SyncReplOutcome {
        let lx = DirectiveLexer::new(s);
        let mut repl = SyncRepl::new();
        let mut errors = Vec::new();
        let mut diagnostics = Vec::new();
        let mut found = false;
        let mut cur = Cursor::default();

        loop {
            cur = lx.skip_whitespace(cur);
            if lx.at_end(cur) {
                break;
            }

            let Some((name, kw, after)) = match_option(&lx, cur) else {
                let next = lx.advance(cur);
                skip_char(&mut diagnostics, cur.offset, &s[cur.offset..next.offset]);
                cur = next;
                continue;
            };
            found = true;

            if kw == Keyword::AttrsOnly {
                repl.attrs_only = true;
                cur = after;
                continue;
            }

            let value = lx
                .expect_equals(after)
                .map_err(|e| {
                    ParseError::new(
                        e.kind,
                        e.position,
                        format!("expected '=' after option '{}'", name),
                    )
                })
                .and_then(|eq| {
                    let start = lx.skip_whitespace(eq);
                    let quoted = matches!(lx.peek(start), Some('"') | Some('\''));
                    let body = start.offset + usize::from(quoted);
                    lx.read_value(eq)
                        .map(|(v, next)| (v, body, next))
                        .map_err(|e| match e.kind {
                            ParseErrorKind::EmptyValue => ParseError::new(
                                e.kind,
                                e.position,
                                format!("couldn't find the value for option '{}'", name),
                            ),
                            _ => e,
                        })
                });

            match value {
                Ok((v, body, next)) => {
                    if let Err(e) = apply(&mut repl, kw, &v) {
                        errors.push(e.offset(body));
                    }
                    cur = next;
                }
                Err(e) => {
                    errors.push(e);
                    cur = after;
                }
            }
        }

        for d in &diagnostics {
            debug!("syncrepl: skipped unrecognized input '{}' at byte {}", d.text, d.position);
        }

        let result = if !errors.is_empty() {
            Err(SyncReplErrors {
                partial: repl,
                errors,
            })
        } else if found {
            Ok(Some(repl))
        } else {
            Ok(None)
        };
        SyncReplOutcome {
            result,
            diagnostics,
        }
    }
}

/// Record one skipped character, extending the previous diagnostic when
/// it ends right here.
fn skip_char(diagnostics: &mut Vec<Diagnostic>, position: usize, text: &str) {
    match diagnostics.last_mut() {
        Some(last) if last.position + last.text.len() == position => last.text.push_str(text),
        _ => diagnostics.push(Diagnostic {
            position,
            text: text.to_string(),
        }),
    }
}

fn match_option(lx: &DirectiveLexer<'_>, cur: Cursor) -> Option<(&'static str, Keyword, Cursor)> {
    KEYWORDS
        .iter()
        .find_map(|&(name, kw)| lx.match_word(cur, name).map(|after| (name, kw, after)))
}

fn parse_int(value: &str, what: &str) -> Result<i32, ParseError> {
    value.parse::<i32>().map_err(|_| {
        ParseError::new(
            ParseErrorKind::InvalidInteger,
            0,
            format!("unable to convert {} value '{}' as an integer", what, value),
        )
    })
}

/// Store one option value.  Error positions are relative to the value.
fn apply(repl: &mut SyncRepl, kw: Keyword, v: &str) -> Result<(), ParseError> {
    let s = || Some(v.to_string());
    match kw {
        Keyword::Rid => repl.rid = s(),
        Keyword::Provider => repl.provider = Some(Provider::parse(v)?),
        Keyword::SearchBase => repl.search_base = s(),
        Keyword::Type => repl.sync_type = Some(SyncReplType::parse(v)?),
        Keyword::Interval => repl.interval = Some(Interval::parse(v)?),
        Keyword::Retry => repl.retry = Some(Retry::parse(v)?),
        Keyword::Filter => repl.filter = s(),
        Keyword::Scope => repl.scope = Some(Scope::parse(v)?),
        Keyword::Attrs => {
            repl.attributes = v
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
        }
        Keyword::AttrsOnly => repl.attrs_only = true,
        Keyword::SizeLimit => repl.size_limit = Some(parse_int(v, "size limit")?),
        Keyword::TimeLimit => repl.time_limit = Some(parse_int(v, "time limit")?),
        Keyword::SchemaChecking => repl.schema_checking = Some(SchemaChecking::parse(v)?),
        Keyword::NetworkTimeout => {
            repl.network_timeout = Some(parse_int(v, "network timeout")?)
        }
        Keyword::Timeout => repl.timeout = Some(parse_int(v, "timeout")?),
        Keyword::BindMethod => repl.bind_method = Some(BindMethod::parse(v)?),
        Keyword::BindDn => repl.bind_dn = s(),
        Keyword::SaslMech => repl.sasl_mech = Some(SaslMechanism::parse(v)?),
        Keyword::AuthcId => repl.authcid = s(),
        Keyword::AuthzId => repl.authzid = s(),
        Keyword::Credentials => repl.credentials = s(),
        Keyword::Realm => repl.realm = s(),
        Keyword::SecProps => repl.sec_props = s(),
        Keyword::KeepAlive => repl.keep_alive = Some(KeepAlive::parse(v)?),
        Keyword::StartTls => repl.start_tls = Some(StartTls::parse(v)?),
        Keyword::TlsCert => repl.tls_cert = s(),
        Keyword::TlsKey => repl.tls_key = s(),
        Keyword::TlsCacertDir => repl.tls_cacert_dir = s(),
        Keyword::TlsCacert => repl.tls_cacert = s(),
        Keyword::TlsReqCert => repl.tls_reqcert = Some(TlsReqCert::parse(v)?),
        Keyword::TlsCipherSuite => repl.tls_cipher_suite = s(),
        Keyword::TlsCrlCheck => repl.tls_crlcheck = Some(TlsCrlCheck::parse(v)?),
        Keyword::LogBase => repl.log_base = s(),
        Keyword::LogFilter => repl.log_filter = s(),
        Keyword::SyncData => repl.sync_data = Some(SyncData::parse(v)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{RetryCount, RetryPair};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn parse_ok(s: &str) -> SyncRepl {
        SyncRepl::parse(s).unwrap().unwrap()
    }

    // ── Group 1: empty and unknown input ───────────────────────────

    #[test]
    fn empty_input_is_none() {
        assert_eq!(SyncRepl::parse("").unwrap(), None);
        assert_eq!(SyncRepl::parse("   \n ").unwrap(), None);
    }

    #[test]
    fn unknown_option_is_none() {
        assert_eq!(SyncRepl::parse("unknownOption").unwrap(), None);
    }

    #[test]
    fn unknown_option_with_value_is_none() {
        assert_eq!(SyncRepl::parse("unknownOption=someValue").unwrap(), None);
    }

    #[test]
    fn unknown_input_is_reported_as_diagnostic() {
        init_logging();
        let out = SyncReplParser::parse_with_diagnostics("rid=1 bogus=2");
        assert_eq!(out.result.unwrap().unwrap().rid.as_deref(), Some("1"));
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic {
                position: 6,
                text: "bogus=2".to_string()
            }]
        );
    }

    #[test]
    fn noise_is_skipped_one_character_at_a_time() {
        init_logging();
        let out = SyncReplParser::parse_with_diagnostics("xrid=5");
        assert_eq!(out.result.unwrap().unwrap().rid.as_deref(), Some("5"));
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic {
                position: 0,
                text: "x".to_string()
            }]
        );
    }

    #[test]
    fn option_glued_to_punctuation_is_found() {
        assert_eq!(parse_ok("#rid=7").rid.as_deref(), Some("7"));
        let r = parse_ok("(rid=1 type=refreshOnly )");
        assert_eq!(r.rid.as_deref(), Some("1"));
        assert_eq!(r.sync_type, Some(SyncReplType::RefreshOnly));
        // a bare value runs to the next blank, closing paren included
        let err = SyncRepl::parse("(rid=1 type=refreshOnly)").unwrap_err();
        assert_eq!(err.partial.rid.as_deref(), Some("1"));
        assert_eq!(err.errors.len(), 1);
    }

    #[test]
    fn separate_noise_runs_give_separate_diagnostics() {
        init_logging();
        let out = SyncReplParser::parse_with_diagnostics("?? rid=1 !!");
        assert_eq!(
            out.diagnostics,
            vec![
                Diagnostic {
                    position: 0,
                    text: "??".to_string()
                },
                Diagnostic {
                    position: 9,
                    text: "!!".to_string()
                },
            ]
        );
    }

    // ── Group 2: rid ───────────────────────────────────────────────

    #[test]
    fn rid_digits() {
        assert_eq!(parse_ok("rid=1").rid.as_deref(), Some("1"));
        assert_eq!(parse_ok("rid=12").rid.as_deref(), Some("12"));
        assert_eq!(parse_ok("rid=123").rid.as_deref(), Some("123"));
    }

    #[test]
    fn rid_with_whitespace() {
        assert_eq!(parse_ok("  rid = 123  ").rid.as_deref(), Some("123"));
    }

    #[test]
    fn rid_quoted() {
        assert_eq!(parse_ok("rid=\"123\"").rid.as_deref(), Some("123"));
    }

    #[test]
    fn keyword_is_case_insensitive() {
        assert_eq!(parse_ok("RID=7").rid.as_deref(), Some("7"));
    }

    // ── Group 3: provider ──────────────────────────────────────────

    #[test]
    fn provider_plain() {
        let p = parse_ok("provider=ldap://localhost:10389").provider.unwrap();
        assert_eq!(p.host, "localhost");
        assert_eq!(p.port, Some(10389));
    }

    #[test]
    fn provider_with_whitespace() {
        let p = parse_ok("  provider  =  ldap://localhost:10389").provider.unwrap();
        assert_eq!(p.port, Some(10389));
    }

    // ── Group 4: full directives ───────────────────────────────────

    const SYMAS_1: &str = "rid=0 provider=ldap://ldapmaster.symas.com:389 bindmethod=simple \
        binddn=\"cn=replicator,dc=symas,dc=com\" credentials=secret \
        searchbase=\"dc=symas,dc=com\" logbase=\"cn=accesslog\" \
        logfilter=\"(&(objectClass=auditWriteObject)(reqResult=0))\" \
        schemachecking=on type=refreshAndPersist retry=\"60 +\" syncdata=accesslog";

    fn check_symas_1(r: &SyncRepl) {
        assert_eq!(r.rid.as_deref(), Some("0"));
        let p = r.provider.as_ref().unwrap();
        assert!(!p.is_ldaps);
        assert_eq!(p.host, "ldapmaster.symas.com");
        assert_eq!(p.port, Some(389));
        assert_eq!(r.bind_method, Some(BindMethod::Simple));
        assert_eq!(r.bind_dn.as_deref(), Some("cn=replicator,dc=symas,dc=com"));
        assert_eq!(r.credentials.as_deref(), Some("secret"));
        assert_eq!(r.search_base.as_deref(), Some("dc=symas,dc=com"));
        assert_eq!(r.log_base.as_deref(), Some("cn=accesslog"));
        assert_eq!(
            r.log_filter.as_deref(),
            Some("(&(objectClass=auditWriteObject)(reqResult=0))")
        );
        assert_eq!(r.schema_checking, Some(SchemaChecking::On));
        assert_eq!(r.sync_type, Some(SyncReplType::RefreshAndPersist));
        let retry = r.retry.as_ref().unwrap();
        assert_eq!(
            retry.pairs,
            vec![RetryPair {
                interval: 60,
                retries: RetryCount::Plus
            }]
        );
        assert_eq!(r.sync_data, Some(SyncData::AccessLog));
    }

    #[test]
    fn symas_doc_single_line() {
        check_symas_1(&parse_ok(SYMAS_1));
    }

    #[test]
    fn symas_doc_multiline() {
        let multi = SYMAS_1.replace(' ', "\n");
        // the retry value keeps its inner space
        let multi = multi.replace("\"60\n+\"", "\"60 +\"");
        check_symas_1(&parse_ok(&multi));
    }

    #[test]
    fn symas_doc_ldaps_with_timeout() {
        let r = parse_ok(
            "rid=001 provider=ldaps://ldapmaster.symas.com:389 bindmethod=simple \
             binddn=\"cn=replicator,dc=symas,dc=com\" credentials=secret \
             searchbase=\"dc=symas,dc=com\" retry=\"5 5 300 5\" timeout=1",
        );
        assert_eq!(r.rid.as_deref(), Some("001"));
        assert!(r.provider.unwrap().is_ldaps);
        assert_eq!(r.retry.unwrap().pairs.len(), 2);
        assert_eq!(r.timeout, Some(1));
    }

    #[test]
    fn refresh_only_with_attrs() {
        let r = parse_ok(
            "rid=123 provider=ldap://provider.example.com:389 type=refreshOnly \
             interval=01:00:00:00 searchbase=\"dc=example,dc=com\" \
             filter=\"(objectClass=organizationalPerson)\" scope=sub \
             attrs=\"cn,sn,ou,telephoneNumber,title,l\" schemachecking=off \
             bindmethod=simple binddn=\"cn=syncuser,dc=example,dc=com\" credentials=secret",
        );
        assert_eq!(r.sync_type, Some(SyncReplType::RefreshOnly));
        assert_eq!(r.interval, Some(Interval::new(1, 0, 0, 0)));
        assert_eq!(r.filter.as_deref(), Some("(objectClass=organizationalPerson)"));
        assert_eq!(r.scope, Some(Scope::Sub));
        assert_eq!(
            r.attributes,
            vec!["cn", "sn", "ou", "telephoneNumber", "title", "l"]
        );
        assert_eq!(r.schema_checking, Some(SchemaChecking::Off));
    }

    #[test]
    fn attrsonly_flag_without_value() {
        let r = parse_ok("rid=001 provider=ldap://h:389 type=refreshOnly attrsonly");
        assert_eq!(r.rid.as_deref(), Some("001"));
        assert!(r.provider.is_some());
        assert_eq!(r.sync_type, Some(SyncReplType::RefreshOnly));
        assert!(r.attrs_only);
        assert_eq!(r.search_base, None);
        assert_eq!(r.size_limit, None);
    }

    #[test]
    fn attrsonly_is_not_attrs() {
        let r = parse_ok("attrsonly attrs=cn");
        assert!(r.attrs_only);
        assert_eq!(r.attributes, vec!["cn"]);
    }

    #[test]
    fn attrs_split_on_comma_and_spaces() {
        let r = parse_ok("attrs=\"cn, sn,  mail\"");
        assert_eq!(r.attributes, vec!["cn", "sn", "mail"]);
    }

    #[test]
    fn tls_cacert_and_dir_are_distinct() {
        let r = parse_ok("tls_cacert=/a.pem tls_cacertdir=/certs");
        assert_eq!(r.tls_cacert.as_deref(), Some("/a.pem"));
        assert_eq!(r.tls_cacert_dir.as_deref(), Some("/certs"));
    }

    #[test]
    fn network_timeout_and_timeout() {
        let r = parse_ok("network-timeout=5 timeout=10");
        assert_eq!(r.network_timeout, Some(5));
        assert_eq!(r.timeout, Some(10));
    }

    #[test]
    fn every_enum_option() {
        let r = parse_ok(
            "saslmech=GSSAPI starttls=critical tls_reqcert=demand \
             tls_crlcheck=peer keepalive=240:10:30 sizelimit=500 timelimit=60",
        );
        assert_eq!(r.sasl_mech, Some(SaslMechanism::Gssapi));
        assert_eq!(r.start_tls, Some(StartTls::Critical));
        assert_eq!(r.tls_reqcert, Some(TlsReqCert::Demand));
        assert_eq!(r.tls_crlcheck, Some(TlsCrlCheck::Peer));
        assert_eq!(r.keep_alive, Some(KeepAlive::new(240, 10, 30)));
        assert_eq!(r.size_limit, Some(500));
        assert_eq!(r.time_limit, Some(60));
    }

    // ── Group 5: error aggregation ─────────────────────────────────

    #[test]
    fn bad_enum_keeps_other_options() {
        let err = SyncRepl::parse("type=bogus rid=5").unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].kind, ParseErrorKind::InvalidEnum);
        assert!(err.errors[0].message.contains("bogus"));
        assert_eq!(err.errors[0].position, 5);
        assert_eq!(err.partial.rid.as_deref(), Some("5"));
        assert_eq!(err.partial.sync_type, None);
    }

    #[test]
    fn several_failures_are_all_reported() {
        let err =
            SyncRepl::parse("sizelimit=abc interval=1:2 rid=9 scope=everywhere").unwrap_err();
        assert_eq!(err.errors.len(), 3);
        assert!(err.errors[0].message.contains("size limit"));
        assert_eq!(err.partial.rid.as_deref(), Some("9"));
    }

    #[test]
    fn missing_equals_is_reported() {
        let err = SyncRepl::parse("rid 123").unwrap_err();
        assert_eq!(err.errors[0].kind, ParseErrorKind::MissingEquals);
        assert!(err.errors[0].message.contains("rid"));
    }

    #[test]
    fn missing_value_is_reported() {
        let err = SyncRepl::parse("rid=").unwrap_err();
        assert_eq!(err.errors[0].kind, ParseErrorKind::EmptyValue);
        assert!(err.errors[0].message.contains("'rid'"));
    }

    #[test]
    fn unterminated_quote_is_reported() {
        let err = SyncRepl::parse("searchbase=\"dc=example").unwrap_err();
        assert_eq!(err.errors[0].kind, ParseErrorKind::UnterminatedQuote);
    }

    #[test]
    fn nested_value_error_position_is_absolute() {
        let err = SyncRepl::parse("rid=1 interval=\"01:xx:00:00\"").unwrap_err();
        // value body starts at 16, the bad group at 3 within it
        assert_eq!(err.errors[0].position, 19);
    }

    #[test]
    fn error_display_lists_every_failure() {
        let err = SyncRepl::parse("type=x scope=y").unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("2 error(s)"));
        assert!(text.contains("'x'"));
        assert!(text.contains("'y'"));
    }

    // ── Group 6: serialization ─────────────────────────────────────

    #[test]
    fn serializes_in_canonical_order() {
        let r = parse_ok("type=refreshOnly rid=001 searchbase=\"dc=x\" provider=ldap://h:389");
        assert_eq!(
            r.to_string(),
            "rid=001 provider=ldap://h:389 searchbase=\"dc=x\" type=refreshOnly"
        );
    }

    #[test]
    fn serializes_quoted_fields_with_escapes() {
        let mut r = SyncRepl::new();
        r.filter = Some("(cn=say \"hi\")".to_string());
        r.attributes = vec!["cn".to_string(), "sn".to_string()];
        r.attrs_only = true;
        assert_eq!(
            r.to_string(),
            "filter=\"(cn=say \\\"hi\\\")\" attrs=\"cn,sn\" attrsonly"
        );
    }

    #[test]
    fn trailing_backslash_does_not_read_back() {
        let mut r = SyncRepl::new();
        r.rid = Some("1".to_string());
        r.search_base = Some("dc=x\\".to_string());
        let text = r.to_string();
        assert_eq!(text, "rid=1 searchbase=\"dc=x\\\"");
        let err = SyncRepl::parse(&text).unwrap_err();
        assert_eq!(err.errors[0].kind, ParseErrorKind::UnterminatedQuote);
    }

    #[test]
    fn empty_record_serializes_to_empty_string() {
        assert_eq!(SyncRepl::new().to_string(), "");
    }

    #[test]
    fn round_trip_full_directive() {
        let r = parse_ok(SYMAS_1);
        let again = parse_ok(&r.to_string());
        assert_eq!(r, again);
    }

    #[test]
    fn clone_is_deep() {
        let r = parse_ok(SYMAS_1);
        let mut copy = r.clone();
        copy.retry = None;
        assert!(r.retry.is_some());
    }

    #[test]
    fn enum_all_lists_every_variant() {
        assert_eq!(TlsReqCert::ALL.len(), 4);
        assert_eq!(SyncData::ALL.len(), 3);
        for s in Scope::ALL {
            assert_eq!(Scope::parse(s.as_str()).unwrap(), *s);
        }
    }
}
