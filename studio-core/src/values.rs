//! Small value formats used inside syncrepl directives: `interval`,
//! `keepalive`, `retry` and `provider`.

use std::fmt;
use std::str::FromStr;

use crate::error::{ParseError, ParseErrorKind};

fn format_error(position: usize, message: String) -> ParseError {
    ParseError::new(ParseErrorKind::InvalidFormat, position, message)
}

/// Parse a run of ASCII digits, naming `field` in the error.
fn parse_digits(s: &str, position: usize, field: &str) -> Result<u32, ParseError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(
            ParseErrorKind::InvalidInteger,
            position,
            format!("invalid {} '{}'", field, s),
        ));
    }
    s.parse::<u32>().map_err(|_| {
        ParseError::new(
            ParseErrorKind::InvalidInteger,
            position,
            format!("{} '{}' is out of range", field, s),
        )
    })
}

/// Split `s` on `sep`, returning each piece with its byte offset.
fn split_with_offsets(s: &str, sep: char) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == sep {
            out.push((start, &s[start..i]));
            start = i + c.len_utf8();
        }
    }
    out.push((start, &s[start..]));
    out
}

// ---------------------------------------------------------------------------
// Interval -- dd:hh:mm:ss
// ---------------------------------------------------------------------------

/// Replication interval for `refreshOnly` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Interval {
    pub fn new(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Interval {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Parse exactly four two-digit groups separated by `:`.
    pub fn parse(s: &str) -> Result<Interval, ParseError> {
        let parts = split_with_offsets(s, ':');
        if parts.len() != 4 || parts.iter().any(|(_, p)| p.len() != 2) {
            return Err(format_error(
                0,
                format!("interval '{}' does not match dd:hh:mm:ss", s),
            ));
        }
        let fields = ["days", "hours", "minutes", "seconds"];
        let mut v = [0u32; 4];
        for (i, (pos, part)) in parts.iter().enumerate() {
            v[i] = parse_digits(part, *pos, fields[i])?;
        }
        Ok(Interval::new(v[0], v[1], v[2], v[3]))
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::parse(s)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

// ---------------------------------------------------------------------------
// KeepAlive -- idle:probes:interval
// ---------------------------------------------------------------------------

/// TCP keepalive settings for the replication connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeepAlive {
    pub idle: u32,
    pub probes: u32,
    pub interval: u32,
}

impl KeepAlive {
    pub fn new(idle: u32, probes: u32, interval: u32) -> Self {
        KeepAlive {
            idle,
            probes,
            interval,
        }
    }

    pub fn parse(s: &str) -> Result<KeepAlive, ParseError> {
        let parts = split_with_offsets(s, ':');
        if parts.len() != 3 {
            return Err(format_error(
                0,
                format!("keepalive '{}' does not match idle:probes:interval", s),
            ));
        }
        let idle = parse_digits(parts[0].1, parts[0].0, "idle")?;
        let probes = parse_digits(parts[1].1, parts[1].0, "probes")?;
        let interval = parse_digits(parts[2].1, parts[2].0, "interval")?;
        Ok(KeepAlive::new(idle, probes, interval))
    }
}

impl FromStr for KeepAlive {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeepAlive::parse(s)
    }
}

impl fmt::Display for KeepAlive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.idle, self.probes, self.interval)
    }
}

// ---------------------------------------------------------------------------
// Retry -- "interval count [interval count ...]"
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryCount {
    Times(u32),
    /// `+`: retry forever.
    Plus,
}

impl RetryCount {
    /// Legacy numeric form, with `-1` standing for `+`.
    pub fn as_i64(self) -> i64 {
        match self {
            RetryCount::Times(n) => n as i64,
            RetryCount::Plus => -1,
        }
    }
}

impl fmt::Display for RetryCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryCount::Times(n) => write!(f, "{}", n),
            RetryCount::Plus => f.write_str("+"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryPair {
    /// Seconds to wait between attempts.
    pub interval: u32,
    pub retries: RetryCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Retry {
    pub pairs: Vec<RetryPair>,
}

impl Retry {
    pub fn new(pairs: Vec<RetryPair>) -> Self {
        Retry { pairs }
    }

    pub fn parse(s: &str) -> Result<Retry, ParseError> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        for word in s.split_whitespace() {
            // split_whitespace hands out subslices of `s`
            let pos = s[offset..].find(word).map_or(offset, |p| p + offset);
            offset = pos + word.len();
            tokens.push((pos, word));
        }
        if tokens.is_empty() || tokens.len() % 2 != 0 {
            return Err(format_error(
                0,
                format!("retry '{}' must be a list of 'interval count' pairs", s),
            ));
        }

        let mut pairs = Vec::with_capacity(tokens.len() / 2);
        for chunk in tokens.chunks(2) {
            let (ipos, itok) = chunk[0];
            let (cpos, ctok) = chunk[1];
            let interval = parse_digits(itok, ipos, "retry interval")?;
            let retries = if ctok == "+" {
                RetryCount::Plus
            } else {
                RetryCount::Times(parse_digits(ctok, cpos, "retry count")?)
            };
            pairs.push(RetryPair { interval, retries });
        }
        Ok(Retry { pairs })
    }
}

impl FromStr for Retry {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Retry::parse(s)
    }
}

impl fmt::Display for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{} {}", pair.interval, pair.retries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Provider -- ldap[s]://host[:port]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provider {
    pub is_ldaps: bool,
    pub host: String,
    pub port: Option<u16>,
}

impl Provider {
    pub fn new(is_ldaps: bool, host: impl Into<String>, port: Option<u16>) -> Self {
        Provider {
            is_ldaps,
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> &'static str {
        if self.is_ldaps {
            "ldaps"
        } else {
            "ldap"
        }
    }

    pub fn parse(s: &str) -> Result<Provider, ParseError> {
        let has_prefix = |p: &str| {
            s.get(..p.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(p))
        };
        let (is_ldaps, rest_at) = if has_prefix("ldaps://") {
            (true, 8)
        } else if has_prefix("ldap://") {
            (false, 7)
        } else {
            return Err(format_error(
                0,
                format!("provider '{}' must start with ldap:// or ldaps://", s),
            ));
        };

        let mut rest = &s[rest_at..];
        if let Some(stripped) = rest.strip_suffix('/') {
            rest = stripped;
        }

        // Bracketed IPv6 literal
        let (host, port_part) = if rest.starts_with('[') {
            let close = rest.find(']').ok_or_else(|| {
                format_error(rest_at, format!("unterminated IPv6 address in '{}'", s))
            })?;
            (&rest[..=close], &rest[close + 1..])
        } else {
            match rest.find(':') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, ""),
            }
        };

        if host.is_empty()
            || host
                .chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '"' || c == '\'')
        {
            return Err(format_error(
                rest_at,
                format!("invalid host in provider '{}'", s),
            ));
        }

        let port = if port_part.is_empty() {
            None
        } else {
            let digits = port_part.strip_prefix(':').ok_or_else(|| {
                format_error(
                    rest_at + host.len(),
                    format!("unexpected '{}' after host", port_part),
                )
            })?;
            let pos = rest_at + host.len() + 1;
            let n = parse_digits(digits, pos, "port")?;
            let port = u16::try_from(n).map_err(|_| {
                ParseError::new(
                    ParseErrorKind::InvalidInteger,
                    pos,
                    format!("port '{}' is out of range", digits),
                )
            })?;
            Some(port)
        };

        Ok(Provider {
            is_ldaps,
            host: host.to_string(),
            port,
        })
    }
}

impl FromStr for Provider {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::parse(s)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Group 1: Interval ──────────────────────────────────────────

    #[test]
    fn interval_parse() {
        let i = Interval::parse("01:02:03:04").unwrap();
        assert_eq!(i, Interval::new(1, 2, 3, 4));
        assert_eq!(i.to_string(), "01:02:03:04");
    }

    #[test]
    fn interval_zero_pads_output() {
        assert_eq!(Interval::new(0, 5, 0, 9).to_string(), "00:05:00:09");
    }

    #[test]
    fn interval_rejects_single_digit_group() {
        let err = Interval::parse("1:02:03:04").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFormat);
    }

    #[test]
    fn interval_rejects_three_groups() {
        assert!(Interval::parse("01:02:03").is_err());
    }

    #[test]
    fn interval_names_bad_field() {
        let err = Interval::parse("01:xx:03:04").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidInteger);
        assert_eq!(err.position, 3);
        assert!(err.message.contains("hours"));
        assert!(err.message.contains("xx"));
    }

    // ── Group 2: KeepAlive ─────────────────────────────────────────

    #[test]
    fn keepalive_parse() {
        let k = KeepAlive::parse("240:10:30").unwrap();
        assert_eq!(k, KeepAlive::new(240, 10, 30));
        assert_eq!(k.to_string(), "240:10:30");
    }

    #[test]
    fn keepalive_rejects_empty_group() {
        let err = KeepAlive::parse("240::30").unwrap_err();
        assert!(err.message.contains("probes"));
    }

    #[test]
    fn keepalive_rejects_wrong_shape() {
        assert!(KeepAlive::parse("1:2").is_err());
        assert!(KeepAlive::parse("1:2:3:4").is_err());
    }

    // ── Group 3: Retry ─────────────────────────────────────────────

    #[test]
    fn retry_parse_pairs() {
        let r = Retry::parse("60 10 300 +").unwrap();
        assert_eq!(
            r.pairs,
            vec![
                RetryPair {
                    interval: 60,
                    retries: RetryCount::Times(10)
                },
                RetryPair {
                    interval: 300,
                    retries: RetryCount::Plus
                },
            ]
        );
        assert_eq!(r.to_string(), "60 10 300 +");
    }

    #[test]
    fn retry_plus_is_minus_one() {
        assert_eq!(RetryCount::Plus.as_i64(), -1);
    }

    #[test]
    fn retry_odd_token_count_fails() {
        assert!(Retry::parse("60 10 300").is_err());
    }

    #[test]
    fn retry_empty_fails() {
        assert!(Retry::parse("").is_err());
        assert!(Retry::parse("   ").is_err());
    }

    #[test]
    fn retry_plus_not_allowed_as_interval() {
        let err = Retry::parse("+ 5").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidInteger);
    }

    #[test]
    fn retry_reports_token_position() {
        let err = Retry::parse("5 5 300 x").unwrap_err();
        assert_eq!(err.position, 8);
    }

    // ── Group 4: Provider ──────────────────────────────────────────

    #[test]
    fn provider_ldaps_with_port() {
        let p = Provider::parse("ldaps://dir.example.com:636").unwrap();
        assert!(p.is_ldaps);
        assert_eq!(p.host, "dir.example.com");
        assert_eq!(p.port, Some(636));
    }

    #[test]
    fn provider_without_port() {
        let p = Provider::parse("ldap://host").unwrap();
        assert!(!p.is_ldaps);
        assert_eq!(p.port, None);
        assert_eq!(p.to_string(), "ldap://host");
    }

    #[test]
    fn provider_scheme_is_case_insensitive() {
        let p = Provider::parse("LDAP://Host:389").unwrap();
        assert_eq!(p.to_string(), "ldap://Host:389");
    }

    #[test]
    fn provider_trailing_slash_dropped() {
        let p = Provider::parse("ldap://h:389/").unwrap();
        assert_eq!(p.port, Some(389));
    }

    #[test]
    fn provider_ipv6_literal() {
        let p = Provider::parse("ldap://[::1]:389").unwrap();
        assert_eq!(p.host, "[::1]");
        assert_eq!(p.port, Some(389));
    }

    #[test]
    fn provider_bad_scheme() {
        assert!(Provider::parse("http://host").is_err());
    }

    #[test]
    fn provider_bad_port() {
        assert!(Provider::parse("ldap://host:abc").is_err());
        assert!(Provider::parse("ldap://host:70000").is_err());
        assert!(Provider::parse("ldap://host:").is_err());
    }

    #[test]
    fn provider_empty_host() {
        assert!(Provider::parse("ldap://:389").is_err());
    }

    #[test]
    fn from_str_delegates() {
        let p: Provider = "ldap://h:1".parse().unwrap();
        assert_eq!(p.port, Some(1));
    }
}
