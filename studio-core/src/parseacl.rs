//! Parser for OpenLDAP `access to ... by ...` directives.
//!
//! Grammar (whitespace-separated, keywords case-insensitive):
//!
//! ```text
//! [access] to [* | dn[.style]="dn" | filter=(...) | attrs=a,b ...]
//!     by <who> [[self] <level>|<privileges>] [stop|continue|break] ...
//! ```

use log::trace;

use crate::acl::{
    AclAccessKind, AclAccessLevel, AclControl, AclGroupStyle, AclGroupTarget, AclItem, AclLevel,
    AclPrivilege, AclPrivilegeModifier, AclWhatClause, AclWhatDn, AclWhatDnStyle, AclWho,
    AclWhoClause, AclWhoDnStyle, Expand,
};
use crate::error::{AclClause, AclParseError, ParseError, ParseErrorKind};
use crate::lexer::{is_word_char, Cursor, DirectiveLexer};

type Result<T> = std::result::Result<T, AclParseError>;

/// Parse one access directive.
pub fn parse_acl(s: &str) -> Result<AclItem> {
    let item = AclParser::new(s).parse()?;
    trace!("parsed ACL: {}", item);
    Ok(item)
}

struct AclParser<'a> {
    lx: DirectiveLexer<'a>,
    cur: Cursor,
    clause: AclClause,
}

impl<'a> AclParser<'a> {
    fn new(input: &'a str) -> Self {
        AclParser {
            lx: DirectiveLexer::new(input),
            cur: Cursor::default(),
            clause: AclClause::Header,
        }
    }

    fn err(
        &self,
        kind: ParseErrorKind,
        position: usize,
        message: impl Into<String>,
    ) -> AclParseError {
        AclParseError {
            clause: self.clause,
            error: ParseError::new(kind, position, message),
        }
    }

    fn wrap(&self, error: ParseError) -> AclParseError {
        AclParseError {
            clause: self.clause,
            error,
        }
    }

    // -- scanning primitives --

    fn skip_ws(&mut self) {
        self.cur = self.lx.skip_whitespace(self.cur);
    }

    fn peek(&self) -> Option<char> {
        self.lx.peek(self.cur)
    }

    fn at_end(&self) -> bool {
        self.lx.at_end(self.cur)
    }

    /// True when the cursor sits on whitespace or the end of input.
    fn at_boundary(&self) -> bool {
        self.peek().map_or(true, char::is_whitespace)
    }

    fn peek_word(&self, word: &str) -> bool {
        self.lx.match_word(self.cur, word).is_some()
    }

    fn eat_word(&mut self, word: &str) -> bool {
        match self.lx.match_word(self.cur, word) {
            Some(next) => {
                self.cur = next;
                true
            }
            None => false,
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.cur = self.lx.advance(self.cur);
            true
        } else {
            false
        }
    }

    /// Read a run of name characters (possibly empty).
    fn read_name(&mut self) -> String {
        let rest = self.lx.rest(self.cur);
        let len = rest
            .find(|c: char| !is_word_char(c))
            .unwrap_or(rest.len());
        self.cur = Cursor::new(self.cur.offset + len);
        rest[..len].to_string()
    }

    fn expect_name(&mut self, what: &str) -> Result<String> {
        let start = self.cur.offset;
        let name = self.read_name();
        if name.is_empty() {
            return Err(self.err(
                ParseErrorKind::EmptyValue,
                start,
                format!("expected {}", what),
            ));
        }
        Ok(name)
    }

    fn expect_equals(&mut self) -> Result<()> {
        self.cur = self.lx.expect_equals(self.cur).map_err(|e| self.wrap(e))?;
        Ok(())
    }

    /// Describe the token at the cursor for error messages.
    fn token_here(&self) -> String {
        let (token, _) = self.lx.read_bare(self.cur);
        token
    }

    fn unexpected(&self, context: &str) -> AclParseError {
        if self.at_end() {
            self.err(
                ParseErrorKind::UnexpectedEnd,
                self.cur.offset,
                format!("unexpected end of input in {}", context),
            )
        } else {
            self.err(
                ParseErrorKind::UnexpectedToken,
                self.cur.offset,
                format!("unexpected '{}' in {}", self.token_here(), context),
            )
        }
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        self.skip_ws();
        let start = self.cur.offset;
        let rest = self.lx.rest(self.cur);
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..len];
        let value = digits.parse::<u32>().map_err(|_| {
            self.err(
                ParseErrorKind::InvalidInteger,
                start,
                format!("invalid {} '{}'", what, self.token_here()),
            )
        })?;
        self.cur = Cursor::new(start + len);
        Ok(value)
    }

    /// Read a quoted DN after `=`, validating it unless it is a regex.
    fn read_dn_pattern(&mut self, validate: bool) -> Result<String> {
        self.skip_ws();
        let start = self.cur.offset;
        match self.peek() {
            Some('"') | Some('\'') => {}
            _ => {
                return Err(self.err(
                    ParseErrorKind::UnexpectedToken,
                    start,
                    "DN pattern must be quoted",
                ))
            }
        }
        let (pattern, next) = self.lx.read_quoted(self.cur).map_err(|e| self.wrap(e))?;
        if validate {
            if let Err(message) = validate_dn(&pattern) {
                return Err(self.err(ParseErrorKind::InvalidFormat, start + 1, message));
            }
        }
        self.cur = next;
        Ok(pattern)
    }

    // -- grammar --

    fn parse(mut self) -> Result<AclItem> {
        self.header()?;
        self.clause = AclClause::What;
        let what = self.what()?;

        let mut who = Vec::new();
        loop {
            self.skip_ws();
            if self.at_end() {
                break;
            }
            self.clause = AclClause::Who(who.len());
            if !self.eat_word("by") {
                return Err(self.unexpected("'by' clause"));
            }
            who.push(self.who_clause()?);
        }
        Ok(AclItem::new(what, who))
    }

    fn header(&mut self) -> Result<()> {
        self.skip_ws();
        if self.eat_word("access") {
            self.skip_ws();
        }
        if !self.eat_word("to") {
            return Err(self.unexpected("access header, expected 'to'"));
        }
        Ok(())
    }

    fn what(&mut self) -> Result<AclWhatClause> {
        let mut what = AclWhatClause::default();
        loop {
            self.skip_ws();
            if self.at_end() {
                return Err(self.err(
                    ParseErrorKind::UnexpectedEnd,
                    self.cur.offset,
                    "expected at least one 'by' clause",
                ));
            }
            if self.peek_word("by") {
                if what.dn.is_none() && what.filter.is_none() && what.attrs.is_none() {
                    what.star = true;
                }
                return Ok(what);
            }

            let start = self.cur.offset;
            if self.peek() == Some('*') {
                self.cur = self.lx.advance(self.cur);
                if !self.at_boundary() {
                    return Err(self.err(
                        ParseErrorKind::UnexpectedToken,
                        start,
                        "'*' must stand alone",
                    ));
                }
                if what.star || what.dn.is_some() || what.filter.is_some() || what.attrs.is_some() {
                    return Err(self.err(
                        ParseErrorKind::Duplicate,
                        start,
                        "'*' cannot be combined with other targets",
                    ));
                }
                what.star = true;
            } else if self.eat_word("dn") {
                self.reject_after_star(&what, start)?;
                if what.dn.is_some() {
                    return Err(self.err(ParseErrorKind::Duplicate, start, "duplicate 'dn' target"));
                }
                what.dn = Some(self.what_dn()?);
            } else if self.eat_word("filter") {
                self.reject_after_star(&what, start)?;
                if what.filter.is_some() {
                    return Err(self.err(
                        ParseErrorKind::Duplicate,
                        start,
                        "duplicate 'filter' target",
                    ));
                }
                self.expect_equals()?;
                what.filter = Some(self.filter()?);
            } else if self.eat_word("attrs") {
                self.reject_after_star(&what, start)?;
                if what.attrs.is_some() {
                    return Err(self.err(
                        ParseErrorKind::Duplicate,
                        start,
                        "duplicate 'attrs' target",
                    ));
                }
                self.expect_equals()?;
                what.attrs = Some(self.attr_list()?);
            } else {
                return Err(self.unexpected("'what' clause"));
            }
        }
    }

    fn reject_after_star(&self, what: &AclWhatClause, start: usize) -> Result<()> {
        if what.star {
            return Err(self.err(
                ParseErrorKind::Duplicate,
                start,
                "'*' cannot be combined with other targets",
            ));
        }
        Ok(())
    }

    fn what_dn(&mut self) -> Result<AclWhatDn> {
        let mut style = None;
        if self.eat_char('.') {
            let start = self.cur.offset;
            let name = self.expect_name("a DN style")?;
            style = Some(AclWhatDnStyle::from_name(&name).ok_or_else(|| {
                self.err(
                    ParseErrorKind::InvalidEnum,
                    start,
                    format!("unknown DN style '{}'", name),
                )
            })?);
        }
        self.expect_equals()?;
        let pattern = self.read_dn_pattern(style != Some(AclWhatDnStyle::Regex))?;
        Ok(AclWhatDn { style, pattern })
    }

    fn filter(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.cur.offset;
        let unbalanced = |p: &Self| {
            p.err(
                ParseErrorKind::InvalidFormat,
                start,
                "unbalanced parentheses in filter",
            )
        };

        let filter = match self.peek() {
            Some('"') | Some('\'') => {
                let (value, next) = self.lx.read_quoted(self.cur).map_err(|e| self.wrap(e))?;
                self.cur = next;
                if !parens_balance(&value) {
                    return Err(unbalanced(self));
                }
                value
            }
            Some('(') => {
                let rest = self.lx.rest(self.cur);
                let mut depth = 0usize;
                let mut end = None;
                for (i, c) in rest.char_indices() {
                    match c {
                        '(' => depth += 1,
                        ')' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(i + 1);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| unbalanced(self))?;
                let value = rest[..end].to_string();
                self.cur = Cursor::new(start + end);
                if !self.at_boundary() {
                    return Err(unbalanced(self));
                }
                value
            }
            _ => {
                let (value, next) = self.lx.read_bare(self.cur);
                self.cur = next;
                if !parens_balance(&value) {
                    return Err(unbalanced(self));
                }
                value
            }
        };

        if filter.is_empty() {
            return Err(self.err(ParseErrorKind::EmptyValue, start, "empty filter"));
        }
        Ok(filter)
    }

    fn attr_list(&mut self) -> Result<Vec<String>> {
        self.skip_ws();
        let start = self.cur.offset;
        let (list, next) = self.lx.read_bare(self.cur);
        if list.is_empty() {
            return Err(self.err(ParseErrorKind::EmptyValue, start, "empty attribute list"));
        }
        let attrs: Vec<String> = list.split(',').map(str::to_string).collect();
        if attrs.iter().any(String::is_empty) {
            return Err(self.err(
                ParseErrorKind::InvalidFormat,
                start,
                format!("empty attribute name in '{}'", list),
            ));
        }
        self.cur = next;
        Ok(attrs)
    }

    fn who_clause(&mut self) -> Result<AclWhoClause> {
        self.skip_ws();
        let who = self.who()?;
        let access = self.access()?;
        let control = self.control();

        self.skip_ws();
        if !self.at_end() && !self.peek_word("by") {
            return Err(self.unexpected("'who' clause"));
        }
        Ok(AclWhoClause {
            who,
            access,
            control,
        })
    }

    fn who(&mut self) -> Result<AclWho> {
        let start = self.cur.offset;
        if self.peek() == Some('*') {
            self.cur = self.lx.advance(self.cur);
            if !self.at_boundary() {
                return Err(self.err(
                    ParseErrorKind::UnexpectedToken,
                    start,
                    "'*' must stand alone",
                ));
            }
            return Ok(AclWho::Star);
        }
        if self.eat_word("anonymous") {
            return Ok(AclWho::Anonymous);
        }
        if self.eat_word("users") {
            return Ok(AclWho::Users);
        }
        if self.eat_word("self") {
            return Ok(AclWho::SelfEntry);
        }
        if self.eat_word("dn") {
            return self.who_dn(start);
        }
        if self.eat_word("dnattr") {
            self.expect_equals()?;
            self.skip_ws();
            let attribute = self.expect_name("an attribute name")?;
            return Ok(AclWho::DnAttr { attribute });
        }
        if self.eat_word("group") {
            return self.who_group();
        }
        if self.eat_word("ssf") {
            self.expect_equals()?;
            return Ok(AclWho::Ssf(self.read_u32("ssf")?));
        }
        if self.eat_word("transport_ssf") {
            self.expect_equals()?;
            return Ok(AclWho::TransportSsf(self.read_u32("transport_ssf")?));
        }
        if self.eat_word("tls_ssf") {
            self.expect_equals()?;
            return Ok(AclWho::TlsSsf(self.read_u32("tls_ssf")?));
        }
        if self.eat_word("sasl_ssf") {
            self.expect_equals()?;
            return Ok(AclWho::SaslSsf(self.read_u32("sasl_ssf")?));
        }
        Err(self.unexpected("'who' clause"))
    }

    fn who_dn(&mut self, start: usize) -> Result<AclWho> {
        let mut style = None;
        if self.eat_char('.') {
            let name_at = self.cur.offset;
            let name = self.expect_name("a DN style")?;
            style = Some(match name.to_ascii_lowercase().as_str() {
                "regex" => AclWhoDnStyle::Regex,
                "base" => AclWhoDnStyle::Base,
                "exact" => AclWhoDnStyle::Exact,
                "one" => AclWhoDnStyle::One,
                "subtree" => AclWhoDnStyle::Subtree,
                "children" => AclWhoDnStyle::Children,
                "level" => {
                    if !self.eat_char('{') {
                        return Err(self.unexpected("DN level, expected '{'"));
                    }
                    let n = self.read_u32("DN level")?;
                    if !self.eat_char('}') {
                        return Err(self.unexpected("DN level, expected '}'"));
                    }
                    AclWhoDnStyle::Level(n)
                }
                _ => {
                    return Err(self.err(
                        ParseErrorKind::InvalidEnum,
                        name_at,
                        format!("unknown DN style '{}'", name),
                    ))
                }
            });
        }

        let mut modifier = None;
        if self.eat_char(',') {
            if !self.eat_word("expand") {
                return Err(self.unexpected("DN modifier, expected 'expand'"));
            }
            if style.is_none() {
                return Err(self.err(
                    ParseErrorKind::InvalidFormat,
                    start,
                    "the 'expand' modifier requires an explicit DN style",
                ));
            }
            modifier = Some(Expand);
        }

        self.expect_equals()?;
        let pattern = self.read_dn_pattern(style != Some(AclWhoDnStyle::Regex))?;
        Ok(AclWho::Dn {
            style,
            modifier,
            pattern,
        })
    }

    fn who_group(&mut self) -> Result<AclWho> {
        let mut target = None;
        if self.eat_char('/') {
            let objectclass = self.expect_name("an object class")?;
            let mut attribute = None;
            if self.eat_char('/') {
                attribute = Some(self.expect_name("an attribute name")?);
            }
            target = Some(AclGroupTarget::new(objectclass, attribute));
        }

        let mut style = None;
        if self.eat_char('.') {
            let name_at = self.cur.offset;
            let name = self.expect_name("a group style")?;
            style = Some(match name.to_ascii_lowercase().as_str() {
                "exact" => AclGroupStyle::Exact,
                "expand" => AclGroupStyle::Expand,
                _ => {
                    return Err(self.err(
                        ParseErrorKind::InvalidEnum,
                        name_at,
                        format!("unknown group style '{}'", name),
                    ))
                }
            });
        }

        self.expect_equals()?;
        let pattern = self.read_dn_pattern(true)?;
        Ok(AclWho::Group {
            target,
            style,
            pattern,
        })
    }

    fn access(&mut self) -> Result<Option<AclAccessLevel>> {
        self.skip_ws();
        let is_self = self.eat_word("self");
        if is_self {
            self.skip_ws();
        }

        if let Some(level) = AclLevel::ALL.iter().copied().find(|l| self.peek_word(l.as_str())) {
            self.eat_word(level.as_str());
            return Ok(Some(AclAccessLevel {
                is_self,
                kind: AclAccessKind::Level(level),
            }));
        }

        if let Some(modifier) = self.peek().and_then(AclPrivilegeModifier::from_char) {
            self.cur = self.lx.advance(self.cur);
            let mut privileges = Vec::new();
            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    break;
                }
                let privilege = AclPrivilege::from_char(c).ok_or_else(|| {
                    self.err(
                        ParseErrorKind::InvalidEnum,
                        self.cur.offset,
                        format!("unknown privilege '{}'", c),
                    )
                })?;
                privileges.push(privilege);
                self.cur = self.lx.advance(self.cur);
            }
            if privileges.is_empty() {
                return Err(self.unexpected("privilege list"));
            }
            return Ok(Some(AclAccessLevel {
                is_self,
                kind: AclAccessKind::Privileges {
                    modifier,
                    privileges,
                },
            }));
        }

        if is_self {
            return Err(self.unexpected("access level after 'self'"));
        }
        Ok(None)
    }

    fn control(&mut self) -> Option<AclControl> {
        self.skip_ws();
        let control = AclControl::ALL
            .iter()
            .copied()
            .find(|c| self.peek_word(c.as_str()))?;
        self.eat_word(control.as_str());
        Some(control)
    }
}

/// Parentheses never close more than they open and end balanced.
fn parens_balance(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Every comma-separated RDN must be `type=value`.  Backslash escapes a
/// comma.  The empty DN is valid.
fn validate_dn(dn: &str) -> std::result::Result<(), String> {
    if dn.is_empty() {
        return Ok(());
    }
    let mut rdns = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in dn.chars() {
        if escaped {
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            current.push(c);
            escaped = true;
        } else if c == ',' {
            rdns.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    rdns.push(current);

    for rdn in &rdns {
        match rdn.split_once('=') {
            Some((attr, _)) if !attr.trim().is_empty() => {}
            _ => return Err(format!("invalid DN '{}': bad RDN '{}'", dn, rdn)),
        }
    }
    Ok(())
}
