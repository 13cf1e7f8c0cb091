//! RFC 4512 schema element descriptions.
//!
//! Each of the five element kinds parses from (and displays back to) the
//! parenthesised description syntax used in a subschema entry.  Parsing runs
//! in a tolerant mode that accepts the usual server quirks: lower-case
//! keywords, unquoted names, whitespace-separated OID lists, quoted syntax
//! OIDs and a missing closing parenthesis.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::error::{ElementKind, SchemaError};

/// Extension values keyed by upper-cased `X-` keyword.
pub type Extensions = BTreeMap<String, Vec<String>>;

/// Marks an element synthesized for an identifier the schema doesn't declare.
pub const X_DUMMY: &str = "X-DUMMY";

/// Holds the LDIF value an element was parsed from.
pub const X_RAW_SCHEMA_DEFINITION: &str = "X-RAW-SCHEMA-DEFINITION";

/// Behaviour shared by the five description kinds.
pub trait SchemaElement: Clone + fmt::Display {
    const KIND: ElementKind;

    fn oid(&self) -> &str;
    fn names(&self) -> &[String];
    fn description(&self) -> &str;
    fn extensions(&self) -> &Extensions;
    fn extensions_mut(&mut self) -> &mut Extensions;
    fn is_synthesized(&self) -> bool;

    /// A placeholder for an unknown identifier.
    fn dummy(identifier: &str) -> Self;

    /// First name, else the OID.
    fn name(&self) -> &str {
        self.names().first().map(String::as_str).unwrap_or(self.oid())
    }

    /// The OID followed by every name.
    fn identifiers(&self) -> Vec<&str> {
        let mut ids = vec![self.oid()];
        ids.extend(self.names().iter().map(String::as_str));
        ids
    }

    /// True if `id` is the OID or one of the names, ignoring case.
    fn has_identifier(&self, id: &str) -> bool {
        self.identifiers().iter().any(|i| i.eq_ignore_ascii_case(id))
    }

    fn raw_value(&self) -> Option<&str> {
        self.extensions()
            .get(X_RAW_SCHEMA_DEFINITION)
            .and_then(|v| v.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectClassKind {
    Abstract,
    #[default]
    Structural,
    Auxiliary,
}

impl ObjectClassKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClassKind::Abstract => "ABSTRACT",
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
        }
    }
}

/// The `USAGE` of an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Usage {
    #[default]
    UserApplications,
    DirectoryOperation,
    DistributedOperation,
    DsaOperation,
}

impl Usage {
    pub const ALL: [Usage; 4] = [
        Usage::UserApplications,
        Usage::DirectoryOperation,
        Usage::DistributedOperation,
        Usage::DsaOperation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Usage::UserApplications => "userApplications",
            Usage::DirectoryOperation => "directoryOperation",
            Usage::DistributedOperation => "distributedOperation",
            Usage::DsaOperation => "dSAOperation",
        }
    }

    pub fn parse(s: &str) -> Option<Usage> {
        Usage::ALL
            .into_iter()
            .find(|u| u.as_str().eq_ignore_ascii_case(s))
    }

    pub fn is_operational(self) -> bool {
        self != Usage::UserApplications
    }
}

fn dummy_extensions() -> Extensions {
    let mut ext = Extensions::new();
    ext.insert(X_DUMMY.to_string(), vec!["true".to_string()]);
    ext
}

// ---------------------------------------------------------------------------
// Element types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectClassDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: String,
    pub obsolete: bool,
    pub superiors: Vec<String>,
    pub kind: ObjectClassKind,
    pub must: Vec<String>,
    pub may: Vec<String>,
    pub extensions: Extensions,
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTypeDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: String,
    pub obsolete: bool,
    pub superior: Option<String>,
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substring: Option<String>,
    pub syntax: Option<String>,
    pub syntax_length: Option<u64>,
    pub single_valued: bool,
    pub collective: bool,
    pub user_modifiable: bool,
    pub usage: Usage,
    pub extensions: Extensions,
    pub synthesized: bool,
}

impl Default for AttributeTypeDescription {
    fn default() -> Self {
        AttributeTypeDescription {
            oid: String::new(),
            names: Vec::new(),
            description: String::new(),
            obsolete: false,
            superior: None,
            equality: None,
            ordering: None,
            substring: None,
            syntax: None,
            syntax_length: None,
            single_valued: false,
            collective: false,
            user_modifiable: true,
            usage: Usage::UserApplications,
            extensions: Extensions::new(),
            synthesized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LdapSyntaxDescription {
    pub oid: String,
    pub description: String,
    pub extensions: Extensions,
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchingRuleDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: String,
    pub obsolete: bool,
    pub syntax: Option<String>,
    pub extensions: Extensions,
    pub synthesized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchingRuleUseDescription {
    pub oid: String,
    pub names: Vec<String>,
    pub description: String,
    pub obsolete: bool,
    pub applies: Vec<String>,
    pub extensions: Extensions,
    pub synthesized: bool,
}

macro_rules! element_accessors {
    () => {
        fn oid(&self) -> &str {
            &self.oid
        }
        fn description(&self) -> &str {
            &self.description
        }
        fn extensions(&self) -> &Extensions {
            &self.extensions
        }
        fn extensions_mut(&mut self) -> &mut Extensions {
            &mut self.extensions
        }
        fn is_synthesized(&self) -> bool {
            self.synthesized
        }
    };
}

impl SchemaElement for ObjectClassDescription {
    const KIND: ElementKind = ElementKind::ObjectClass;
    element_accessors!();

    fn names(&self) -> &[String] {
        &self.names
    }

    fn dummy(identifier: &str) -> Self {
        ObjectClassDescription {
            oid: identifier.to_string(),
            names: vec![identifier.to_string()],
            extensions: dummy_extensions(),
            synthesized: true,
            ..Default::default()
        }
    }
}

impl SchemaElement for AttributeTypeDescription {
    const KIND: ElementKind = ElementKind::AttributeType;
    element_accessors!();

    fn names(&self) -> &[String] {
        &self.names
    }

    fn dummy(identifier: &str) -> Self {
        AttributeTypeDescription {
            oid: identifier.to_string(),
            names: vec![identifier.to_string()],
            extensions: dummy_extensions(),
            synthesized: true,
            ..Default::default()
        }
    }
}

impl SchemaElement for LdapSyntaxDescription {
    const KIND: ElementKind = ElementKind::LdapSyntax;
    element_accessors!();

    fn names(&self) -> &[String] {
        &[]
    }

    fn dummy(identifier: &str) -> Self {
        LdapSyntaxDescription {
            oid: identifier.to_string(),
            description: String::new(),
            extensions: dummy_extensions(),
            synthesized: true,
        }
    }
}

impl SchemaElement for MatchingRuleDescription {
    const KIND: ElementKind = ElementKind::MatchingRule;
    element_accessors!();

    fn names(&self) -> &[String] {
        &self.names
    }

    fn dummy(identifier: &str) -> Self {
        MatchingRuleDescription {
            oid: identifier.to_string(),
            names: vec![identifier.to_string()],
            extensions: dummy_extensions(),
            synthesized: true,
            ..Default::default()
        }
    }
}

impl SchemaElement for MatchingRuleUseDescription {
    const KIND: ElementKind = ElementKind::MatchingRuleUse;
    element_accessors!();

    fn names(&self) -> &[String] {
        &self.names
    }

    fn dummy(identifier: &str) -> Self {
        MatchingRuleUseDescription {
            oid: identifier.to_string(),
            names: vec![identifier.to_string()],
            extensions: dummy_extensions(),
            synthesized: true,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    Dollar,
    Quoted(String),
    Bare(String),
}

impl Token {
    /// The text of a quoted or bare token.
    fn into_text(self) -> Option<String> {
        match self {
            Token::Quoted(s) | Token::Bare(s) => Some(s),
            _ => None,
        }
    }
}

/// Undo the `\27` and `\5C` escapes of a qdstring.
fn unescape_qdstring(s: &str) -> String {
    s.replace("\\27", "'")
        .replace("\\5C", "\\")
        .replace("\\5c", "\\")
}

fn escape_qdstring(s: &str) -> String {
    s.replace('\\', "\\5C").replace('\'', "\\27")
}

struct SchemaTokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SchemaTokenizer<'a> {
    fn new(input: &'a str) -> Self {
        SchemaTokenizer { input, pos: 0 }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let c = rest.chars().next()?;
        match c {
            '(' | ')' | '$' => {
                self.pos += 1;
                Some(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    _ => Token::Dollar,
                })
            }
            '\'' => {
                // unterminated quotes run to the end of the input
                let body = &rest[1..];
                let len = body.find('\'').unwrap_or(body.len());
                self.pos += 1 + len + usize::from(len < body.len());
                Some(Token::Quoted(unescape_qdstring(&body[..len])))
            }
            _ => {
                let len = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '$'))
                    .unwrap_or(rest.len());
                self.pos += len;
                Some(Token::Bare(rest[..len].to_string()))
            }
        }
    }

    fn peek_token(&mut self) -> Option<Token> {
        let saved = self.pos;
        let tok = self.next_token();
        self.pos = saved;
        tok
    }

    /// A single OID or a parenthesised list of them, separated by `$` or
    /// whitespace.
    fn read_oids(&mut self) -> Vec<String> {
        match self.peek_token() {
            Some(Token::LParen) => {
                self.next_token();
                let mut result = Vec::new();
                while let Some(tok) = self.next_token() {
                    match tok {
                        Token::RParen => break,
                        Token::Dollar | Token::LParen => {}
                        Token::Quoted(s) | Token::Bare(s) => result.push(s),
                    }
                }
                result
            }
            Some(Token::Quoted(_)) | Some(Token::Bare(_)) => {
                self.next_token().and_then(Token::into_text).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn read_oid(&mut self) -> Option<String> {
        match self.peek_token() {
            Some(Token::Quoted(_)) | Some(Token::Bare(_)) => {
                self.next_token().and_then(Token::into_text)
            }
            _ => None,
        }
    }

    /// An OID with an optional `{len}` suffix, which may follow a quoted OID.
    fn read_noidlen(&mut self) -> Option<(String, Option<u64>)> {
        let mut text = self.read_oid()?;
        if let Some(Token::Bare(next)) = self.peek_token() {
            if next.starts_with('{') {
                self.next_token();
                text.push_str(&next);
            }
        }
        Some(match text.split_once('{') {
            Some((oid, len)) => {
                let len = len.trim_end_matches('}').trim().parse().ok();
                (oid.trim().to_string(), len)
            }
            None => (text, None),
        })
    }

    /// Skip the value of an unknown keyword.  A following bare word that
    /// looks like a keyword is left in place.
    fn skip_value(&mut self) {
        match self.peek_token() {
            Some(Token::LParen) => {
                self.next_token();
                let mut depth = 1;
                while depth > 0 {
                    match self.next_token() {
                        Some(Token::LParen) => depth += 1,
                        Some(Token::RParen) => depth -= 1,
                        None => break,
                        _ => {}
                    }
                }
            }
            Some(Token::Quoted(_)) => {
                self.next_token();
            }
            Some(Token::Bare(word)) => {
                if !looks_like_keyword(&word) {
                    self.next_token();
                }
            }
            _ => {}
        }
    }
}

fn looks_like_keyword(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_uppercase() || c == '-' || c == '_')
}

/// Fields every description carries.
#[derive(Default)]
struct Common {
    oid: String,
    names: Vec<String>,
    description: String,
    obsolete: bool,
    extensions: Extensions,
}

fn element_error(kind: ElementKind, message: impl Into<String>) -> SchemaError {
    SchemaError::Element {
        kind,
        message: message.into(),
    }
}

/// Drive the tokenizer over one description.  Keywords not shared by every
/// kind go to `specific`, which returns false for keywords it doesn't know.
fn parse_description<F>(
    kind: ElementKind,
    input: &str,
    mut specific: F,
) -> Result<Common, SchemaError>
where
    F: FnMut(&str, &mut SchemaTokenizer<'_>) -> Result<bool, SchemaError>,
{
    let mut tok = SchemaTokenizer::new(input);
    if tok.next_token() != Some(Token::LParen) {
        return Err(element_error(kind, "expected '('"));
    }
    let oid = match tok.next_token() {
        Some(Token::Bare(s)) | Some(Token::Quoted(s)) if !s.is_empty() => s,
        _ => return Err(element_error(kind, "expected numeric OID")),
    };
    let mut common = Common {
        oid,
        ..Default::default()
    };

    loop {
        let keyword = match tok.next_token() {
            None | Some(Token::RParen) => break,
            Some(Token::Bare(k)) => k,
            Some(other) => {
                debug!("{}: skipping stray token {:?}", kind, other);
                continue;
            }
        };
        let upper = keyword.to_ascii_uppercase();
        match upper.as_str() {
            "NAME" => common.names = tok.read_oids(),
            "DESC" => common.description = tok.read_oid().unwrap_or_default(),
            "OBSOLETE" => common.obsolete = true,
            k if k.starts_with("X-") => {
                let values = tok.read_oids();
                common.extensions.insert(upper, values);
            }
            k => {
                if !specific(k, &mut tok)? {
                    debug!("{} {}: skipping unknown keyword '{}'", kind, common.oid, keyword);
                    tok.skip_value();
                }
            }
        }
    }
    Ok(common)
}

fn required_oid(
    kind: ElementKind,
    keyword: &str,
    tok: &mut SchemaTokenizer<'_>,
) -> Result<String, SchemaError> {
    tok.read_oid()
        .ok_or_else(|| element_error(kind, format!("missing value for {}", keyword)))
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

impl ObjectClassDescription {
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let mut superiors = Vec::new();
        let mut kind = ObjectClassKind::Structural;
        let mut must = Vec::new();
        let mut may = Vec::new();
        let common = parse_description(Self::KIND, s, |k, tok| {
            match k {
                "SUP" => superiors = tok.read_oids(),
                "ABSTRACT" => kind = ObjectClassKind::Abstract,
                "STRUCTURAL" => kind = ObjectClassKind::Structural,
                "AUXILIARY" => kind = ObjectClassKind::Auxiliary,
                "MUST" => must = tok.read_oids(),
                "MAY" => may = tok.read_oids(),
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        Ok(ObjectClassDescription {
            oid: common.oid,
            names: common.names,
            description: common.description,
            obsolete: common.obsolete,
            superiors,
            kind,
            must,
            may,
            extensions: common.extensions,
            synthesized: false,
        })
    }
}

impl AttributeTypeDescription {
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let kind = Self::KIND;
        let mut at = AttributeTypeDescription::default();
        let common = parse_description(kind, s, |k, tok| {
            match k {
                "SUP" => at.superior = Some(required_oid(kind, k, tok)?),
                "EQUALITY" => at.equality = Some(required_oid(kind, k, tok)?),
                "ORDERING" => at.ordering = Some(required_oid(kind, k, tok)?),
                "SUBSTR" | "SUBSTRING" => at.substring = Some(required_oid(kind, k, tok)?),
                "SYNTAX" => {
                    let (oid, len) = tok
                        .read_noidlen()
                        .ok_or_else(|| element_error(kind, "missing value for SYNTAX"))?;
                    at.syntax = Some(oid);
                    at.syntax_length = len;
                }
                "SINGLE-VALUE" => at.single_valued = true,
                "COLLECTIVE" => at.collective = true,
                "NO-USER-MODIFICATION" => at.user_modifiable = false,
                "USAGE" => {
                    let value = required_oid(kind, k, tok)?;
                    at.usage = Usage::parse(&value)
                        .ok_or_else(|| element_error(kind, format!("unknown usage '{}'", value)))?;
                }
                _ => return Ok(false),
            }
            Ok(true)
        })?;
        at.oid = common.oid;
        at.names = common.names;
        at.description = common.description;
        at.obsolete = common.obsolete;
        at.extensions = common.extensions;
        Ok(at)
    }
}

impl LdapSyntaxDescription {
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let common = parse_description(Self::KIND, s, |_, _| Ok(false))?;
        Ok(LdapSyntaxDescription {
            oid: common.oid,
            description: common.description,
            extensions: common.extensions,
            synthesized: false,
        })
    }
}

impl MatchingRuleDescription {
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let kind = Self::KIND;
        let mut syntax = None;
        let common = parse_description(kind, s, |k, tok| {
            if k != "SYNTAX" {
                return Ok(false);
            }
            let (oid, _) = tok
                .read_noidlen()
                .ok_or_else(|| element_error(kind, "missing value for SYNTAX"))?;
            syntax = Some(oid);
            Ok(true)
        })?;
        Ok(MatchingRuleDescription {
            oid: common.oid,
            names: common.names,
            description: common.description,
            obsolete: common.obsolete,
            syntax,
            extensions: common.extensions,
            synthesized: false,
        })
    }
}

impl MatchingRuleUseDescription {
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let mut applies = Vec::new();
        let common = parse_description(Self::KIND, s, |k, tok| {
            if k != "APPLIES" {
                return Ok(false);
            }
            applies = tok.read_oids();
            Ok(true)
        })?;
        Ok(MatchingRuleUseDescription {
            oid: common.oid,
            names: common.names,
            description: common.description,
            obsolete: common.obsolete,
            applies,
            extensions: common.extensions,
            synthesized: false,
        })
    }
}

macro_rules! impl_from_str {
    ($($ty:ty),*) => {$(
        impl FromStr for $ty {
            type Err = SchemaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::parse(s)
            }
        }
    )*};
}

impl_from_str!(
    ObjectClassDescription,
    AttributeTypeDescription,
    LdapSyntaxDescription,
    MatchingRuleDescription,
    MatchingRuleUseDescription
);

// ---------------------------------------------------------------------------
// RFC 4512 output
// ---------------------------------------------------------------------------

struct Writer<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
}

impl<'a, 'b> Writer<'a, 'b> {
    fn start(f: &'a mut fmt::Formatter<'b>, oid: &str) -> Result<Self, fmt::Error> {
        write!(f, "( {}", oid)?;
        Ok(Writer { f })
    }

    fn names(&mut self, names: &[String]) -> fmt::Result {
        match names {
            [] => Ok(()),
            [one] => write!(self.f, " NAME '{}'", escape_qdstring(one)),
            many => {
                write!(self.f, " NAME (")?;
                for n in many {
                    write!(self.f, " '{}'", escape_qdstring(n))?;
                }
                write!(self.f, " )")
            }
        }
    }

    fn desc(&mut self, desc: &str) -> fmt::Result {
        if desc.is_empty() {
            return Ok(());
        }
        write!(self.f, " DESC '{}'", escape_qdstring(desc))
    }

    fn flag(&mut self, keyword: &str, on: bool) -> fmt::Result {
        if on {
            write!(self.f, " {}", keyword)?;
        }
        Ok(())
    }

    fn oid(&mut self, keyword: &str, value: Option<&str>) -> fmt::Result {
        match value {
            Some(v) => write!(self.f, " {} {}", keyword, v),
            None => Ok(()),
        }
    }

    fn oids(&mut self, keyword: &str, values: &[String]) -> fmt::Result {
        match values {
            [] => Ok(()),
            [one] => write!(self.f, " {} {}", keyword, one),
            many => write!(self.f, " {} ( {} )", keyword, many.join(" $ ")),
        }
    }

    fn finish(self, extensions: &Extensions) -> fmt::Result {
        for (key, values) in extensions {
            if key == X_RAW_SCHEMA_DEFINITION {
                continue;
            }
            write!(self.f, " {}", key)?;
            match values.as_slice() {
                [one] => write!(self.f, " '{}'", escape_qdstring(one))?,
                many => {
                    write!(self.f, " (")?;
                    for v in many {
                        write!(self.f, " '{}'", escape_qdstring(v))?;
                    }
                    write!(self.f, " )")?;
                }
            }
        }
        write!(self.f, " )")
    }
}

impl fmt::Display for ObjectClassDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Writer::start(f, &self.oid)?;
        w.names(&self.names)?;
        w.desc(&self.description)?;
        w.flag("OBSOLETE", self.obsolete)?;
        w.oids("SUP", &self.superiors)?;
        w.flag(self.kind.as_str(), true)?;
        w.oids("MUST", &self.must)?;
        w.oids("MAY", &self.may)?;
        w.finish(&self.extensions)
    }
}

impl fmt::Display for AttributeTypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Writer::start(f, &self.oid)?;
        w.names(&self.names)?;
        w.desc(&self.description)?;
        w.flag("OBSOLETE", self.obsolete)?;
        w.oid("SUP", self.superior.as_deref())?;
        w.oid("EQUALITY", self.equality.as_deref())?;
        w.oid("ORDERING", self.ordering.as_deref())?;
        w.oid("SUBSTR", self.substring.as_deref())?;
        let syntax = self.syntax.as_ref().map(|s| match self.syntax_length {
            Some(len) => format!("{}{{{}}}", s, len),
            None => s.clone(),
        });
        w.oid("SYNTAX", syntax.as_deref())?;
        w.flag("SINGLE-VALUE", self.single_valued)?;
        w.flag("COLLECTIVE", self.collective)?;
        w.flag("NO-USER-MODIFICATION", !self.user_modifiable)?;
        if self.usage != Usage::UserApplications {
            w.oid("USAGE", Some(self.usage.as_str()))?;
        }
        w.finish(&self.extensions)
    }
}

impl fmt::Display for LdapSyntaxDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Writer::start(f, &self.oid)?;
        w.desc(&self.description)?;
        w.finish(&self.extensions)
    }
}

impl fmt::Display for MatchingRuleDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Writer::start(f, &self.oid)?;
        w.names(&self.names)?;
        w.desc(&self.description)?;
        w.flag("OBSOLETE", self.obsolete)?;
        w.oid("SYNTAX", self.syntax.as_deref())?;
        w.finish(&self.extensions)
    }
}

impl fmt::Display for MatchingRuleUseDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut w = Writer::start(f, &self.oid)?;
        w.names(&self.names)?;
        w.desc(&self.description)?;
        w.flag("OBSOLETE", self.obsolete)?;
        w.oids("APPLIES", &self.applies)?;
        w.finish(&self.extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Group 1: object classes ────────────────────────────────────

    #[test]
    fn parse_person() {
        let oc = ObjectClassDescription::parse(
            "( 2.5.6.6 NAME 'person' DESC 'RFC2256: a person' SUP top STRUCTURAL \
             MUST ( sn $ cn ) MAY ( userPassword $ telephoneNumber $ seeAlso $ description ) )",
        )
        .unwrap();
        assert_eq!(oc.oid, "2.5.6.6");
        assert_eq!(oc.names, vec!["person"]);
        assert_eq!(oc.description, "RFC2256: a person");
        assert_eq!(oc.superiors, vec!["top"]);
        assert_eq!(oc.kind, ObjectClassKind::Structural);
        assert_eq!(oc.must, vec!["sn", "cn"]);
        assert_eq!(oc.may.len(), 4);
        assert!(!oc.is_synthesized());
    }

    #[test]
    fn parse_object_class_kinds() {
        let top = ObjectClassDescription::parse("( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )")
            .unwrap();
        assert_eq!(top.kind, ObjectClassKind::Abstract);
        assert_eq!(top.must, vec!["objectClass"]);
        let aux = ObjectClassDescription::parse("( 1.2.3 NAME 'x' AUXILIARY )").unwrap();
        assert_eq!(aux.kind, ObjectClassKind::Auxiliary);
        let dflt = ObjectClassDescription::parse("( 1.2.4 NAME 'y' )").unwrap();
        assert_eq!(dflt.kind, ObjectClassKind::Structural);
    }

    #[test]
    fn parse_multiple_names_and_superiors() {
        let oc = ObjectClassDescription::parse(
            "( 1.2.3 NAME ( 'a' 'b' ) SUP ( top $ person ) OBSOLETE )",
        )
        .unwrap();
        assert_eq!(oc.names, vec!["a", "b"]);
        assert_eq!(oc.superiors, vec!["top", "person"]);
        assert!(oc.obsolete);
        assert_eq!(oc.name(), "a");
        assert_eq!(oc.identifiers(), vec!["1.2.3", "a", "b"]);
        assert!(oc.has_identifier("B"));
    }

    // ── Group 2: quirks ────────────────────────────────────────────

    #[test]
    fn quirks_lower_case_keywords_and_bare_names() {
        let oc =
            ObjectClassDescription::parse("( 1.2.3 name person sup top must ( cn sn ) )").unwrap();
        assert_eq!(oc.names, vec!["person"]);
        assert_eq!(oc.superiors, vec!["top"]);
        assert_eq!(oc.must, vec!["cn", "sn"]);
    }

    #[test]
    fn quirks_missing_close_paren() {
        let oc = ObjectClassDescription::parse("( 1.2.3 NAME 'x' MAY cn").unwrap();
        assert_eq!(oc.may, vec!["cn"]);
    }

    #[test]
    fn quirks_unknown_keyword_is_skipped() {
        let at = AttributeTypeDescription::parse(
            "( 1.2.3 NAME 'x' FOO 'bar' BAZ ( a b ) QUX SINGLE-VALUE )",
        )
        .unwrap();
        assert!(at.single_valued);
        assert_eq!(at.names, vec!["x"]);
    }

    #[test]
    fn quirks_quoted_syntax_with_length() {
        let at = AttributeTypeDescription::parse(
            "( 2.5.4.3 NAME 'cn' SYNTAX '1.3.6.1.4.1.1466.115.121.1.15'{64} )",
        )
        .unwrap();
        assert_eq!(at.syntax.as_deref(), Some("1.3.6.1.4.1.1466.115.121.1.15"));
        assert_eq!(at.syntax_length, Some(64));
    }

    #[test]
    fn escaped_quotes_in_description() {
        let oc = ObjectClassDescription::parse(r"( 1.2.3 NAME 'x' DESC 'it\27s a \5C' )").unwrap();
        assert_eq!(oc.description, "it's a \\");
        assert!(oc.to_string().contains(r"DESC 'it\27s a \5C'"));
    }

    #[test]
    fn extensions_are_collected() {
        let oc = ObjectClassDescription::parse(
            "( 1.2.3 NAME 'x' X-ORIGIN 'RFC 4519' x-schema-file ( 'core.schema' 'other' ) )",
        )
        .unwrap();
        assert_eq!(oc.extensions["X-ORIGIN"], vec!["RFC 4519"]);
        assert_eq!(oc.extensions["X-SCHEMA-FILE"], vec!["core.schema", "other"]);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            ObjectClassDescription::parse("1.2.3 NAME 'x'"),
            Err(SchemaError::Element { kind: ElementKind::ObjectClass, .. })
        ));
        assert!(ObjectClassDescription::parse("( )").is_err());
        assert!(AttributeTypeDescription::parse("( 1.2 USAGE bogus )").is_err());
        assert!(AttributeTypeDescription::parse("( 1.2 SUP )").is_err());
    }

    // ── Group 3: attribute types ───────────────────────────────────

    #[test]
    fn parse_operational_attribute_type() {
        let at = AttributeTypeDescription::parse(
            "( 2.5.18.1 NAME 'createTimestamp' EQUALITY generalizedTimeMatch \
             ORDERING generalizedTimeOrderingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 \
             SINGLE-VALUE NO-USER-MODIFICATION USAGE directoryOperation )",
        )
        .unwrap();
        assert_eq!(at.equality.as_deref(), Some("generalizedTimeMatch"));
        assert_eq!(at.ordering.as_deref(), Some("generalizedTimeOrderingMatch"));
        assert_eq!(at.syntax_length, None);
        assert!(at.single_valued);
        assert!(!at.user_modifiable);
        assert_eq!(at.usage, Usage::DirectoryOperation);
        assert!(at.usage.is_operational());
    }

    #[test]
    fn parse_subtype() {
        let at = AttributeTypeDescription::parse(
            "( 2.5.4.41 NAME 'name' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch )",
        )
        .unwrap();
        assert_eq!(at.substring.as_deref(), Some("caseIgnoreSubstringsMatch"));
        let cn = AttributeTypeDescription::parse("( 2.5.4.3 NAME ( 'cn' 'commonName' ) SUP name )")
            .unwrap();
        assert_eq!(cn.superior.as_deref(), Some("name"));
        assert!(cn.user_modifiable);
        assert_eq!(cn.usage, Usage::UserApplications);
    }

    // ── Group 4: other kinds ───────────────────────────────────────

    #[test]
    fn parse_syntax() {
        let lsd = LdapSyntaxDescription::parse(
            "( 1.3.6.1.4.1.1466.115.121.1.15 DESC 'Directory String' X-NOT-HUMAN-READABLE 'FALSE' )",
        )
        .unwrap();
        assert_eq!(lsd.description, "Directory String");
        assert!(lsd.names().is_empty());
        assert_eq!(lsd.name(), "1.3.6.1.4.1.1466.115.121.1.15");
    }

    #[test]
    fn parse_matching_rule_and_use() {
        let mr = MatchingRuleDescription::parse(
            "( 2.5.13.2 NAME 'caseIgnoreMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )",
        )
        .unwrap();
        assert_eq!(mr.syntax.as_deref(), Some("1.3.6.1.4.1.1466.115.121.1.15"));
        let mru = MatchingRuleUseDescription::parse(
            "( 2.5.13.2 NAME 'caseIgnoreMatch' APPLIES ( cn $ sn $ o ) )",
        )
        .unwrap();
        assert_eq!(mru.applies, vec!["cn", "sn", "o"]);
    }

    // ── Group 5: display and dummies ───────────────────────────────

    #[test]
    fn display_reparses() {
        let inputs = [
            "( 2.5.6.6 NAME 'person' DESC 'a person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY seeAlso X-ORIGIN 'RFC 4519' )",
            "( 1.2.3 NAME ( 'a' 'b' ) OBSOLETE AUXILIARY )",
        ];
        for input in inputs {
            let oc = ObjectClassDescription::parse(input).unwrap();
            assert_eq!(oc.to_string(), input);
            assert_eq!(ObjectClassDescription::parse(&oc.to_string()).unwrap(), oc);
        }
        let at = "( 2.5.4.3 NAME 'cn' SUP name SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{64} SINGLE-VALUE NO-USER-MODIFICATION USAGE dSAOperation )";
        assert_eq!(AttributeTypeDescription::parse(at).unwrap().to_string(), at);
        let mr = "( 2.5.13.2 NAME 'caseIgnoreMatch' SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 )";
        assert_eq!(MatchingRuleDescription::parse(mr).unwrap().to_string(), mr);
    }

    #[test]
    fn display_skips_raw_value() {
        let mut lsd = LdapSyntaxDescription::parse("( 1.2 DESC 'x' )").unwrap();
        lsd.extensions
            .insert(X_RAW_SCHEMA_DEFINITION.to_string(), vec!["( 1.2 DESC 'x' )".to_string()]);
        assert_eq!(lsd.to_string(), "( 1.2 DESC 'x' )");
        assert_eq!(lsd.raw_value(), Some("( 1.2 DESC 'x' )"));
    }

    #[test]
    fn dummies_are_marked() {
        let at = AttributeTypeDescription::dummy("doesNotExist");
        assert_eq!(at.oid, "doesNotExist");
        assert_eq!(at.names, vec!["doesNotExist"]);
        assert_eq!(at.usage, Usage::UserApplications);
        assert!(at.user_modifiable);
        assert!(at.is_synthesized());
        assert!(at.extensions.contains_key(X_DUMMY));
        let lsd = LdapSyntaxDescription::dummy("1.2.3");
        assert!(lsd.is_synthesized());
        assert_eq!(lsd.oid(), "1.2.3");
    }

    #[test]
    fn from_str_dispatches_to_parse() {
        let mru: MatchingRuleUseDescription = "( 2.5.13.0 APPLIES cn )".parse().unwrap();
        assert_eq!(mru.applies, vec!["cn"]);
    }
}
