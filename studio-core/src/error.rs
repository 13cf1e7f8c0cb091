use std::fmt;
use std::io;

use crate::syncrepl::SyncRepl;

/// What went wrong while scanning a directive or value string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingEquals,
    EmptyValue,
    UnterminatedQuote,
    InvalidEnum,
    InvalidInteger,
    InvalidFormat,
    UnexpectedToken,
    UnexpectedEnd,
    Duplicate,
}

/// A located parse failure.  `position` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at byte {position}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: usize, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            position,
            message: message.into(),
        }
    }

    /// Shift the position by `base`, for errors raised on a substring.
    pub fn offset(mut self, base: usize) -> Self {
        self.position += base;
        self
    }
}

/// Every failure collected while scanning one syncrepl directive, together
/// with whatever options did parse.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct SyncReplErrors {
    pub partial: SyncRepl,
    pub errors: Vec<ParseError>,
}

impl fmt::Display for SyncReplErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s) in syncrepl directive", self.errors.len())?;
        for e in &self.errors {
            write!(f, "; {}", e)?;
        }
        Ok(())
    }
}

/// Which part of an access directive failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclClause {
    /// The leading `access to` keywords.
    Header,
    What,
    /// Zero-based index of the `by` clause.
    Who(usize),
}

impl fmt::Display for AclClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclClause::Header => write!(f, "access header"),
            AclClause::What => write!(f, "'what' clause"),
            AclClause::Who(i) => write!(f, "'who' clause #{}", i + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("in {clause}: {error}")]
pub struct AclParseError {
    pub clause: AclClause,
    #[source]
    pub error: ParseError,
}

/// Schema element kinds, used to label schema errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    ObjectClass,
    AttributeType,
    LdapSyntax,
    MatchingRule,
    MatchingRuleUse,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElementKind::ObjectClass => "object class",
            ElementKind::AttributeType => "attribute type",
            ElementKind::LdapSyntax => "LDAP syntax",
            ElementKind::MatchingRule => "matching rule",
            ElementKind::MatchingRuleUse => "matching rule use",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid {kind} description: {message}")]
    Element { kind: ElementKind, message: String },

    #[error("cyclic superior chain for {kind} '{identifier}'")]
    Cyclic {
        kind: ElementKind,
        identifier: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("LDIF parse error at byte {position}: {message}")]
    Ldif { position: u64, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_position() {
        let e = ParseError::new(ParseErrorKind::MissingEquals, 4, "expected '='");
        assert_eq!(e.to_string(), "parse error at byte 4: expected '='");
    }

    #[test]
    fn parse_error_offset_shifts_position() {
        let e = ParseError::new(ParseErrorKind::InvalidFormat, 2, "x").offset(10);
        assert_eq!(e.position, 12);
    }

    #[test]
    fn acl_error_names_clause() {
        let e = AclParseError {
            clause: AclClause::Who(1),
            error: ParseError::new(ParseErrorKind::UnexpectedToken, 7, "unexpected 'foo'"),
        };
        assert_eq!(
            e.to_string(),
            "in 'who' clause #2: parse error at byte 7: unexpected 'foo'"
        );
    }

    #[test]
    fn schema_error_display() {
        let e = SchemaError::Cyclic {
            kind: ElementKind::AttributeType,
            identifier: "loop".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cyclic superior chain for attribute type 'loop'"
        );
    }

    #[test]
    fn studio_error_from_parse_error() {
        let e: StudioError = ParseError::new(ParseErrorKind::EmptyValue, 0, "empty").into();
        assert!(matches!(e, StudioError::Parse(_)));
    }
}
