//! Character scanner shared by the directive parsers.
//!
//! The lexer never mutates itself: every operation takes a [`Cursor`] and
//! hands back the cursor after whatever it consumed, so a failed match costs
//! nothing and the caller keeps the old position.

use crate::error::{ParseError, ParseErrorKind};

/// A byte offset into the lexer's input.  Always on a char boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Cursor {
    pub offset: usize,
}

impl Cursor {
    pub fn new(offset: usize) -> Self {
        Cursor { offset }
    }
}

pub struct DirectiveLexer<'a> {
    input: &'a str,
}

/// Characters that can continue a keyword or attribute name.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl<'a> DirectiveLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        DirectiveLexer { input }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn at_end(&self, cur: Cursor) -> bool {
        cur.offset >= self.input.len()
    }

    pub fn peek(&self, cur: Cursor) -> Option<char> {
        self.input.get(cur.offset..)?.chars().next()
    }

    /// The unconsumed rest of the input.
    pub fn rest(&self, cur: Cursor) -> &'a str {
        self.input.get(cur.offset..).unwrap_or("")
    }

    /// Step over one character.
    pub fn advance(&self, cur: Cursor) -> Cursor {
        match self.peek(cur) {
            Some(c) => Cursor::new(cur.offset + c.len_utf8()),
            None => cur,
        }
    }

    pub fn skip_whitespace(&self, cur: Cursor) -> Cursor {
        let rest = self.rest(cur);
        let trimmed = rest.trim_start();
        Cursor::new(cur.offset + (rest.len() - trimmed.len()))
    }

    /// Match `keyword` case-insensitively at the cursor.  Returns the cursor
    /// just past the keyword; trailing content is left alone.
    pub fn match_keyword(&self, cur: Cursor, keyword: &str) -> Option<Cursor> {
        let rest = self.rest(cur).as_bytes();
        let kw = keyword.as_bytes();
        if rest.len() >= kw.len() && rest[..kw.len()].eq_ignore_ascii_case(kw) {
            Some(Cursor::new(cur.offset + kw.len()))
        } else {
            None
        }
    }

    /// Like [`match_keyword`](Self::match_keyword), but the keyword must not
    /// run on into a longer word (`tls_cacert` does not match `tls_cacertdir`).
    pub fn match_word(&self, cur: Cursor, keyword: &str) -> Option<Cursor> {
        let end = self.match_keyword(cur, keyword)?;
        match self.peek(end) {
            Some(c) if is_word_char(c) => None,
            _ => Some(end),
        }
    }

    /// Skip whitespace, then consume `c`.
    pub fn expect_char(&self, cur: Cursor, c: char) -> Result<Cursor, ParseError> {
        let cur = self.skip_whitespace(cur);
        match self.peek(cur) {
            Some(found) if found == c => Ok(self.advance(cur)),
            Some(found) => Err(ParseError::new(
                if c == '=' {
                    ParseErrorKind::MissingEquals
                } else {
                    ParseErrorKind::UnexpectedToken
                },
                cur.offset,
                format!("expected '{}' but found '{}'", c, found),
            )),
            None => Err(ParseError::new(
                if c == '=' {
                    ParseErrorKind::MissingEquals
                } else {
                    ParseErrorKind::UnexpectedEnd
                },
                cur.offset,
                format!("expected '{}' but reached end of input", c),
            )),
        }
    }

    pub fn expect_equals(&self, cur: Cursor) -> Result<Cursor, ParseError> {
        self.expect_char(cur, '=')
    }

    /// Read a quoted or bare value.  Fails on an empty capture.
    pub fn read_value(&self, cur: Cursor) -> Result<(String, Cursor), ParseError> {
        let start = self.skip_whitespace(cur);
        let (value, end) = match self.peek(start) {
            Some('"') | Some('\'') => self.read_quoted(start)?,
            _ => self.read_bare(start),
        };
        if value.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::EmptyValue,
                start.offset,
                "missing value",
            ));
        }
        Ok((value, end))
    }

    /// Read a run of non-whitespace characters.  May be empty.
    pub fn read_bare(&self, cur: Cursor) -> (String, Cursor) {
        let rest = self.rest(cur);
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        (rest[..len].to_string(), Cursor::new(cur.offset + len))
    }

    /// Read a quoted string starting at the opening quote.
    ///
    /// A backslash before the active quote character yields the quote;
    /// any other backslash is kept as-is.  The result may be empty.
    pub fn read_quoted(&self, cur: Cursor) -> Result<(String, Cursor), ParseError> {
        let quote = match self.peek(cur) {
            Some(q @ ('"' | '\'')) => q,
            Some(c) => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    cur.offset,
                    format!("expected a quoted value but found '{}'", c),
                ))
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedEnd,
                    cur.offset,
                    "expected a quoted value but reached end of input",
                ))
            }
        };

        let mut value = String::new();
        let mut chars = self.rest(cur).char_indices().skip(1).peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                if let Some(&(_, next)) = chars.peek() {
                    if next == quote {
                        value.push(quote);
                        chars.next();
                        continue;
                    }
                }
                value.push('\\');
            } else if c == quote {
                return Ok((value, Cursor::new(cur.offset + i + 1)));
            } else {
                value.push(c);
            }
        }

        Err(ParseError::new(
            ParseErrorKind::UnterminatedQuote,
            cur.offset,
            format!("unterminated {} quoted value", quote),
        ))
    }
}

/// Quote `value` with double quotes, escaping embedded `"` as `\"`.
///
/// A value ending in `\` does not read back: its last backslash escapes
/// the closing quote.
pub fn quote(value: &str) -> String {
    let mut s = String::with_capacity(value.len() + 2);
    s.push('"');
    for c in value.chars() {
        if c == '"' {
            s.push('\\');
        }
        s.push(c);
    }
    s.push('"');
    s
}

/// Quote `value` only when a bare token would not read back the same.
pub fn quote_if_needed(value: &str) -> String {
    let needs = value.is_empty()
        || value.starts_with('"')
        || value.starts_with('\'')
        || value.chars().any(char::is_whitespace);
    if needs {
        quote(value)
    } else {
        value.to_string()
    }
}
