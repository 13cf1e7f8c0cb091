//! LDIF content-record reader.
//!
//! Reads RFC 2849 attrval-records from any `Read` source: version line,
//! comments, line folding, CRLF line ends, base64 (`::`) values and
//! `file://` URL (`:<`) values.  Change records are rejected.

use std::fs;
use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;

use crate::data::Entry;
use crate::error::{Result, StudioError};

// ---------------------------------------------------------------------------
// CharReader -- single-byte reader with pushback and position
// ---------------------------------------------------------------------------

struct CharReader<R> {
    inner: R,
    pushback: Option<u8>,
    pos: u64,
}

impl<R: Read> CharReader<R> {
    fn new(inner: R) -> Self {
        CharReader {
            inner,
            pushback: None,
            pos: 0,
        }
    }

    /// Read one byte.  Returns `None` at EOF.
    fn getc(&mut self) -> Result<Option<u8>> {
        if let Some(c) = self.pushback.take() {
            self.pos += 1;
            return Ok(Some(c));
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf)? {
            0 => Ok(None),
            _ => {
                self.pos += 1;
                Ok(Some(buf[0]))
            }
        }
    }

    /// Push one byte back (at most one outstanding).
    fn ungetc(&mut self, c: u8) {
        debug_assert!(self.pushback.is_none(), "double pushback");
        self.pushback = Some(c);
        self.pos -= 1;
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    /// True when the stream is exhausted and nothing is pushed back.
    fn at_eof(&mut self) -> Result<bool> {
        match self.getc()? {
            Some(c) => {
                self.ungetc(c);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// After a line end: true when the next line is a continuation (the
    /// leading space is consumed), false otherwise (nothing consumed).
    fn continues(&mut self) -> Result<bool> {
        match self.getc()? {
            Some(b' ') => Ok(true),
            Some(c) => {
                self.ungetc(c);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Line-level reading
// ---------------------------------------------------------------------------

/// How the value after the colon is encoded.
enum Encoding {
    Plain,
    Base64,
    Url,
    /// The line ended right after the colon.
    Empty,
}

enum Line {
    AttrValue(String, Vec<u8>),
    /// Blank line or EOF.
    Empty,
}

pub struct LdifReader<R> {
    cr: CharReader<R>,
    saw_version: bool,
}

impl<R: Read> LdifReader<R> {
    pub fn new(reader: R) -> Self {
        LdifReader {
            cr: CharReader::new(reader),
            saw_version: false,
        }
    }

    /// Byte offset of the next unread character.
    pub fn position(&self) -> u64 {
        self.cr.tell()
    }

    fn parse_err(&self, msg: &str) -> StudioError {
        StudioError::Ldif {
            position: self.cr.tell(),
            message: msg.to_string(),
        }
    }

    /// Consume the `\n` of a CRLF pair.
    fn expect_lf(&mut self) -> Result<()> {
        match self.cr.getc()? {
            Some(b'\n') => Ok(()),
            _ => Err(self.parse_err("Unexpected EOL.")),
        }
    }

    /// Read an attribute description up to (and including) the colon.
    fn read_ad(&mut self, lhs: &mut String) -> Result<()> {
        loop {
            match self.cr.getc()? {
                Some(b':') => return Ok(()),
                None => return Err(self.parse_err("Unexpected EOF.")),
                Some(c @ (b'\r' | b'\n')) => {
                    if c == b'\r' {
                        self.expect_lf()?;
                    }
                    if !lhs.is_empty() && self.cr.continues()? {
                        continue;
                    }
                    return Err(self.parse_err("Unexpected EOL."));
                }
                Some(0) => return Err(self.parse_err("Null byte not allowed.")),
                Some(c) => lhs.push(c as char),
            }
        }
    }

    /// After the colon, determine the encoding marker.
    fn read_encoding(&mut self) -> Result<Encoding> {
        loop {
            match self.cr.getc()? {
                Some(b' ') => continue,
                Some(b':') => return Ok(Encoding::Base64),
                Some(b'<') => return Ok(Encoding::Url),
                None => return Ok(Encoding::Empty),
                Some(c @ (b'\r' | b'\n')) => {
                    if c == b'\r' {
                        self.expect_lf()?;
                    }
                    if self.cr.continues()? {
                        continue;
                    }
                    return Ok(Encoding::Empty);
                }
                Some(0) => return Err(self.parse_err("Null byte not allowed.")),
                Some(c) => {
                    self.cr.ungetc(c);
                    return Ok(Encoding::Plain);
                }
            }
        }
    }

    /// Read the rest of a (possibly folded) line.  EOF ends the line.
    fn read_safe(&mut self, data: &mut Vec<u8>) -> Result<()> {
        loop {
            match self.cr.getc()? {
                Some(c @ (b'\r' | b'\n')) => {
                    if c == b'\r' {
                        self.expect_lf()?;
                    }
                    if self.cr.continues()? {
                        continue;
                    }
                    return Ok(());
                }
                None => return Ok(()),
                Some(c) => data.push(c),
            }
        }
    }

    /// Skip a comment line (everything until EOL, with folding).
    fn skip_comment(&mut self) -> Result<()> {
        let mut sink = Vec::new();
        self.read_safe(&mut sink)
    }

    /// Read one logical line, skipping comments.
    fn read_line(&mut self) -> Result<Line> {
        loop {
            match self.cr.getc()? {
                None | Some(b'\n') => return Ok(Line::Empty),
                Some(b'\r') => {
                    self.expect_lf()?;
                    return Ok(Line::Empty);
                }
                Some(b'#') => self.skip_comment()?,
                Some(c) => {
                    self.cr.ungetc(c);
                    break;
                }
            }
        }

        let mut name = String::new();
        self.read_ad(&mut name)?;

        let mut value = Vec::new();
        match self.read_encoding()? {
            Encoding::Plain => self.read_safe(&mut value)?,
            Encoding::Empty => {}
            Encoding::Base64 => {
                let mut encoded = Vec::new();
                self.read_safe(&mut encoded)?;
                let text = String::from_utf8_lossy(&encoded);
                value = STANDARD
                    .decode(text.trim())
                    .map_err(|_| self.parse_err("Invalid Base64 string."))?;
            }
            Encoding::Url => {
                let mut raw = Vec::new();
                self.read_safe(&mut raw)?;
                let url = String::from_utf8_lossy(&raw).trim().to_string();
                let path = url
                    .strip_prefix("file://")
                    .ok_or_else(|| self.parse_err("Unknown URL scheme."))?;
                value = fs::read(path)
                    .map_err(|e| self.parse_err(&format!("open {}: {}", path, e)))?;
            }
        }

        Ok(Line::AttrValue(name, value))
    }

    /// Read the next content record.  `Ok(None)` at EOF.
    pub fn read_entry(&mut self) -> Result<Option<Entry>> {
        // Skip blank lines and the version line.
        let dn = loop {
            match self.read_line()? {
                Line::Empty => {
                    if self.cr.at_eof()? {
                        return Ok(None);
                    }
                }
                Line::AttrValue(name, value) if name.eq_ignore_ascii_case("version") => {
                    if self.saw_version || value != b"1" {
                        return Err(self.parse_err("Invalid file format."));
                    }
                    self.saw_version = true;
                }
                Line::AttrValue(name, value) if name.eq_ignore_ascii_case("dn") => {
                    break String::from_utf8(value)
                        .map_err(|_| self.parse_err("Distinguished name is not UTF-8."))?;
                }
                Line::AttrValue(name, _) => {
                    return Err(self.parse_err(&format!("Expected 'dn:' but found '{}:'.", name)));
                }
            }
        };
        self.saw_version = true;

        let mut entry = Entry::new(dn);
        loop {
            match self.read_line()? {
                Line::Empty => break,
                Line::AttrValue(name, _) if name.eq_ignore_ascii_case("changetype") => {
                    return Err(self.parse_err("Change records are not supported."));
                }
                Line::AttrValue(name, _) if name.eq_ignore_ascii_case("control") => {
                    return Err(self.parse_err("Sorry, 'control:' not supported."));
                }
                Line::AttrValue(name, value) => entry.add_value(&name, &value),
            }
        }
        debug!(
            "read LDIF record '{}' with {} attribute(s)",
            entry.dn,
            entry.attributes.len()
        );
        Ok(Some(entry))
    }

    /// Read every remaining record.
    pub fn read_all(&mut self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        while let Some(entry) = self.read_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }
}

/// Parse every record in an LDIF string.
pub fn parse_ldif_str(text: &str) -> Result<Vec<Entry>> {
    LdifReader::new(text.as_bytes()).read_all()
}

/// Parse every record in an LDIF file.
pub fn read_ldif_file(path: impl AsRef<Path>) -> Result<Vec<Entry>> {
    let file = fs::File::open(path.as_ref())?;
    LdifReader::new(std::io::BufReader::new(file)).read_all()
}
