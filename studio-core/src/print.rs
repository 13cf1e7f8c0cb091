//! LDIF output.
//!
//! Values that are not LDIF SAFE-STRINGs are base64-encoded.  Lines longer
//! than [`FOLD_WIDTH`] are folded onto continuation lines.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::data::Entry;

/// Maximum length of a physical output line, excluding the newline.
pub const FOLD_WIDTH: usize = 76;

/// Check if the value can be printed as an LDIF SAFE-STRING:
/// no leading space/colon/less-than, no trailing space,
/// no null/CR/LF/non-ASCII bytes.
fn safe_string_p(data: &[u8]) -> bool {
    let (first, last) = match (data.first(), data.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return true,
    };
    if first == b' ' || first == b':' || first == b'<' || last == b' ' {
        return false;
    }
    !data
        .iter()
        .any(|&c| c == 0 || c == b'\r' || c == b'\n' || c >= 0x80)
}

/// Write `line` folded at [`FOLD_WIDTH`], then a newline.
fn write_folded(w: &mut dyn Write, line: &[u8]) -> io::Result<()> {
    let (head, mut rest) = line.split_at(line.len().min(FOLD_WIDTH));
    w.write_all(head)?;
    while !rest.is_empty() {
        let (chunk, tail) = rest.split_at(rest.len().min(FOLD_WIDTH - 1));
        w.write_all(b"\n ")?;
        w.write_all(chunk)?;
        rest = tail;
    }
    w.write_all(b"\n")
}

/// Write an LDIF attribute line: `ad: value` or `ad:: base64`.
pub fn print_ldif_line(w: &mut dyn Write, ad: &str, data: &[u8]) -> io::Result<()> {
    let mut line = Vec::with_capacity(ad.len() + data.len() + 3);
    line.extend_from_slice(ad.as_bytes());
    if safe_string_p(data) {
        line.extend_from_slice(b": ");
        line.extend_from_slice(data);
    } else {
        line.extend_from_slice(b":: ");
        line.extend_from_slice(STANDARD.encode(data).as_bytes());
    }
    write_folded(w, &line)
}

/// Write one content record followed by a blank line.
pub fn write_ldif_entry(w: &mut dyn Write, entry: &Entry) -> io::Result<()> {
    print_ldif_line(w, "dn", entry.dn.as_bytes())?;
    for attr in &entry.attributes {
        for value in &attr.values {
            print_ldif_line(w, &attr.ad, value)?;
        }
    }
    w.write_all(b"\n")
}

/// Render one content record as LDIF text.
pub fn entry_to_ldif(entry: &Entry) -> String {
    let mut out = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_ldif_entry(&mut out, entry);
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parseldif::parse_ldif_str;

    fn capture<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    // ── Group 1: safe strings ───────────────────────────────────────────

    #[test]
    fn test_safe_string_p() {
        assert!(safe_string_p(b""));
        assert!(safe_string_p(b"hello world"));
        assert!(!safe_string_p(b" leading"));
        assert!(!safe_string_p(b":colon"));
        assert!(!safe_string_p(b"<less"));
        assert!(!safe_string_p(b"trailing "));
        assert!(!safe_string_p(b"new\nline"));
        assert!(!safe_string_p("café".as_bytes()));
    }

    // ── Group 2: lines ──────────────────────────────────────────────────

    #[test]
    fn plain_line() {
        let out = capture(|w| print_ldif_line(w, "cn", b"foo"));
        assert_eq!(out, "cn: foo\n");
    }

    #[test]
    fn binary_line_is_base64() {
        let out = capture(|w| print_ldif_line(w, "cn", b"\x00\x01"));
        assert_eq!(out, "cn:: AAE=\n");
    }

    #[test]
    fn long_line_is_folded() {
        let value = "x".repeat(200);
        let out = capture(|w| print_ldif_line(w, "description", value.as_bytes()));
        let lines: Vec<&str> = out.trim_end_matches('\n').split('\n').collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.len() <= FOLD_WIDTH));
        assert!(lines[1..].iter().all(|l| l.starts_with(' ')));
    }

    #[test]
    fn exact_width_line_is_not_folded() {
        let value = "y".repeat(FOLD_WIDTH - 4);
        let out = capture(|w| print_ldif_line(w, "cn", value.as_bytes()));
        assert_eq!(out.matches('\n').count(), 1);
    }

    // ── Group 3: entries ────────────────────────────────────────────────

    #[test]
    fn ldif_entry_simple() {
        let mut e = Entry::new("cn=foo,dc=com");
        e.add_value("cn", b"foo");
        e.add_value("cn", b"bar");
        assert_eq!(entry_to_ldif(&e), "dn: cn=foo,dc=com\ncn: foo\ncn: bar\n\n");
    }

    #[test]
    fn roundtrip_ldif() {
        let mut e = Entry::new("cn=subschema");
        e.add_value(
            "objectClasses",
            "( 2.5.6.0 NAME 'top' DESC 'top of the superclass chain' ABSTRACT MUST objectClass )"
                .as_bytes(),
        );
        e.add_value("description", "caf\u{e9}".as_bytes());
        e.add_value("jpegPhoto", &[0xff, 0xd8, 0x00]);
        e.add_value("note", b" padded ");
        let text = entry_to_ldif(&e);
        let back = parse_ldif_str(&text).unwrap();
        assert_eq!(back, vec![e]);
    }
}
