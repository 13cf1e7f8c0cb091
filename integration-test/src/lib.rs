//! Shared fixtures for the studio-core integration tests.
//!
//! - sample directory data (a server subschema, a profile file, entries)
//! - temporary files holding that data
//! - proptest strategies for the directive value types

use std::io::Write;

use studio_core::data::Entry;

pub mod strategies;

/// A small server subschema.  It extends the bundled default schema with
/// one attribute type and one auxiliary object class, and redefines
/// `description` with a length limit.
pub const SERVER_SCHEMA_LDIF: &str = "\
version: 1

dn: cn=Subschema
objectClass: top
objectClass: subschema
createTimestamp: 20240102030405Z
modifyTimestamp: 20240607080910Z
attributeTypes: ( 2.5.4.13 NAME 'description' EQUALITY caseIgnoreMatch
  SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{1024} )
attributeTypes: ( 1.3.6.1.4.1.99999.1.1 NAME 'employeeBadge'
  DESC 'Badge number' SUP name SINGLE-VALUE X-ORIGIN 'site' )
objectClasses: ( 1.3.6.1.4.1.99999.2.1 NAME 'badgeHolder' SUP top AUXILIARY
  MUST employeeBadge MAY description )
";

/// A configuration file with two profiles.
pub const PROFILES_LDIF: &str = "\
dn: default
binary-attribute: thumbnailPhoto

dn: strict
no-default-binaries: yes
binary-syntax: 1.3.6.1.4.1.1466.115.121.1.40
binary-attribute: employeeBadge
";

/// Route `log` output through the test harness.  Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write `content` to a fresh temporary file.
pub fn temp_file(content: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Build an entry from `(attribute, value)` pairs.
pub fn entry(dn: &str, values: &[(&str, &str)]) -> Entry {
    let mut entry = Entry::new(dn);
    for (ad, value) in values {
        entry.add_value(ad, value.as_bytes());
    }
    entry
}

/// A complete inetOrgPerson.
pub fn barbara() -> Entry {
    entry(
        "cn=Barbara Jensen,ou=People,dc=example,dc=com",
        &[
            ("objectClass", "top"),
            ("objectClass", "person"),
            ("objectClass", "organizationalPerson"),
            ("objectClass", "inetOrgPerson"),
            ("cn", "Barbara Jensen"),
            ("cn", "Babs Jensen"),
            ("sn", "Jensen"),
            ("givenName", "Barbara"),
            ("uid", "bjensen"),
            ("mail", "bjensen@example.com"),
            ("telephoneNumber", "+1 408 555 1862"),
        ],
    )
}
