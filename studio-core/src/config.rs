//! Binary attribute configuration and configuration profiles.
//!
//! A configuration file is LDIF: every record is a profile named by its DN.
//!
//! ```text
//! dn: default
//! binary-attribute: thumbnailPhoto
//! binary-syntax: 1.3.6.1.4.1.42.2.27.4.1.1
//! ```

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::debug;

use crate::data::Entry;
use crate::error::{Result, StudioError};
use crate::parseldif::LdifReader;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "LDAPSTUDIO_CONFIG";

/// Profile used when none is named.
pub const DEFAULT_PROFILE: &str = "default";

const RC_FILE: &str = ".ldapstudiorc";

const DEFAULT_BINARY_SYNTAXES: &[&str] = &[
    "1.3.6.1.4.1.1466.115.121.1.4",  // Audio
    "1.3.6.1.4.1.1466.115.121.1.5",  // Binary
    "1.3.6.1.4.1.1466.115.121.1.8",  // Certificate
    "1.3.6.1.4.1.1466.115.121.1.9",  // Certificate List
    "1.3.6.1.4.1.1466.115.121.1.10", // Certificate Pair
    "1.3.6.1.4.1.1466.115.121.1.23", // Fax
    "1.3.6.1.4.1.1466.115.121.1.28", // JPEG
    "1.3.6.1.4.1.1466.115.121.1.40", // Octet String
    "1.3.6.1.4.1.1466.115.121.1.49", // Supported Algorithm
];

const DEFAULT_BINARY_ATTRIBUTES: &[&str] = &[
    "javaSerializedData",
    "userPassword",
    "jpegPhoto",
    "photo",
    "audio",
    "userCertificate",
    "cACertificate",
    "authorityRevocationList",
    "certificateRevocationList",
    "crossCertificatePair",
    "userSMIMECertificate",
    "userPKCS12",
];

/// Which syntaxes and attribute types hold binary values.  Comparisons
/// ignore case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryConfig {
    syntax_oids: BTreeSet<String>,
    attributes: BTreeSet<String>,
}

impl Default for BinaryConfig {
    fn default() -> Self {
        let mut config = BinaryConfig::empty();
        for oid in DEFAULT_BINARY_SYNTAXES {
            config.add_syntax(oid);
        }
        for name in DEFAULT_BINARY_ATTRIBUTES {
            config.add_attribute(name);
        }
        config
    }
}

impl BinaryConfig {
    pub fn empty() -> Self {
        BinaryConfig {
            syntax_oids: BTreeSet::new(),
            attributes: BTreeSet::new(),
        }
    }

    pub fn add_syntax(&mut self, oid: &str) {
        self.syntax_oids.insert(oid.trim().to_ascii_uppercase());
    }

    /// Add an attribute type by name or OID.
    pub fn add_attribute(&mut self, name_or_oid: &str) {
        self.attributes.insert(name_or_oid.trim().to_ascii_uppercase());
    }

    pub fn is_binary_syntax(&self, oid: &str) -> bool {
        self.syntax_oids.contains(&oid.trim().to_ascii_uppercase())
    }

    pub fn is_binary_attribute(&self, name_or_oid: &str) -> bool {
        self.attributes
            .contains(&name_or_oid.trim().to_ascii_uppercase())
    }

    /// Upper-cased syntax OIDs.
    pub fn syntax_oids(&self) -> impl Iterator<Item = &str> {
        self.syntax_oids.iter().map(String::as_str)
    }

    /// Upper-cased attribute names and OIDs.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    /// Build the configuration a profile describes.
    pub fn from_profile(profile: &Entry) -> Self {
        let mut config = if profile_get_bool(profile, "no-default-binaries") {
            BinaryConfig::empty()
        } else {
            BinaryConfig::default()
        };
        for oid in profile_get_all(profile, "binary-syntax") {
            config.add_syntax(&oid);
        }
        for name in profile_get_all(profile, "binary-attribute") {
            config.add_attribute(&name);
        }
        config
    }
}

/// Search config file content for a named profile.
/// Returns Ok(None) if not found, Err on a parse error or a duplicate.
pub fn find_profile(content: &[u8], name: &str) -> Result<Option<Entry>> {
    let mut reader = LdifReader::new(Cursor::new(content));
    let mut found: Option<Entry> = None;

    while let Some(entry) = reader.read_entry()? {
        if entry.dn == name {
            if found.is_some() {
                return Err(StudioError::Config(format!(
                    "duplicate configuration profile '{}'",
                    name
                )));
            }
            found = Some(entry);
        }
    }
    Ok(found)
}

fn resolve_config_path(explicit: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    explicit
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|h| Path::new(&h).join(RC_FILE)))
}

/// `$LDAPSTUDIO_CONFIG`, else `~/.ldapstudiorc`.
pub fn config_path() -> Option<PathBuf> {
    resolve_config_path(std::env::var_os(CONFIG_ENV), std::env::var_os("HOME"))
}

/// Read a configuration file and find a profile.
///
/// `path` defaults to [`config_path`] and `name` to [`DEFAULT_PROFILE`].  A
/// missing file or profile is only an error when it was asked for by name.
pub fn load_profile(path: Option<&Path>, name: Option<&str>) -> Result<Option<Entry>> {
    let explicit = path.is_some() || name.is_some();
    let path = match path.map(Path::to_path_buf).or_else(config_path) {
        Some(p) => p,
        None if explicit => {
            return Err(StudioError::Config("no configuration file".to_string()))
        }
        None => return Ok(None),
    };

    let content = match std::fs::read(&path) {
        Ok(c) => c,
        Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no configuration file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let wanted = name.unwrap_or(DEFAULT_PROFILE);
    let found = find_profile(&content, wanted)?;
    if found.is_none() && name.is_some() {
        return Err(StudioError::Config(format!(
            "configuration profile not found: '{}'",
            wanted
        )));
    }
    debug!(
        "profile '{}' {} in {}",
        wanted,
        if found.is_some() { "found" } else { "absent" },
        path.display()
    );
    Ok(found)
}

/// The binary configuration of a profile, or the defaults without one.
pub fn load_binary_config(path: Option<&Path>, name: Option<&str>) -> Result<BinaryConfig> {
    Ok(load_profile(path, name)?
        .map(|p| BinaryConfig::from_profile(&p))
        .unwrap_or_default())
}

fn profile_get(profile: &Entry, key: &str) -> Option<String> {
    profile
        .get_attribute(key)
        .and_then(|a| a.values.last())
        .map(|v| String::from_utf8_lossy(v).into_owned())
}

fn profile_get_all(profile: &Entry, key: &str) -> Vec<String> {
    profile.string_values(key)
}

fn profile_get_bool(profile: &Entry, key: &str) -> bool {
    profile_get(profile, key).as_deref() == Some("yes")
}
