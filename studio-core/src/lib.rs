//! Parsing and modelling of LDAP directory configuration: OpenLDAP
//! `syncrepl` and `olcAccess` values, LDIF records, and subschema entries.

pub mod acl;
pub mod config;
pub mod data;
pub mod error;
pub mod lexer;
pub mod oids;
pub mod parseacl;
pub mod parseldif;
pub mod print;
pub mod schema;
pub mod schema_utils;
pub mod subschema;
pub mod syncrepl;
pub mod values;

pub use error::{Result, StudioError};
