//! The schema model built from a subschema entry.
//!
//! Elements are looked up case-insensitively by OID or any name.  A lookup
//! that misses falls through to the fallback model (usually the bundled
//! default schema), and past that to a synthesized placeholder, so it always
//! yields an element.  `has_*` only consults the model itself.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use log::{debug, error, info, warn};

use crate::data::{value_to_string, Entry};
use crate::error::{Result, SchemaError};
use crate::oids::oid_description;
use crate::parseldif::{parse_ldif_str, read_ldif_file};
use crate::print::write_ldif_entry;
use crate::schema::{
    AttributeTypeDescription, LdapSyntaxDescription, MatchingRuleDescription,
    MatchingRuleUseDescription, ObjectClassDescription, SchemaElement, X_RAW_SCHEMA_DEFINITION,
};
use crate::schema_utils;

/// Name of the object class whose may-list is every user attribute type.
pub const EXTENSIBLE_OBJECT: &str = "extensibleObject";

const DEFAULT_SCHEMA_LDIF: &str = include_str!("default_schema.ldif");

/// Elements of one kind, in declaration order, indexed by lower-cased
/// OID and names.
#[derive(Debug, Clone)]
struct ElementMap<T> {
    elements: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for ElementMap<T> {
    fn default() -> Self {
        ElementMap {
            elements: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: SchemaElement> ElementMap<T> {
    /// Add an element.  One with the same OID is replaced in place.
    fn insert(&mut self, element: T) {
        let slot = match self.index.get(&element.oid().to_lowercase()) {
            Some(&i) => {
                let stale: Vec<String> = self.elements[i]
                    .identifiers()
                    .iter()
                    .map(|id| id.to_lowercase())
                    .collect();
                for id in stale {
                    if self.index.get(&id) == Some(&i) {
                        self.index.remove(&id);
                    }
                }
                self.elements[i] = element;
                i
            }
            None => {
                self.elements.push(element);
                self.elements.len() - 1
            }
        };
        let ids: Vec<String> = self.elements[slot]
            .identifiers()
            .iter()
            .map(|id| id.to_lowercase())
            .collect();
        for id in ids {
            self.index.insert(id, slot);
        }
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.index
            .get(&id.trim().to_lowercase())
            .map(|&i| &self.elements[i])
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&id.trim().to_lowercase())
    }
}

fn object_classes(m: &SchemaModel) -> &ElementMap<ObjectClassDescription> {
    &m.object_classes
}

fn attribute_types(m: &SchemaModel) -> &ElementMap<AttributeTypeDescription> {
    &m.attribute_types
}

fn ldap_syntaxes(m: &SchemaModel) -> &ElementMap<LdapSyntaxDescription> {
    &m.ldap_syntaxes
}

fn matching_rules(m: &SchemaModel) -> &ElementMap<MatchingRuleDescription> {
    &m.matching_rules
}

fn matching_rule_uses(m: &SchemaModel) -> &ElementMap<MatchingRuleUseDescription> {
    &m.matching_rule_uses
}

/// Parse `value` and add it, tagged with its raw text.  A bad value is
/// logged and dropped.
fn insert_parsed<T, F>(map: &mut ElementMap<T>, value: &str, fixup: F)
where
    T: SchemaElement + FromStr<Err = SchemaError>,
    F: FnOnce(&mut T),
{
    match value.parse::<T>() {
        Ok(mut element) => {
            fixup(&mut element);
            element
                .extensions_mut()
                .insert(X_RAW_SCHEMA_DEFINITION.to_string(), vec![value.to_string()]);
            map.insert(element);
        }
        Err(e) => warn!("skipping schema element '{}': {}", value, e),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaModel {
    record: Option<Entry>,
    create_timestamp: Option<String>,
    modify_timestamp: Option<String>,
    default: bool,
    fallback: Option<Arc<SchemaModel>>,
    object_classes: ElementMap<ObjectClassDescription>,
    attribute_types: ElementMap<AttributeTypeDescription>,
    ldap_syntaxes: ElementMap<LdapSyntaxDescription>,
    matching_rules: ElementMap<MatchingRuleDescription>,
    matching_rule_uses: ElementMap<MatchingRuleUseDescription>,
}

impl SchemaModel {
    /// A model with no elements of its own.
    pub fn empty(fallback: Option<Arc<SchemaModel>>) -> Self {
        SchemaModel {
            fallback,
            ..Default::default()
        }
    }

    /// Populate a model from a subschema entry.
    pub fn from_entry(entry: &Entry, fallback: Option<Arc<SchemaModel>>) -> Self {
        let mut model = SchemaModel::empty(fallback);
        model.populate(entry);
        model
    }

    /// Populate a model from the first record of some LDIF text.  Fails only
    /// if the LDIF itself is malformed.
    pub fn parse_ldif(text: &str, fallback: Option<Arc<SchemaModel>>) -> Result<Self> {
        let entries = parse_ldif_str(text)?;
        Ok(Self::from_first_record(entries, fallback))
    }

    /// Populate a model from the first record of an LDIF file.
    pub fn load_from_file(
        path: impl AsRef<Path>,
        fallback: Option<Arc<SchemaModel>>,
    ) -> Result<Self> {
        let entries = read_ldif_file(path)?;
        Ok(Self::from_first_record(entries, fallback))
    }

    fn from_first_record(entries: Vec<Entry>, fallback: Option<Arc<SchemaModel>>) -> Self {
        match entries.first() {
            Some(entry) => Self::from_entry(entry, fallback),
            None => {
                debug!("no schema record in LDIF input");
                Self::empty(fallback)
            }
        }
    }

    /// The bundled baseline schema.
    pub fn load_default() -> Result<Self> {
        let mut model = Self::parse_ldif(DEFAULT_SCHEMA_LDIF, None)?;
        model.default = true;
        Ok(model)
    }

    /// A process-wide instance of [`SchemaModel::load_default`], built on
    /// first use.
    pub fn shared_default() -> Arc<SchemaModel> {
        static DEFAULT: OnceLock<Arc<SchemaModel>> = OnceLock::new();
        DEFAULT
            .get_or_init(|| {
                let model = Self::load_default().unwrap_or_else(|e| {
                    error!("bundled default schema is unreadable: {}", e);
                    SchemaModel::default()
                });
                Arc::new(SchemaModel {
                    default: true,
                    ..model
                })
            })
            .clone()
    }

    fn populate(&mut self, entry: &Entry) {
        for attr in &entry.attributes {
            let kind = attr.ad.to_ascii_lowercase();
            for raw in &attr.values {
                let value = value_to_string(raw);
                match kind.as_str() {
                    "objectclasses" => insert_parsed(&mut self.object_classes, &value, |_| {}),
                    "attributetypes" => insert_parsed(&mut self.attribute_types, &value, |_| {}),
                    "ldapsyntaxes" => insert_parsed(
                        &mut self.ldap_syntaxes,
                        &value,
                        |lsd: &mut LdapSyntaxDescription| {
                            if lsd.description.is_empty() {
                                if let Some(desc) = oid_description(&lsd.oid) {
                                    lsd.description = desc.to_string();
                                }
                            }
                        },
                    ),
                    "matchingrules" => insert_parsed(&mut self.matching_rules, &value, |_| {}),
                    "matchingruleuse" => {
                        insert_parsed(&mut self.matching_rule_uses, &value, |_| {})
                    }
                    "createtimestamp" => self.create_timestamp = Some(value),
                    "modifytimestamp" => self.modify_timestamp = Some(value),
                    _ => {}
                }
            }
        }
        self.record = Some(entry.clone());
        self.add_pseudo_elements();
        self.fill_extensible_object();
        info!(
            "schema '{}': {} object classes, {} attribute types, {} syntaxes, {} matching rules, {} matching rule uses",
            entry.dn,
            self.object_classes.elements.len(),
            self.attribute_types.elements.len(),
            self.ldap_syntaxes.elements.len(),
            self.matching_rules.elements.len(),
            self.matching_rule_uses.elements.len()
        );
    }

    /// Attribute types are trusted: any syntax or matching rule they name
    /// but the schema lacks gets a placeholder.
    fn add_pseudo_elements(&mut self) {
        let mut syntaxes = Vec::new();
        let mut rules = Vec::new();
        for atd in &self.attribute_types.elements {
            if let Some(syntax) = &atd.syntax {
                if !self.ldap_syntaxes.contains(syntax) {
                    syntaxes.push(syntax.clone());
                }
            }
            for mr in [&atd.equality, &atd.ordering, &atd.substring]
                .into_iter()
                .flatten()
            {
                if !self.matching_rules.contains(mr) {
                    rules.push(mr.clone());
                }
            }
        }
        for oid in syntaxes {
            if self.ldap_syntaxes.contains(&oid) {
                continue;
            }
            debug!("adding placeholder syntax {}", oid);
            let mut lsd = LdapSyntaxDescription::dummy(&oid);
            lsd.description = oid_description(&oid).unwrap_or_default().to_string();
            self.ldap_syntaxes.insert(lsd);
        }
        for mr in rules {
            if self.matching_rules.contains(&mr) {
                continue;
            }
            debug!("adding placeholder matching rule {}", mr);
            self.matching_rules.insert(MatchingRuleDescription::dummy(&mr));
        }
    }

    /// extensibleObject may hold any user attribute.
    fn fill_extensible_object(&mut self) {
        let mut ocd = self.object_class_description(EXTENSIBLE_OBJECT).into_owned();
        if ocd.is_synthesized() && !self.has_object_class_description(EXTENSIBLE_OBJECT) {
            return;
        }
        ocd.may = schema_utils::names(schema_utils::user_attribute_types(self));
        self.object_classes.insert(ocd);
    }

    /// Three-tier lookup: this model, the fallback chain, a placeholder.
    fn lookup<'a, T: SchemaElement>(
        &'a self,
        id: &str,
        select: fn(&SchemaModel) -> &ElementMap<T>,
    ) -> Cow<'a, T> {
        let mut model = self;
        loop {
            if let Some(element) = select(model).get(id) {
                return Cow::Borrowed(element);
            }
            match &model.fallback {
                Some(fallback) if !model.default => model = fallback.as_ref(),
                _ => break,
            }
        }
        warn!("unknown {} '{}', using a placeholder", T::KIND, id);
        Cow::Owned(T::dummy(id))
    }

    pub fn object_class_description(&self, name_or_oid: &str) -> Cow<'_, ObjectClassDescription> {
        self.lookup(name_or_oid, object_classes)
    }

    /// Attribute description options (`cn;lang-en`) are ignored.
    pub fn attribute_type_description(
        &self,
        name_or_oid: &str,
    ) -> Cow<'_, AttributeTypeDescription> {
        self.lookup(strip_options(name_or_oid), attribute_types)
    }

    pub fn ldap_syntax_description(&self, oid: &str) -> Cow<'_, LdapSyntaxDescription> {
        self.lookup(oid, ldap_syntaxes)
    }

    pub fn matching_rule_description(&self, name_or_oid: &str) -> Cow<'_, MatchingRuleDescription> {
        self.lookup(name_or_oid, matching_rules)
    }

    pub fn matching_rule_use_description(
        &self,
        name_or_oid: &str,
    ) -> Cow<'_, MatchingRuleUseDescription> {
        self.lookup(name_or_oid, matching_rule_uses)
    }

    pub fn has_object_class_description(&self, name_or_oid: &str) -> bool {
        self.object_classes.contains(name_or_oid)
    }

    pub fn has_attribute_type_description(&self, name_or_oid: &str) -> bool {
        self.attribute_types.contains(strip_options(name_or_oid))
    }

    pub fn has_ldap_syntax_description(&self, oid: &str) -> bool {
        self.ldap_syntaxes.contains(oid)
    }

    pub fn has_matching_rule_description(&self, name_or_oid: &str) -> bool {
        self.matching_rules.contains(name_or_oid)
    }

    pub fn has_matching_rule_use_description(&self, name_or_oid: &str) -> bool {
        self.matching_rule_uses.contains(name_or_oid)
    }

    pub fn object_class_descriptions(&self) -> &[ObjectClassDescription] {
        &self.object_classes.elements
    }

    pub fn attribute_type_descriptions(&self) -> &[AttributeTypeDescription] {
        &self.attribute_types.elements
    }

    pub fn ldap_syntax_descriptions(&self) -> &[LdapSyntaxDescription] {
        &self.ldap_syntaxes.elements
    }

    pub fn matching_rule_descriptions(&self) -> &[MatchingRuleDescription] {
        &self.matching_rules.elements
    }

    pub fn matching_rule_use_descriptions(&self) -> &[MatchingRuleUseDescription] {
        &self.matching_rule_uses.elements
    }

    /// DN of the subschema entry the model was built from.
    pub fn dn(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.dn.as_str())
    }

    pub fn record(&self) -> Option<&Entry> {
        self.record.as_ref()
    }

    pub fn create_timestamp(&self) -> Option<&str> {
        self.create_timestamp.as_deref()
    }

    pub fn modify_timestamp(&self) -> Option<&str> {
        self.modify_timestamp.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn fallback(&self) -> Option<&Arc<SchemaModel>> {
        self.fallback.as_ref()
    }

    /// Write the subschema entry back out as LDIF.  Nothing is written for
    /// a model that wasn't built from an entry.
    pub fn save_to_ldif(&self, w: &mut dyn Write) -> io::Result<()> {
        match &self.record {
            Some(record) => write_ldif_entry(w, record),
            None => Ok(()),
        }
    }
}

/// `cn;lang-en` -> `cn`
fn strip_options(ad: &str) -> &str {
    ad.split(';').next().unwrap_or(ad).trim()
}
