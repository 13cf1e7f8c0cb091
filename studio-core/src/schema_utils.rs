//! Queries and derivations over a [`SchemaModel`].

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::warn;

use crate::config::BinaryConfig;
use crate::data::Entry;
use crate::error::{ElementKind, SchemaError};
use crate::oids::is_numeric_oid;
use crate::schema::{
    AttributeTypeDescription, LdapSyntaxDescription, MatchingRuleDescription,
    ObjectClassDescription, ObjectClassKind, SchemaElement,
};
use crate::subschema::SchemaModel;

/// Lower-cased names and OIDs of attributes every server treats as
/// operational, whatever its schema says.
const OPERATIONAL_IDENTIFIERS: &[&str] = &[
    "createtimestamp",
    "2.5.18.1",
    "creatorsname",
    "2.5.18.3",
    "modifytimestamp",
    "2.5.18.2",
    "modifiersname",
    "2.5.18.4",
    "subschemasubentry",
    "2.5.18.10",
    "structuralobjectclass",
    "2.5.21.9",
    "governingstructurerule",
    "2.5.21.10",
    "entryuuid",
    "1.3.6.1.1.16.4",
    "entrycsn",
    "entrydn",
    "1.3.6.1.4.1.4203.666.1.33",
    "objectclasses",
    "2.5.21.6",
    "attributetypes",
    "2.5.21.5",
    "ldapsyntaxes",
    "1.3.6.1.4.1.1466.101.120.16",
    "matchingrules",
    "2.5.21.4",
    "matchingruleuse",
    "2.5.21.8",
    "ditcontentrules",
    "2.5.21.2",
    "ditstructurerules",
    "2.5.21.1",
    "nameforms",
    "2.5.21.7",
    "hassubordinates",
    "2.5.18.9",
    "numsubordinates",
    "subordinatecount",
    "vendorname",
    "1.3.6.1.1.4",
    "vendorversion",
    "1.3.6.1.1.5",
];

/// Lower-cased names and OIDs of attributes no client may modify, even
/// when the schema forgets to say so.
const NON_MODIFIABLE_IDENTIFIERS: &[&str] = &[
    "createtimestamp",
    "2.5.18.1",
    "creatorsname",
    "2.5.18.3",
    "modifytimestamp",
    "2.5.18.2",
    "modifiersname",
    "2.5.18.4",
    "subschemasubentry",
    "2.5.18.10",
    "structuralobjectclass",
    "2.5.21.9",
    "governingstructurerule",
    "2.5.21.10",
    "entryuuid",
    "1.3.6.1.1.16.4",
    "entrycsn",
    "entrydn",
    "1.3.6.1.4.1.4203.666.1.33",
    "hassubordinates",
    "2.5.18.9",
    "numsubordinates",
    "subordinatecount",
    "vendorname",
    "1.3.6.1.1.4",
    "vendorversion",
    "1.3.6.1.1.5",
];

// ---------------------------------------------------------------------------
// Names and identifiers
// ---------------------------------------------------------------------------

/// Names sort before numeric OIDs; otherwise case-insensitive order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    match (is_numeric_oid(a), is_numeric_oid(b)) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Sort with [`compare_names`] and drop case-insensitive duplicates.
pub fn sort_names(mut names: Vec<String>) -> Vec<String> {
    names.sort_by(|a, b| compare_names(a, b));
    names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    names
}

/// Every name of every element, sorted.
pub fn names<'a, T, I>(elements: I) -> Vec<String>
where
    T: SchemaElement + 'a,
    I: IntoIterator<Item = &'a T>,
{
    sort_names(
        elements
            .into_iter()
            .flat_map(|e| e.names().iter().cloned())
            .collect(),
    )
}

pub fn numeric_oids<'a, T, I>(elements: I) -> BTreeSet<String>
where
    T: SchemaElement + 'a,
    I: IntoIterator<Item = &'a T>,
{
    elements.into_iter().map(|e| e.oid().to_string()).collect()
}

pub fn lower_case_identifiers<T: SchemaElement>(element: &T) -> BTreeSet<String> {
    element
        .identifiers()
        .iter()
        .map(|id| id.to_lowercase())
        .collect()
}

/// First name, else the OID.
pub fn friendly_identifier<T: SchemaElement>(element: &T) -> &str {
    element.name()
}

/// Syntaxes show their description (or OID), everything else its names.
pub fn display_string<T: SchemaElement>(element: &T) -> String {
    if T::KIND == ElementKind::LdapSyntax {
        if element.description().is_empty() {
            element.oid().to_string()
        } else {
            element.description().to_string()
        }
    } else {
        element.names().join(", ")
    }
}

/// The LDIF value the element was parsed from.
pub fn ldif_line<T: SchemaElement>(element: &T) -> Option<&str> {
    element.raw_value()
}

fn sort_by_display<T: SchemaElement>(elements: &mut [&T]) {
    elements.sort_by_key(|e| display_string(*e).to_lowercase());
}

fn lower_set(values: &[String]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

// ---------------------------------------------------------------------------
// Attribute classification
// ---------------------------------------------------------------------------

pub fn is_operational(atd: &AttributeTypeDescription) -> bool {
    atd.usage.is_operational()
        || atd.is_synthesized()
        || lower_case_identifiers(atd)
            .iter()
            .any(|id| OPERATIONAL_IDENTIFIERS.contains(&id.as_str()))
}

pub fn is_modifiable(atd: &AttributeTypeDescription) -> bool {
    atd.user_modifiable
        && !lower_case_identifiers(atd)
            .iter()
            .any(|id| NON_MODIFIABLE_IDENTIFIERS.contains(&id.as_str()))
}

/// The model's own operational attribute types.
pub fn operational_attribute_types(model: &SchemaModel) -> Vec<&AttributeTypeDescription> {
    model
        .attribute_type_descriptions()
        .iter()
        .filter(|a| is_operational(a))
        .collect()
}

/// The model's own user attribute types.
pub fn user_attribute_types(model: &SchemaModel) -> Vec<&AttributeTypeDescription> {
    model
        .attribute_type_descriptions()
        .iter()
        .filter(|a| !is_operational(a))
        .collect()
}

pub fn is_binary_syntax(lsd: &LdapSyntaxDescription, config: &BinaryConfig) -> bool {
    config.is_binary_syntax(&lsd.oid)
}

pub fn is_string_syntax(lsd: &LdapSyntaxDescription, config: &BinaryConfig) -> bool {
    !is_binary_syntax(lsd, config)
}

/// Binary by OID or name first, then by the (inherited) syntax.
pub fn is_binary(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
    config: &BinaryConfig,
) -> bool {
    if atd.identifiers().iter().any(|id| config.is_binary_attribute(id)) {
        return true;
    }
    match syntax_numeric_oid_transitive(atd, model) {
        Ok(Some(syntax)) => config.is_binary_syntax(&syntax),
        Ok(None) => false,
        Err(e) => {
            warn!("{}", e);
            false
        }
    }
}

pub fn is_string(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
    config: &BinaryConfig,
) -> bool {
    !is_binary(atd, model, config)
}

// ---------------------------------------------------------------------------
// Transitive resolution
// ---------------------------------------------------------------------------

/// Walk up the locally declared superior types until `get` yields a value.
fn resolve_transitive<'a, R, F>(
    atd: &'a AttributeTypeDescription,
    model: &'a SchemaModel,
    get: F,
) -> Result<Option<R>, SchemaError>
where
    F: Fn(&AttributeTypeDescription) -> Option<R>,
{
    let mut visited = BTreeSet::new();
    visited.insert(atd.oid.to_lowercase());
    let mut current: Cow<'a, AttributeTypeDescription> = Cow::Borrowed(atd);
    loop {
        if let Some(value) = get(&*current) {
            return Ok(Some(value));
        }
        let next = match &current.superior {
            Some(sup) if model.has_attribute_type_description(sup) => {
                model.attribute_type_description(sup)
            }
            _ => return Ok(None),
        };
        if !visited.insert(next.oid.to_lowercase()) {
            return Err(SchemaError::Cyclic {
                kind: ElementKind::AttributeType,
                identifier: atd.name().to_string(),
            });
        }
        current = next;
    }
}

pub fn equality_matching_rule_transitive(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<Option<String>, SchemaError> {
    resolve_transitive(atd, model, |a| a.equality.clone())
}

pub fn ordering_matching_rule_transitive(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<Option<String>, SchemaError> {
    resolve_transitive(atd, model, |a| a.ordering.clone())
}

pub fn substring_matching_rule_transitive(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<Option<String>, SchemaError> {
    resolve_transitive(atd, model, |a| a.substring.clone())
}

pub fn syntax_numeric_oid_transitive(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<Option<String>, SchemaError> {
    resolve_transitive(atd, model, |a| a.syntax.clone())
}

/// `None` when no type in the chain declares a length.
pub fn syntax_length_transitive(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<Option<u64>, SchemaError> {
    resolve_transitive(atd, model, |a| a.syntax_length)
}

/// True if `atd` is `ancestor` or inherits from it.
pub fn is_subtype_of(
    atd: &AttributeTypeDescription,
    ancestor: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Result<bool, SchemaError> {
    let hit = resolve_transitive(atd, model, |a| {
        a.oid.eq_ignore_ascii_case(&ancestor.oid).then_some(())
    })?;
    Ok(hit.is_some())
}

// ---------------------------------------------------------------------------
// Reverse indexes
// ---------------------------------------------------------------------------

/// Attribute types whose (inherited) syntax is `lsd`.
pub fn used_from_syntax<'a>(
    lsd: &LdapSyntaxDescription,
    model: &'a SchemaModel,
) -> Result<Vec<&'a AttributeTypeDescription>, SchemaError> {
    let mut used = Vec::new();
    for atd in model.attribute_type_descriptions() {
        if let Some(syntax) = syntax_numeric_oid_transitive(atd, model)? {
            if syntax.eq_ignore_ascii_case(&lsd.oid) {
                used.push(atd);
            }
        }
    }
    sort_by_display(&mut used);
    Ok(used)
}

/// Attribute types using `mrd` for equality, ordering or substrings.
pub fn used_from_matching_rule<'a>(
    mrd: &MatchingRuleDescription,
    model: &'a SchemaModel,
) -> Result<Vec<&'a AttributeTypeDescription>, SchemaError> {
    let ids = lower_case_identifiers(mrd);
    let mut used = Vec::new();
    for atd in model.attribute_type_descriptions() {
        let rules = [
            equality_matching_rule_transitive(atd, model)?,
            ordering_matching_rule_transitive(atd, model)?,
            substring_matching_rule_transitive(atd, model)?,
        ];
        if rules
            .iter()
            .flatten()
            .any(|r| ids.contains(&r.to_lowercase()))
        {
            used.push(atd);
        }
    }
    sort_by_display(&mut used);
    Ok(used)
}

/// Attribute types naming `atd` as their direct superior.
pub fn derived_attribute_types<'a>(
    atd: &AttributeTypeDescription,
    model: &'a SchemaModel,
) -> Vec<&'a AttributeTypeDescription> {
    let ids = lower_case_identifiers(atd);
    let mut derived: Vec<_> = model
        .attribute_type_descriptions()
        .iter()
        .filter(|d| {
            d.superior
                .as_ref()
                .is_some_and(|s| ids.contains(&s.to_lowercase()))
        })
        .collect();
    sort_by_display(&mut derived);
    derived
}

/// Object classes that (transitively) require `atd`.
pub fn used_as_must<'a>(
    atd: &AttributeTypeDescription,
    model: &'a SchemaModel,
) -> Result<Vec<&'a ObjectClassDescription>, SchemaError> {
    used_as(atd, model, must_attribute_names_transitive)
}

/// Object classes that (transitively) allow `atd`.
pub fn used_as_may<'a>(
    atd: &AttributeTypeDescription,
    model: &'a SchemaModel,
) -> Result<Vec<&'a ObjectClassDescription>, SchemaError> {
    used_as(atd, model, may_attribute_names_transitive)
}

fn used_as<'a>(
    atd: &AttributeTypeDescription,
    model: &'a SchemaModel,
    list: fn(&ObjectClassDescription, &SchemaModel) -> Result<Vec<String>, SchemaError>,
) -> Result<Vec<&'a ObjectClassDescription>, SchemaError> {
    let ids = lower_case_identifiers(atd);
    let mut ocds = Vec::new();
    for ocd in model.object_class_descriptions() {
        if list(ocd, model)?
            .iter()
            .any(|n| ids.contains(&n.to_lowercase()))
        {
            ocds.push(ocd);
        }
    }
    sort_by_display(&mut ocds);
    Ok(ocds)
}

/// Names of matching rule uses that apply to `atd`.
pub fn other_matching_rule_names(
    atd: &AttributeTypeDescription,
    model: &SchemaModel,
) -> Vec<String> {
    let ids = lower_case_identifiers(atd);
    names(
        model
            .matching_rule_use_descriptions()
            .iter()
            .filter(|mru| !lower_set(&mru.applies).is_disjoint(&ids)),
    )
}

// ---------------------------------------------------------------------------
// Object class navigation
// ---------------------------------------------------------------------------

/// Every declared superior, resolved through the fallback chain.
pub fn superior_object_classes<'a>(
    ocd: &ObjectClassDescription,
    model: &'a SchemaModel,
) -> Vec<Cow<'a, ObjectClassDescription>> {
    ocd.superiors
        .iter()
        .map(|s| model.object_class_description(s))
        .collect()
}

/// Object classes naming `ocd` as a direct superior.
pub fn sub_object_classes<'a>(
    ocd: &ObjectClassDescription,
    model: &'a SchemaModel,
) -> Vec<&'a ObjectClassDescription> {
    let ids = lower_case_identifiers(ocd);
    model
        .object_class_descriptions()
        .iter()
        .filter(|sub| !lower_set(&sub.superiors).is_disjoint(&ids))
        .collect()
}

/// Collect `list(ocd)` for `ocd` and its locally declared superiors.
fn collect_transitive(
    ocd: &ObjectClassDescription,
    model: &SchemaModel,
    list: fn(&ObjectClassDescription) -> &[String],
    path: &mut Vec<String>,
    out: &mut Vec<String>,
) -> Result<(), SchemaError> {
    let oid = ocd.oid.to_lowercase();
    if path.contains(&oid) {
        return Err(SchemaError::Cyclic {
            kind: ElementKind::ObjectClass,
            identifier: ocd.name().to_string(),
        });
    }
    path.push(oid);
    out.extend(list(ocd).iter().cloned());
    for sup in &ocd.superiors {
        if model.has_object_class_description(sup) {
            let superior = model.object_class_description(sup);
            collect_transitive(&superior, model, list, path, out)?;
        }
    }
    path.pop();
    Ok(())
}

/// Must attribute names of `ocd` and its superiors, sorted and without
/// duplicates.
pub fn must_attribute_names_transitive(
    ocd: &ObjectClassDescription,
    model: &SchemaModel,
) -> Result<Vec<String>, SchemaError> {
    let mut out = Vec::new();
    collect_transitive(ocd, model, |o| o.must.as_slice(), &mut Vec::new(), &mut out)?;
    Ok(sort_names(out))
}

/// May attribute names of `ocd` and its superiors, sorted and without
/// duplicates.
pub fn may_attribute_names_transitive(
    ocd: &ObjectClassDescription,
    model: &SchemaModel,
) -> Result<Vec<String>, SchemaError> {
    let mut out = Vec::new();
    collect_transitive(ocd, model, |o| o.may.as_slice(), &mut Vec::new(), &mut out)?;
    Ok(sort_names(out))
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

fn entry_attribute_types<'a>(
    entry: &Entry,
    model: &'a SchemaModel,
    list: fn(&ObjectClassDescription, &SchemaModel) -> Result<Vec<String>, SchemaError>,
) -> Result<Vec<Cow<'a, AttributeTypeDescription>>, SchemaError> {
    let mut seen = BTreeSet::new();
    let mut atds = Vec::new();
    for oc in entry.string_values("objectClass") {
        let ocd = model.object_class_description(&oc);
        for name in list(&ocd, model)? {
            let atd = model.attribute_type_description(&name);
            if seen.insert(atd.oid.to_lowercase()) {
                atds.push(atd);
            }
        }
    }
    Ok(atds)
}

/// Attribute types the entry's object classes require.
pub fn must_attribute_types<'a>(
    entry: &Entry,
    model: &'a SchemaModel,
) -> Result<Vec<Cow<'a, AttributeTypeDescription>>, SchemaError> {
    entry_attribute_types(entry, model, must_attribute_names_transitive)
}

/// Attribute types the entry's object classes allow.
pub fn may_attribute_types<'a>(
    entry: &Entry,
    model: &'a SchemaModel,
) -> Result<Vec<Cow<'a, AttributeTypeDescription>>, SchemaError> {
    entry_attribute_types(entry, model, may_attribute_names_transitive)
}

pub fn all_attribute_types<'a>(
    entry: &Entry,
    model: &'a SchemaModel,
) -> Result<Vec<Cow<'a, AttributeTypeDescription>>, SchemaError> {
    let mut atds = must_attribute_types(entry, model)?;
    for atd in may_attribute_types(entry, model)? {
        if !atds.iter().any(|a| a.oid.eq_ignore_ascii_case(&atd.oid)) {
            atds.push(atd);
        }
    }
    Ok(atds)
}

/// Reasons the entry doesn't satisfy the schema.  Empty if it does.
pub fn entry_incomplete_messages(
    entry: &Entry,
    model: &SchemaModel,
) -> Result<Vec<String>, SchemaError> {
    let mut messages = Vec::new();

    let classes = entry.string_values("objectClass");
    if entry.get_attribute("objectClass").is_none() {
        messages.push("the entry has no objectClass attribute".to_string());
    }
    let structural = classes
        .iter()
        .any(|oc| model.object_class_description(oc).kind == ObjectClassKind::Structural);
    if !structural {
        messages.push("the entry has no structural object class".to_string());
    }

    let present: Vec<Cow<'_, AttributeTypeDescription>> = entry
        .attributes
        .iter()
        .map(|a| model.attribute_type_description(&a.ad))
        .collect();

    for must in must_attribute_types(entry, model)? {
        let mut satisfied = false;
        for atd in &present {
            if is_subtype_of(atd, &must, model)? {
                satisfied = true;
                break;
            }
        }
        if !satisfied {
            messages.push(format!("mandatory attribute '{}' is missing", must.name()));
        }
    }

    let allowed = all_attribute_types(entry, model)?;
    for (attr, atd) in entry.attributes.iter().zip(&present) {
        if is_operational(atd) {
            continue;
        }
        if !allowed.iter().any(|a| a.oid.eq_ignore_ascii_case(&atd.oid)) {
            messages.push(format!("attribute '{}' is not allowed", attr.ad));
        }
    }

    for attr in &entry.attributes {
        if attr.values.iter().any(|v| v.is_empty()) {
            messages.push(format!("attribute '{}' has an empty value", attr.ad));
        }
    }
    Ok(messages)
}
