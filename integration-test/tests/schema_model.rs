use std::sync::Arc;

use studio_core::config::{load_binary_config, load_profile, BinaryConfig};
use studio_core::schema::SchemaElement;
use studio_core::schema_utils;
use studio_core::subschema::SchemaModel;
use test_driver::{barbara, entry, init_logging, temp_file, PROFILES_LDIF, SERVER_SCHEMA_LDIF};

fn server_model() -> SchemaModel {
    SchemaModel::parse_ldif(SERVER_SCHEMA_LDIF, Some(SchemaModel::shared_default())).unwrap()
}

// ── Group 1: the bundled default schema ────────────────────────

#[test]
fn default_schema_is_self_consistent() {
    init_logging();
    let model = SchemaModel::shared_default();
    assert!(model.is_default());

    for atd in model.attribute_type_descriptions() {
        if let Some(sup) = &atd.superior {
            assert!(model.has_attribute_type_description(sup), "{} SUP {}", atd.name(), sup);
        }
        let syntax = schema_utils::syntax_numeric_oid_transitive(atd, &model).unwrap();
        let syntax = syntax.unwrap_or_else(|| panic!("{} has no syntax", atd.name()));
        assert!(model.has_ldap_syntax_description(&syntax), "{}", syntax);
        if let Some(mr) = &atd.equality {
            assert!(model.has_matching_rule_description(mr), "{}", mr);
        }
    }

    for ocd in model.object_class_descriptions() {
        for sup in &ocd.superiors {
            assert!(model.has_object_class_description(sup), "{} SUP {}", ocd.name(), sup);
        }
        schema_utils::must_attribute_names_transitive(ocd, &model).unwrap();
        schema_utils::may_attribute_names_transitive(ocd, &model).unwrap();
    }
}

#[test]
fn default_schema_separates_operational_attributes() {
    let model = SchemaModel::shared_default();
    let operational = schema_utils::names(schema_utils::operational_attribute_types(&model));
    let user = schema_utils::names(schema_utils::user_attribute_types(&model));
    for name in ["createTimestamp", "entryUUID", "subschemaSubentry", "objectClasses"] {
        assert!(operational.iter().any(|n| n == name), "{}", name);
        assert!(!user.iter().any(|n| n == name), "{}", name);
    }
    assert!(user.iter().any(|n| n == "cn"));
    assert!(user.iter().any(|n| n == "mail"));
}

#[test]
fn default_schema_extensible_object_allows_user_attributes() {
    let model = SchemaModel::shared_default();
    let ext = model.object_class_description("extensibleObject");
    assert!(!ext.is_synthesized());
    assert!(ext.may.iter().any(|n| n == "telephoneNumber"));
    assert!(!ext.may.iter().any(|n| n == "modifyTimestamp"));
}

#[test]
fn complete_person_passes_checks() {
    let model = SchemaModel::shared_default();
    let messages = schema_utils::entry_incomplete_messages(&barbara(), &model).unwrap();
    assert!(messages.is_empty(), "{:?}", messages);
}

#[test]
fn incomplete_person_is_reported() {
    let model = SchemaModel::shared_default();
    let e = entry(
        "uid=x,dc=example,dc=com",
        &[("objectClass", "inetOrgPerson"), ("uid", "x"), ("dc", "example")],
    );
    let messages = schema_utils::entry_incomplete_messages(&e, &model).unwrap();
    assert!(messages.contains(&"mandatory attribute 'cn' is missing".to_string()));
    assert!(messages.contains(&"mandatory attribute 'sn' is missing".to_string()));
    assert!(messages.contains(&"attribute 'dc' is not allowed".to_string()));
}

// ── Group 2: a server schema over the default ──────────────────

#[test]
fn server_schema_overrides_and_falls_back() {
    init_logging();
    let model = server_model();
    assert_eq!(model.dn(), Some("cn=Subschema"));
    assert_eq!(model.create_timestamp(), Some("20240102030405Z"));

    let description = model.attribute_type_description("description");
    assert_eq!(schema_utils::syntax_length_transitive(&description, &model).unwrap(), Some(1024));

    // only in the default schema
    let cn = model.attribute_type_description("commonName");
    assert!(!cn.is_synthesized());
    assert!(!model.has_attribute_type_description("cn"));

    let badge = model.attribute_type_description("employeeBadge");
    assert!(badge.single_valued);
    assert_eq!(badge.extensions().get("X-ORIGIN"), Some(&vec!["site".to_string()]));
}

#[test]
fn server_schema_inherits_through_the_fallback() {
    let model = server_model();
    let holder = model.object_class_description("badgeHolder");
    assert_eq!(
        schema_utils::must_attribute_names_transitive(&holder, &model).unwrap(),
        vec!["employeeBadge"]
    );
    let sups = schema_utils::superior_object_classes(&holder, &model);
    assert_eq!(sups.len(), 1);
    assert_eq!(sups[0].name(), "top");
    assert!(!sups[0].is_synthesized());
}

#[test]
fn binary_classification_follows_the_profile() {
    let model = server_model();
    let profiles = temp_file(PROFILES_LDIF).unwrap();

    let strict = load_binary_config(Some(profiles.path()), Some("strict")).unwrap();
    let badge = model.attribute_type_description("employeeBadge");
    assert!(schema_utils::is_binary(&badge, &model, &strict));
    let photo = model.attribute_type_description("jpegPhoto");
    assert!(schema_utils::is_string(&photo, &model, &strict));

    let defaults = load_binary_config(Some(profiles.path()), None).unwrap();
    assert!(schema_utils::is_binary(&photo, &model, &defaults));
    assert!(defaults.is_binary_attribute("thumbnailPhoto"));
    assert_eq!(defaults, {
        let mut c = BinaryConfig::default();
        c.add_attribute("thumbnailPhoto");
        c
    });
}

#[test]
fn unknown_profile_is_an_error() {
    let profiles = temp_file(PROFILES_LDIF).unwrap();
    assert!(load_profile(Some(profiles.path()), Some("missing")).is_err());
}

// ── Group 3: files ─────────────────────────────────────────────

#[test]
fn schema_file_round_trip() {
    let file = temp_file(SERVER_SCHEMA_LDIF).unwrap();
    let fallback = SchemaModel::shared_default();
    let model = SchemaModel::load_from_file(file.path(), Some(Arc::clone(&fallback))).unwrap();

    let mut out = Vec::new();
    model.save_to_ldif(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let again = SchemaModel::parse_ldif(&text, Some(fallback)).unwrap();

    assert_eq!(
        schema_utils::names(model.attribute_type_descriptions()),
        schema_utils::names(again.attribute_type_descriptions())
    );
    assert_eq!(
        schema_utils::names(model.object_class_descriptions()),
        schema_utils::names(again.object_class_descriptions())
    );
    assert_eq!(again.modify_timestamp(), Some("20240607080910Z"));
}

#[test]
fn missing_schema_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(SchemaModel::load_from_file(dir.path().join("absent.ldif"), None).is_err());
}
