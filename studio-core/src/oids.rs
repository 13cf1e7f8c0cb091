//! Human-readable descriptions of well-known syntax and matching rule OIDs.

/// Syntaxes from RFC 4517 and RFC 4523, plus a few common vendor ones.
const SYNTAXES: &[(&str, &str)] = &[
    ("1.3.6.1.4.1.1466.115.121.1.3", "Attribute Type Description"),
    ("1.3.6.1.4.1.1466.115.121.1.4", "Audio"),
    ("1.3.6.1.4.1.1466.115.121.1.5", "Binary"),
    ("1.3.6.1.4.1.1466.115.121.1.6", "Bit String"),
    ("1.3.6.1.4.1.1466.115.121.1.7", "Boolean"),
    ("1.3.6.1.4.1.1466.115.121.1.8", "Certificate"),
    ("1.3.6.1.4.1.1466.115.121.1.9", "Certificate List"),
    ("1.3.6.1.4.1.1466.115.121.1.10", "Certificate Pair"),
    ("1.3.6.1.4.1.1466.115.121.1.11", "Country String"),
    ("1.3.6.1.4.1.1466.115.121.1.12", "DN"),
    ("1.3.6.1.4.1.1466.115.121.1.14", "Delivery Method"),
    ("1.3.6.1.4.1.1466.115.121.1.15", "Directory String"),
    ("1.3.6.1.4.1.1466.115.121.1.16", "DIT Content Rule Description"),
    ("1.3.6.1.4.1.1466.115.121.1.17", "DIT Structure Rule Description"),
    ("1.3.6.1.4.1.1466.115.121.1.21", "Enhanced Guide"),
    ("1.3.6.1.4.1.1466.115.121.1.22", "Facsimile Telephone Number"),
    ("1.3.6.1.4.1.1466.115.121.1.23", "Fax"),
    ("1.3.6.1.4.1.1466.115.121.1.24", "Generalized Time"),
    ("1.3.6.1.4.1.1466.115.121.1.25", "Guide"),
    ("1.3.6.1.4.1.1466.115.121.1.26", "IA5 String"),
    ("1.3.6.1.4.1.1466.115.121.1.27", "INTEGER"),
    ("1.3.6.1.4.1.1466.115.121.1.28", "JPEG"),
    ("1.3.6.1.4.1.1466.115.121.1.30", "Matching Rule Description"),
    ("1.3.6.1.4.1.1466.115.121.1.31", "Matching Rule Use Description"),
    ("1.3.6.1.4.1.1466.115.121.1.34", "Name And Optional UID"),
    ("1.3.6.1.4.1.1466.115.121.1.35", "Name Form Description"),
    ("1.3.6.1.4.1.1466.115.121.1.36", "Numeric String"),
    ("1.3.6.1.4.1.1466.115.121.1.37", "Object Class Description"),
    ("1.3.6.1.4.1.1466.115.121.1.38", "OID"),
    ("1.3.6.1.4.1.1466.115.121.1.39", "Other Mailbox"),
    ("1.3.6.1.4.1.1466.115.121.1.40", "Octet String"),
    ("1.3.6.1.4.1.1466.115.121.1.41", "Postal Address"),
    ("1.3.6.1.4.1.1466.115.121.1.44", "Printable String"),
    ("1.3.6.1.4.1.1466.115.121.1.49", "Supported Algorithm"),
    ("1.3.6.1.4.1.1466.115.121.1.50", "Telephone Number"),
    ("1.3.6.1.4.1.1466.115.121.1.51", "Teletex Terminal Identifier"),
    ("1.3.6.1.4.1.1466.115.121.1.52", "Telex Number"),
    ("1.3.6.1.4.1.1466.115.121.1.53", "UTC Time"),
    ("1.3.6.1.4.1.1466.115.121.1.54", "LDAP Syntax Description"),
    ("1.3.6.1.4.1.1466.115.121.1.58", "Substring Assertion"),
    ("1.3.6.1.1.1.0.0", "RFC2307 NIS Netgroup Triple"),
    ("1.3.6.1.1.1.0.1", "RFC2307 Boot Parameter"),
    ("1.3.6.1.1.15.1", "X.509 Certificate Exact Assertion"),
    ("1.3.6.1.1.16.1", "UUID"),
    ("1.3.6.1.4.1.4203.1.1.1", "OpenLDAP void"),
];

/// Matching rules from RFC 4517.
const MATCHING_RULES: &[(&str, &str)] = &[
    ("2.5.13.0", "objectIdentifierMatch"),
    ("2.5.13.1", "distinguishedNameMatch"),
    ("2.5.13.2", "caseIgnoreMatch"),
    ("2.5.13.3", "caseIgnoreOrderingMatch"),
    ("2.5.13.4", "caseIgnoreSubstringsMatch"),
    ("2.5.13.5", "caseExactMatch"),
    ("2.5.13.6", "caseExactOrderingMatch"),
    ("2.5.13.7", "caseExactSubstringsMatch"),
    ("2.5.13.8", "numericStringMatch"),
    ("2.5.13.9", "numericStringOrderingMatch"),
    ("2.5.13.10", "numericStringSubstringsMatch"),
    ("2.5.13.11", "caseIgnoreListMatch"),
    ("2.5.13.12", "caseIgnoreListSubstringsMatch"),
    ("2.5.13.13", "booleanMatch"),
    ("2.5.13.14", "integerMatch"),
    ("2.5.13.15", "integerOrderingMatch"),
    ("2.5.13.16", "bitStringMatch"),
    ("2.5.13.17", "octetStringMatch"),
    ("2.5.13.18", "octetStringOrderingMatch"),
    ("2.5.13.20", "telephoneNumberMatch"),
    ("2.5.13.21", "telephoneNumberSubstringsMatch"),
    ("2.5.13.23", "uniqueMemberMatch"),
    ("2.5.13.27", "generalizedTimeMatch"),
    ("2.5.13.28", "generalizedTimeOrderingMatch"),
    ("2.5.13.29", "integerFirstComponentMatch"),
    ("2.5.13.30", "objectIdentifierFirstComponentMatch"),
    ("2.5.13.31", "directoryStringFirstComponentMatch"),
    ("2.5.13.32", "wordMatch"),
    ("2.5.13.33", "keywordMatch"),
    ("1.3.6.1.4.1.1466.109.114.1", "caseExactIA5Match"),
    ("1.3.6.1.4.1.1466.109.114.2", "caseIgnoreIA5Match"),
    ("1.3.6.1.4.1.1466.109.114.3", "caseIgnoreIA5SubstringsMatch"),
    ("1.3.6.1.1.16.2", "UUIDMatch"),
    ("1.3.6.1.1.16.3", "UUIDOrderingMatch"),
];

/// Look up the description of a syntax or matching rule OID.
pub fn oid_description(oid: &str) -> Option<&'static str> {
    let oid = oid.trim();
    SYNTAXES
        .iter()
        .chain(MATCHING_RULES)
        .find(|(o, _)| *o == oid)
        .map(|(_, desc)| *desc)
}

/// True if `s` has the shape of a numeric OID (`1.2.840`).
pub fn is_numeric_oid(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
}
