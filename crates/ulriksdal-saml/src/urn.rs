#![forbid(unsafe_code)]

//! SAML 2.0 namespace names and URN constants.

/// SAML 2.0 protocol namespace.
pub const PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
/// SAML 2.0 assertion namespace.
pub const ASSERTION: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

pub const PROTOCOL_PREFIX: &str = "saml2p";
pub const ASSERTION_PREFIX: &str = "saml2";

pub const VERSION: &str = "2.0";

pub const NAMEID_FORMAT_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
pub const CM_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
pub const AC_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified";
pub const ATTRNAME_FORMAT_BASIC: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:basic";
pub const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// Element local names.
pub mod node {
    pub const RESPONSE: &str = "Response";
    pub const STATUS: &str = "Status";
    pub const STATUS_CODE: &str = "StatusCode";
    pub const ASSERTION: &str = "Assertion";
    pub const ISSUER: &str = "Issuer";
    pub const SUBJECT: &str = "Subject";
    pub const NAME_ID: &str = "NameID";
    pub const SUBJECT_CONFIRMATION: &str = "SubjectConfirmation";
    pub const SUBJECT_CONFIRMATION_DATA: &str = "SubjectConfirmationData";
    pub const CONDITIONS: &str = "Conditions";
    pub const AUDIENCE_RESTRICTION: &str = "AudienceRestriction";
    pub const AUDIENCE: &str = "Audience";
    pub const AUTHN_STATEMENT: &str = "AuthnStatement";
    pub const AUTHN_CONTEXT: &str = "AuthnContext";
    pub const AUTHN_CONTEXT_CLASS_REF: &str = "AuthnContextClassRef";
    pub const ATTRIBUTE_STATEMENT: &str = "AttributeStatement";
    pub const ATTRIBUTE: &str = "Attribute";
    pub const ATTRIBUTE_VALUE: &str = "AttributeValue";
}

/// Attribute names.
pub mod attr {
    pub const ID: &str = "ID";
    pub const VERSION: &str = "Version";
    pub const ISSUE_INSTANT: &str = "IssueInstant";
    pub const DESTINATION: &str = "Destination";
    pub const VALUE: &str = "Value";
    pub const FORMAT: &str = "Format";
    pub const METHOD: &str = "Method";
    pub const NOT_BEFORE: &str = "NotBefore";
    pub const NOT_ON_OR_AFTER: &str = "NotOnOrAfter";
    pub const RECIPIENT: &str = "Recipient";
    pub const AUTHN_INSTANT: &str = "AuthnInstant";
    pub const SESSION_INDEX: &str = "SessionIndex";
    pub const NAME: &str = "Name";
    pub const NAME_FORMAT: &str = "NameFormat";
}
