#![forbid(unsafe_code)]

//! The SAML 2.0 assertion data model and its builder.
//!
//! [`AssertionBuilder`] is pure: it reads the clock and a random source for
//! the ID, nothing else, and does not validate its inputs.  Every field of
//! the [`Assertion`] is mapped to markup explicitly by
//! [`Assertion::to_element`].

use chrono::{DateTime, Duration, Utc};
use ulriksdal_xml::Element;

use crate::id::{self, xs_datetime};
use crate::urn::{self, attr, node};

/// Attribute name/value pairs in insertion order.
///
/// Inserting a name that is already present replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for AttributeMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    pub value: String,
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfirmation {
    pub method: String,
    pub not_on_or_after: DateTime<Utc>,
    pub recipient: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name_id: NameId,
    pub confirmation: SubjectConfirmation,
}

/// Validity window and audience restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conditions {
    pub not_before: DateTime<Utc>,
    pub not_on_or_after: DateTime<Utc>,
    pub audiences: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnStatement {
    pub authn_instant: DateTime<Utc>,
    pub session_index: String,
    pub class_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub name_format: String,
    pub values: Vec<String>,
}

/// A SAML 2.0 `<saml2:Assertion>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub id: String,
    pub issue_instant: DateTime<Utc>,
    pub issuer: String,
    pub subject: Subject,
    pub conditions: Conditions,
    pub authn_statement: AuthnStatement,
    /// Absent when there are no attributes; an empty statement is not
    /// schema-valid.
    pub attributes: Vec<Attribute>,
}

impl Assertion {
    /// The assertion as a `<saml2:Assertion>` element declaring its own
    /// namespace, with children in schema order.
    pub fn to_element(&self) -> Element {
        saml2(urn::node::ASSERTION)
            .ns(Some(urn::ASSERTION_PREFIX), urn::ASSERTION)
            .attr(attr::ID, self.id.as_str())
            .attr(attr::VERSION, urn::VERSION)
            .attr(attr::ISSUE_INSTANT, xs_datetime(&self.issue_instant))
            .child(issuer_element(&self.issuer))
            .child(self.subject_element())
            .child(self.conditions_element())
            .child(self.authn_statement_element())
            .child_opt(self.attribute_statement_element())
    }

    fn subject_element(&self) -> Element {
        let name_id = &self.subject.name_id;
        let confirmation = &self.subject.confirmation;
        saml2(node::SUBJECT)
            .child(
                saml2(node::NAME_ID)
                    .attr(attr::FORMAT, name_id.format.as_str())
                    .text(name_id.value.as_str()),
            )
            .child(
                saml2(node::SUBJECT_CONFIRMATION)
                    .attr(attr::METHOD, confirmation.method.as_str())
                    .child(
                        saml2(node::SUBJECT_CONFIRMATION_DATA)
                            .attr(attr::NOT_ON_OR_AFTER, xs_datetime(&confirmation.not_on_or_after))
                            .attr(attr::RECIPIENT, confirmation.recipient.as_str()),
                    ),
            )
    }

    fn conditions_element(&self) -> Element {
        let audiences = self
            .conditions
            .audiences
            .iter()
            .map(|a| saml2(node::AUDIENCE).text(a.as_str()));
        saml2(node::CONDITIONS)
            .attr(attr::NOT_BEFORE, xs_datetime(&self.conditions.not_before))
            .attr(attr::NOT_ON_OR_AFTER, xs_datetime(&self.conditions.not_on_or_after))
            .child(saml2(node::AUDIENCE_RESTRICTION).children(audiences))
    }

    fn authn_statement_element(&self) -> Element {
        let stmt = &self.authn_statement;
        saml2(node::AUTHN_STATEMENT)
            .attr(attr::AUTHN_INSTANT, xs_datetime(&stmt.authn_instant))
            .attr(attr::SESSION_INDEX, stmt.session_index.as_str())
            .child(
                saml2(node::AUTHN_CONTEXT)
                    .child(saml2(node::AUTHN_CONTEXT_CLASS_REF).text(stmt.class_ref.as_str())),
            )
    }

    fn attribute_statement_element(&self) -> Option<Element> {
        if self.attributes.is_empty() {
            return None;
        }
        let attributes = self.attributes.iter().map(|a| {
            saml2(node::ATTRIBUTE)
                .attr(attr::NAME, a.name.as_str())
                .attr(attr::NAME_FORMAT, a.name_format.as_str())
                .children(
                    a.values
                        .iter()
                        .map(|v| saml2(node::ATTRIBUTE_VALUE).text(v.as_str())),
                )
        });
        Some(saml2(node::ATTRIBUTE_STATEMENT).children(attributes))
    }
}

/// An element in the assertion namespace.
pub(crate) fn saml2(local_name: &str) -> Element {
    Element::new(format!("{}:{local_name}", urn::ASSERTION_PREFIX))
}

pub(crate) fn issuer_element(issuer: &str) -> Element {
    saml2(node::ISSUER).text(issuer)
}

/// Builds an [`Assertion`] from the values of an SSO handoff.
///
/// String inputs are trimmed.  The issue instant defaults to the current
/// time truncated to whole seconds; every other timestamp derives from it.
#[derive(Debug, Clone)]
pub struct AssertionBuilder {
    issuer: String,
    subject: String,
    audience: String,
    recipient: String,
    expiration_minutes: u32,
    attributes: AttributeMap,
    issue_instant: Option<DateTime<Utc>>,
}

impl AssertionBuilder {
    pub fn new(issuer: &str, subject: &str) -> Self {
        Self {
            issuer: issuer.trim().to_owned(),
            subject: subject.trim().to_owned(),
            audience: String::new(),
            recipient: String::new(),
            expiration_minutes: 0,
            attributes: AttributeMap::new(),
            issue_instant: None,
        }
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.trim().to_owned();
        self
    }

    pub fn recipient(mut self, recipient: &str) -> Self {
        self.recipient = recipient.trim().to_owned();
        self
    }

    pub fn expiration_minutes(mut self, minutes: u32) -> Self {
        self.expiration_minutes = minutes;
        self
    }

    pub fn attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    /// Fix the issue instant instead of reading the clock.
    pub fn issue_instant(mut self, at: DateTime<Utc>) -> Self {
        self.issue_instant = Some(at);
        self
    }

    pub fn build(self) -> Assertion {
        let id = id::new_id();
        let issued = self.issue_instant.unwrap_or_else(id::now);
        let expires = issued + Duration::minutes(i64::from(self.expiration_minutes));

        let attributes = self
            .attributes
            .iter()
            .map(|(name, value)| Attribute {
                name: name.to_owned(),
                name_format: urn::ATTRNAME_FORMAT_BASIC.to_owned(),
                values: vec![value.to_owned()],
            })
            .collect();

        Assertion {
            issue_instant: issued,
            issuer: self.issuer,
            subject: Subject {
                name_id: NameId {
                    value: self.subject,
                    format: urn::NAMEID_FORMAT_UNSPECIFIED.to_owned(),
                },
                confirmation: SubjectConfirmation {
                    method: urn::CM_BEARER.to_owned(),
                    not_on_or_after: expires,
                    recipient: self.recipient,
                },
            },
            conditions: Conditions {
                not_before: issued,
                not_on_or_after: expires,
                audiences: vec![self.audience],
            },
            authn_statement: AuthnStatement {
                authn_instant: issued,
                session_index: id.clone(),
                class_ref: urn::AC_UNSPECIFIED.to_owned(),
            },
            attributes,
            id,
        }
    }
}
