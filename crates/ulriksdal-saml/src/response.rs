#![forbid(unsafe_code)]

//! The `<saml2p:Response>` envelope.

use chrono::{DateTime, Utc};
use ulriksdal_xml::{Element, XmlWriter};

use crate::assertion::{issuer_element, Assertion};
use crate::id::{self, xs_datetime};
use crate::urn::{self, attr, node};

/// A SAML 2.0 protocol Response carrying one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: String,
    pub issue_instant: DateTime<Utc>,
    pub destination: String,
    pub issuer: String,
    pub status_code: String,
    pub assertion: Assertion,
}

impl Response {
    /// Wrap `assertion` in a successful Response addressed to its recipient.
    ///
    /// The Response gets its own fresh ID; instant and issuer are the
    /// assertion's.
    pub fn wrap(assertion: Assertion) -> Self {
        Self {
            id: id::new_id(),
            issue_instant: assertion.issue_instant,
            destination: assertion.subject.confirmation.recipient.clone(),
            issuer: assertion.issuer.clone(),
            status_code: urn::STATUS_SUCCESS.to_owned(),
            assertion,
        }
    }

    pub fn to_element(&self) -> Element {
        protocol(node::RESPONSE)
            .ns(Some(urn::PROTOCOL_PREFIX), urn::PROTOCOL)
            .ns(Some(urn::ASSERTION_PREFIX), urn::ASSERTION)
            .attr(attr::ID, self.id.as_str())
            .attr(attr::VERSION, urn::VERSION)
            .attr(attr::ISSUE_INSTANT, xs_datetime(&self.issue_instant))
            .attr(attr::DESTINATION, self.destination.as_str())
            .child(issuer_element(&self.issuer))
            .child(
                protocol(node::STATUS)
                    .child(protocol(node::STATUS_CODE).attr(attr::VALUE, self.status_code.as_str())),
            )
            .child(self.assertion.to_element())
    }

    /// Serialize without an XML declaration, indented by two spaces.
    pub fn to_xml(&self) -> String {
        XmlWriter::pretty(2).write(&self.to_element())
    }
}

fn protocol(local_name: &str) -> Element {
    Element::new(format!("{}:{local_name}", urn::PROTOCOL_PREFIX))
}
