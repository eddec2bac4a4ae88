#![forbid(unsafe_code)]

//! Signed SAML 2.0 Responses for IdP → SP single sign-on.
//!
//! [`create_saml_response`] validates an [`SsoRequest`], builds the
//! assertion, wraps it in a Response, signs the assertion with an enveloped
//! XML signature and returns the base64 value of the `SAMLResponse` form
//! field.

pub mod assertion;
pub mod error;
pub mod id;
pub mod post;
pub mod response;
pub mod signer;
pub mod urn;

pub use assertion::{Assertion, AssertionBuilder, AttributeMap};
pub use error::{SamlError, SamlResult};
pub use post::PostForm;
pub use response::Response;

use ulriksdal_dsig::DsigContext;
use ulriksdal_keys::Key;

/// Assertion lifetime used when none is given.
pub const DEFAULT_EXPIRATION_MINUTES: u32 = 5;

/// The values of one SSO handoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoRequest {
    /// Entity ID of the Identity Provider.
    pub issuer: String,
    /// Lifetime of the assertion, in minutes.
    pub expiration_minutes: u32,
    /// Entity ID of the Service Provider.
    pub audience: String,
    /// NameID of the authenticated principal.
    pub subject: String,
    /// Assertion consumer service URL.
    pub recipient: String,
    pub attributes: AttributeMap,
}

impl SsoRequest {
    pub fn new(issuer: &str, audience: &str, subject: &str, recipient: &str) -> Self {
        Self {
            issuer: issuer.to_owned(),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            audience: audience.to_owned(),
            subject: subject.to_owned(),
            recipient: recipient.to_owned(),
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_expiration_minutes(mut self, minutes: u32) -> Self {
        self.expiration_minutes = minutes;
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Reject requests that cannot produce a usable assertion: an empty
    /// mandatory value, or a zero expiration (NotOnOrAfter is exclusive, so
    /// such an assertion is expired when issued).
    pub fn validate(&self) -> SamlResult<()> {
        let fields = [
            ("issuer", &self.issuer),
            ("audience", &self.audience),
            ("subject", &self.subject),
            ("recipient", &self.recipient),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(SamlError::ValidationWindow(format!("{name} is empty")));
        }
        if self.expiration_minutes == 0 {
            return Err(SamlError::ValidationWindow(
                "expiration must be at least one minute".into(),
            ));
        }
        Ok(())
    }

    /// A builder preloaded with this request's values.
    pub fn assertion_builder(&self) -> AssertionBuilder {
        AssertionBuilder::new(&self.issuer, &self.subject)
            .audience(&self.audience)
            .recipient(&self.recipient)
            .expiration_minutes(self.expiration_minutes)
            .attributes(self.attributes.clone())
    }
}

/// Build, sign and encode a Response with the default signing context.
pub fn create_saml_response(request: &SsoRequest, credential: &Key) -> SamlResult<String> {
    create_saml_response_with(&DsigContext::default(), request, credential)
}

/// Build, sign and encode a Response.
pub fn create_saml_response_with(
    ctx: &DsigContext,
    request: &SsoRequest,
    credential: &Key,
) -> SamlResult<String> {
    let xml = signed_response_xml(ctx, request, credential)?;
    Ok(post::encode(&xml))
}

/// Build and sign a Response, returning the signed document text.
pub fn signed_response_xml(
    ctx: &DsigContext,
    request: &SsoRequest,
    credential: &Key,
) -> SamlResult<String> {
    request.validate()?;
    let response = Response::wrap(request.assertion_builder().build());
    let signed = signer::sign_assertion(ctx, credential, &response.to_xml())?;
    tracing::info!(
        response_id = %response.id,
        assertion_id = %response.assertion.id,
        destination = %response.destination,
        attributes = response.assertion.attributes.len(),
        "signed SAML response"
    );
    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SsoRequest {
        SsoRequest::new(
            "https://idp.example.com",
            "https://sp.example.com",
            "alice@example.com",
            "https://sp.example.com/acs",
        )
    }

    #[test]
    fn valid_request() {
        assert!(request().validate().is_ok());
        assert_eq!(request().expiration_minutes, DEFAULT_EXPIRATION_MINUTES);
    }

    #[test]
    fn blank_values_are_rejected() {
        let mut r = request();
        r.audience = "   ".into();
        match r.validate() {
            Err(SamlError::ValidationWindow(msg)) => assert!(msg.contains("audience")),
            other => panic!("unexpected: {other:?}"),
        }
        let mut r = request();
        r.recipient.clear();
        assert!(matches!(r.validate(), Err(SamlError::ValidationWindow(_))));
    }

    #[test]
    fn zero_expiration_is_rejected() {
        assert!(matches!(
            request().with_expiration_minutes(0).validate(),
            Err(SamlError::ValidationWindow(_))
        ));
    }

    #[test]
    fn builder_carries_the_request() {
        let a = request()
            .with_attribute("role", "admin")
            .with_expiration_minutes(10)
            .assertion_builder()
            .build();
        assert_eq!(a.issuer, "https://idp.example.com");
        assert_eq!(
            a.conditions.not_on_or_after - a.conditions.not_before,
            chrono::Duration::minutes(10)
        );
        assert_eq!(a.attributes.len(), 1);
    }
}
