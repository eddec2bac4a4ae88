#![forbid(unsafe_code)]

//! SAML error taxonomy.

use ulriksdal_core::Error;

/// Result alias for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Errors raised while building, signing or encoding a SAML Response.
#[derive(Debug, thiserror::Error)]
pub enum SamlError {
    /// The document is missing a node the signature depends on.
    #[error("structural error: {0}")]
    Structural(String),

    /// The credential or the signature algorithms cannot produce a signature.
    #[error("signing error: {0}")]
    Signing(String),

    /// The request describes an empty or zero-length validity window, or
    /// lacks a mandatory value.
    #[error("validation error: {0}")]
    ValidationWindow(String),

    /// Any other XML processing failure.
    #[error("XML error: {0}")]
    Xml(#[source] Error),
}

impl From<Error> for SamlError {
    fn from(e: Error) -> Self {
        match e {
            Error::Key(_)
            | Error::Crypto(_)
            | Error::Certificate(_)
            | Error::UnsupportedAlgorithm(_) => SamlError::Signing(e.to_string()),
            Error::MissingElement(_)
            | Error::MissingAttribute(_)
            | Error::XmlStructure(_)
            | Error::InvalidUri(_) => SamlError::Structural(e.to_string()),
            other => SamlError::Xml(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_are_classified() {
        assert!(matches!(
            SamlError::from(Error::Key("no private key".into())),
            SamlError::Signing(_)
        ));
        assert!(matches!(
            SamlError::from(Error::UnsupportedAlgorithm("md5".into())),
            SamlError::Signing(_)
        ));
        assert!(matches!(
            SamlError::from(Error::XmlStructure("duplicate ID value: _a".into())),
            SamlError::Structural(_)
        ));
        assert!(matches!(
            SamlError::from(Error::XmlParse("eof".into())),
            SamlError::Xml(Error::XmlParse(_))
        ));
    }
}
