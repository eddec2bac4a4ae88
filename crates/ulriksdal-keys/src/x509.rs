#![forbid(unsafe_code)]

//! X.509 certificate metadata.
//!
//! Choosing and trusting a certificate is the caller's policy; this module
//! only reports what a certificate says about itself so that signing can
//! flag a credential outside its validity window.

use chrono::{DateTime, Utc};
use der::Decode;
use ulriksdal_core::Error;
use x509_cert::Certificate;

/// Descriptive fields of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Subject distinguished name (RFC 4514 form).
    pub subject: String,
    /// Issuer distinguished name (RFC 4514 form).
    pub issuer: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        let tbs = &cert.tbs_certificate;
        Ok(Self {
            subject: tbs.subject.to_string(),
            issuer: tbs.issuer.to_string(),
            serial: tbs
                .serial_number
                .as_bytes()
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(":"),
            not_before: to_datetime(tbs.validity.not_before)?,
            not_after: to_datetime(tbs.validity.not_after)?,
        })
    }

    /// Whether `at` falls inside `[not_before, not_after]`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

fn to_datetime(t: x509_cert::time::Time) -> Result<DateTime<Utc>, Error> {
    let secs = i64::try_from(t.to_unix_duration().as_secs())
        .map_err(|_| Error::Certificate("certificate time out of range".into()))?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Certificate("certificate time out of range".into()))
}

/// Parse `der` and log a warning if the certificate is not valid at `now`.
pub fn check_validity(der: &[u8], now: DateTime<Utc>) -> Result<CertificateInfo, Error> {
    let info = CertificateInfo::from_der(der)?;
    if !info.is_valid_at(now) {
        tracing::warn!(
            subject = %info.subject,
            not_before = %info.not_before,
            not_after = %info.not_after,
            "signing certificate is outside its validity window"
        );
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn idp_cert() -> Vec<u8> {
        let pem = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/idp-cert.pem"));
        crate::loader::load_x509_cert_pem(pem).unwrap().x509_chain.remove(0)
    }

    #[test]
    fn reads_subject_and_validity() {
        let info = CertificateInfo::from_der(&idp_cert()).unwrap();
        assert!(info.subject.contains("CN=idp.example.com"));
        assert_eq!(info.subject, info.issuer);
        assert!(info.not_before < info.not_after);
        assert!(!info.serial.is_empty());
    }

    #[test]
    fn validity_window() {
        let info = CertificateInfo::from_der(&idp_cert()).unwrap();
        let long_ago = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();
        assert!(!info.is_valid_at(long_ago));
        assert!(info.is_valid_at(info.not_before));
        assert!(info.is_valid_at(info.not_after));
        // An out-of-window certificate is reported, not rejected.
        assert!(check_validity(&idp_cert(), long_ago).is_ok());
    }

    #[test]
    fn garbage_is_a_certificate_error() {
        assert!(matches!(
            CertificateInfo::from_der(b"not a certificate"),
            Err(Error::Certificate(_))
        ));
    }
}
