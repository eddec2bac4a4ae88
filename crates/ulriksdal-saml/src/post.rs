#![forbid(unsafe_code)]

//! HTTP-POST binding: base64 transport encoding and the auto-submit form.

use base64::Engine;
use std::fmt;
use ulriksdal_core::Error;

use crate::error::SamlResult;

/// Base64 (standard alphabet, padded) of the UTF-8 document text.
pub fn encode(xml: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(xml.as_bytes())
}

/// Decode a `SAMLResponse` value back to document text.  Whitespace, as
/// inserted by line-wrapping transports, is ignored.
pub fn decode(value: &str) -> SamlResult<String> {
    let clean: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("SAMLResponse: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| Error::XmlParse(format!("SAMLResponse is not UTF-8: {e}")))?;
    Ok(text)
}

/// The auto-submitting HTML form that carries a Response to the Service
/// Provider's assertion consumer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostForm {
    pub action: String,
    pub saml_response: String,
    pub relay_state: Option<String>,
}

impl PostForm {
    pub fn new(action: impl Into<String>, saml_response: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            saml_response: saml_response.into(),
            relay_state: None,
        }
    }

    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    pub fn to_html(&self) -> String {
        let relay_input = self
            .relay_state
            .as_deref()
            .map(|rs| {
                format!(
                    "\n        <input type=\"hidden\" name=\"RelayState\" value=\"{}\"/>",
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8"/>
    <title>SAML SSO</title>
</head>
<body onload="document.forms[0].submit()">
    <noscript>
        <p>JavaScript is disabled. Click the button below to continue.</p>
    </noscript>
    <form method="POST" action="{}">
        <input type="hidden" name="SAMLResponse" value="{}"/>{}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>
"#,
            html_escape(&self.action),
            html_escape(&self.saml_response),
            relay_input
        )
    }
}

impl fmt::Display for PostForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
