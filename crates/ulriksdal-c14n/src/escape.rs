#![forbid(unsafe_code)]

//! Character escaping for canonical output.
//!
//! Text nodes escape `&`, `<`, `>` and carriage return.  Attribute values
//! escape `&`, `<`, `"` and the whitespace characters tab, newline and
//! carriage return.  Processing-instruction data only escapes carriage
//! return.

#[derive(Clone, Copy)]
enum Context {
    Text,
    Attr,
    Pi,
}

fn replacement(ctx: Context, ch: char) -> Option<&'static str> {
    match (ctx, ch) {
        (_, '\r') => Some("&#xD;"),
        (Context::Pi, _) => None,
        (_, '&') => Some("&amp;"),
        (_, '<') => Some("&lt;"),
        (Context::Text, '>') => Some("&gt;"),
        (Context::Attr, '"') => Some("&quot;"),
        (Context::Attr, '\t') => Some("&#x9;"),
        (Context::Attr, '\n') => Some("&#xA;"),
        _ => None,
    }
}

fn escape(ctx: Context, s: &str, out: &mut Vec<u8>) {
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        if let Some(rep) = replacement(ctx, ch) {
            out.extend_from_slice(s[start..i].as_bytes());
            out.extend_from_slice(rep.as_bytes());
            start = i + ch.len_utf8();
        }
    }
    out.extend_from_slice(s[start..].as_bytes());
}

/// Append canonical text-node content to `out`.
pub fn text_into(s: &str, out: &mut Vec<u8>) {
    escape(Context::Text, s, out);
}

/// Append a canonical attribute value to `out`.
pub fn attr_into(s: &str, out: &mut Vec<u8>) {
    escape(Context::Attr, s, out);
}

/// Append canonical processing-instruction data to `out`.
pub fn pi_into(s: &str, out: &mut Vec<u8>) {
    escape(Context::Pi, s, out);
}
