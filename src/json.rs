// SPDX-License-Identifier: GPL-3.0-only

//! JSON serialization matching the reference Slack export byte-for-byte.
//!
//! The export format pretty-prints with four-space indentation and applies
//! its own escaping on top of structural JSON: `<`, `>`, and `&` stay
//! literal where an HTML-safe encoder would emit the `\uXXXX` escapes,
//! while every `/` is escaped as `\/`. [`to_export_json`] produces those
//! bytes regardless of what the underlying encoder's defaults are: any
//! HTML-style escapes are rewritten back to literals, then slashes are
//! escaped.
//!
//! The result is still standard JSON — `\/` is a legal escape for `/` — so
//! any parser reads the original text values back unchanged.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Serializes a value into the Slack export's JSON dialect.
///
/// # Errors
///
/// Returns the underlying `serde_json` error when the value cannot be
/// serialized.
///
/// # Example
///
/// ```
/// use slackdump::json::to_export_json;
///
/// let bytes = to_export_json(&vec!["a/b <c> & d"]).unwrap();
/// let text = String::from_utf8(bytes).unwrap();
/// assert!(text.contains(r"a\/b <c> & d"));
/// ```
pub fn to_export_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(apply_export_escaping(&buf))
}

/// Rewrites encoder-escaped `<`, `>`, `&` back to their literal bytes, then
/// escapes every literal `/`.
fn apply_export_escaping(bytes: &[u8]) -> Vec<u8> {
    let unescaped = replace_all(bytes, b"\\u003c", b"<");
    let unescaped = replace_all(&unescaped, b"\\u003e", b">");
    let unescaped = replace_all(&unescaped, b"\\u0026", b"&");
    replace_all(&unescaped, b"/", b"\\/")
}

fn replace_all(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(position) = rest.windows(needle.len()).position(|window| window == needle) {
        out.extend_from_slice(&rest[..position]);
        out.extend_from_slice(replacement);
        rest = &rest[position + needle.len()..];
    }
    out.extend_from_slice(rest);
    out
}
