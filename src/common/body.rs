use axum::body::Bytes;
use data_encoding::BASE64;

use crate::common::xml::parse_xml;
use crate::model::error::SyncError;
use crate::model::{BodyFormat, InboundEnvelope, ParsedBody};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Undoes base64 transport encoding when the envelope says it was applied.
pub fn decode_transport(envelope: &InboundEnvelope) -> Result<Bytes, SyncError> {
    if !envelope.base64_encoded {
        return Ok(envelope.body.clone());
    }
    let compact: Vec<u8> = envelope
        .body
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = BASE64
        .decode(&compact)
        .map_err(|e| SyncError::MalformedBody(format!("invalid base64 body: {e}")))?;
    Ok(Bytes::from(bytes))
}

/// Drops leading whitespace and byte-order marks.
fn trim_leading(mut bytes: &[u8]) -> &[u8] {
    loop {
        if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
            bytes = rest;
        } else if let [first, rest @ ..] = bytes
            && first.is_ascii_whitespace()
        {
            bytes = rest;
        } else {
            return bytes;
        }
    }
}

/// Decodes and classifies the body; unparseable JSON falls back to text, bad XML fails.
///
/// XML is decoded with the charset its declaration names. Anything else must be UTF-8.
pub fn parse_body(envelope: &InboundEnvelope) -> Result<ParsedBody, SyncError> {
    let bytes = decode_transport(envelope)?;
    let content = trim_leading(&bytes);

    if envelope.content_type().to_ascii_lowercase().contains("xml") || content.starts_with(b"<") {
        let parsed = parse_xml(content)?;
        return Ok(ParsedBody {
            format: BodyFormat::Xml,
            parsed,
            raw: String::from_utf8_lossy(content).into_owned(),
        });
    }

    let text = std::str::from_utf8(content)
        .map_err(|e| SyncError::MalformedBody(format!("body is not valid utf-8: {e}")))?
        .to_string();
    match serde_json::from_str(&text) {
        Ok(parsed) => Ok(ParsedBody {
            format: BodyFormat::Json,
            parsed,
            raw: text,
        }),
        Err(e) => {
            tracing::debug!("body is not json, treating as text: {e}");
            Ok(ParsedBody {
                format: BodyFormat::Text,
                parsed: serde_json::Value::String(text.clone()),
                raw: text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn envelope(content_type: &str, body: &str, base64_encoded: bool) -> InboundEnvelope {
        let mut headers = http::HeaderMap::new();
        if !content_type.is_empty() {
            headers.insert(http::header::CONTENT_TYPE, content_type.parse().unwrap());
        }
        InboundEnvelope {
            method: http::Method::POST,
            headers,
            queries: HashMap::new(),
            base64_encoded,
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    #[test]
    fn classifies_json() {
        let parsed = parse_body(&envelope("application/json", r#"{"data":{"id":1}}"#, false)).unwrap();
        assert_eq!(parsed.format, BodyFormat::Json);
        assert_eq!(parsed.parsed, json!({"data": {"id": 1}}));
    }

    #[test]
    fn sniffs_xml_without_content_type() {
        let parsed = parse_body(&envelope("", "  <produto><codigo>X</codigo></produto>", false)).unwrap();
        assert_eq!(parsed.format, BodyFormat::Xml);
        assert_eq!(parsed.parsed, json!({"produto": {"codigo": "X"}}));
    }

    #[test]
    fn xml_content_type_forces_xml_parse() {
        let err = parse_body(&envelope("text/xml", "not xml at all", false)).unwrap_err();
        assert!(matches!(err, SyncError::Xml(_)));
    }

    #[test]
    fn broken_json_downgrades_to_text() {
        let parsed = parse_body(&envelope("application/json", "{oops", false)).unwrap();
        assert_eq!(parsed.format, BodyFormat::Text);
        assert_eq!(parsed.parsed, json!("{oops"));
        assert_eq!(parsed.raw, "{oops");
    }

    #[test]
    fn decodes_base64_transport() {
        let encoded = BASE64.encode(br#"{"produto":{"codigo":"B64"}}"#);
        let parsed = parse_body(&envelope("application/json", &encoded, true)).unwrap();
        assert_eq!(parsed.format, BodyFormat::Json);
        assert_eq!(parsed.parsed["produto"]["codigo"], "B64");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = parse_body(&envelope("application/json", "***", true)).unwrap_err();
        assert!(matches!(err, SyncError::MalformedBody(_)));
    }

    #[test]
    fn byte_order_mark_does_not_hide_xml() {
        let parsed = parse_body(&envelope(
            "application/octet-stream",
            "\u{feff}<produto><codigo>A1</codigo></produto>",
            false,
        ))
        .unwrap();
        assert_eq!(parsed.format, BodyFormat::Xml);
        assert_eq!(parsed.parsed, json!({"produto": {"codigo": "A1"}}));
    }

    #[test]
    fn latin1_xml_follows_its_declaration() {
        let mut env = envelope("application/xml", "", false);
        env.body = Bytes::from_static(
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><produto><descricao>Caf\xe9</descricao></produto>",
        );
        let parsed = parse_body(&env).unwrap();
        assert_eq!(parsed.parsed, json!({"produto": {"descricao": "Caf\u{e9}"}}));
    }

    #[test]
    fn non_utf8_json_is_malformed() {
        let mut env = envelope("application/json", "", false);
        env.body = Bytes::from_static(b"{\"nome\": \"Caf\xe9\"}");
        let err = parse_body(&env).unwrap_err();
        assert!(matches!(err, SyncError::MalformedBody(_)));
    }
}
