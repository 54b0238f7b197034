//! Locates the product record inside the payload shapes Bling has used over time.

use serde_json::{Map, Value};

use crate::common::value::{truthy_field, truthy_path};

/// Identifying fields that let a bare `data` object or envelope stand for a product.
const DATA_ID_KEYS: &[&str] = &["codigo", "id", "sku"];
const BARE_ID_KEYS: &[&str] = &["codigo", "descricao", "sku", "id"];

/// The known payload shapes, most specific first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceEnvelope<'a> {
    /// Legacy API v2 XML: `retorno.produtos.produto`, or `retorno.produtos` itself.
    Retorno(&'a Value),
    /// `{"produto": ...}`
    Produto(&'a Value),
    /// `{"resource": {"produto": ...}}`
    Resource(&'a Value),
    /// API v3 webhook: `{"event": ..., "data": {...}}`
    Data(&'a Value),
    /// The envelope is the product.
    Bare(&'a Value),
    Unrecognized,
}

impl<'a> SourceEnvelope<'a> {
    pub fn classify(parsed: &'a Value) -> Self {
        let Some(envelope) = parsed.as_object() else {
            return SourceEnvelope::Unrecognized;
        };

        if let Some(produtos) = truthy_path(parsed, &["retorno", "produtos"]) {
            let product = truthy_path(produtos, &["produto"]).unwrap_or(produtos);
            return SourceEnvelope::Retorno(product);
        }
        if let Some(product) = truthy_field(envelope, "produto") {
            return SourceEnvelope::Produto(product);
        }
        if let Some(product) = truthy_path(parsed, &["resource", "produto"]) {
            return SourceEnvelope::Resource(product);
        }
        if let Some(data) = truthy_field(envelope, "data")
            && let Some(fields) = data.as_object()
            && has_any(fields, DATA_ID_KEYS)
        {
            return SourceEnvelope::Data(data);
        }
        if has_any(envelope, BARE_ID_KEYS) {
            return SourceEnvelope::Bare(parsed);
        }
        SourceEnvelope::Unrecognized
    }

    /// The product record, or `None` when the shape holds no usable object.
    pub fn record(self) -> Option<&'a Map<String, Value>> {
        let candidate = match self {
            SourceEnvelope::Retorno(v) | SourceEnvelope::Produto(v) => first_if_sequence(v)?,
            SourceEnvelope::Resource(v) | SourceEnvelope::Data(v) | SourceEnvelope::Bare(v) => v,
            SourceEnvelope::Unrecognized => return None,
        };
        candidate.as_object()
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceEnvelope::Retorno(_) => "retorno.produtos",
            SourceEnvelope::Produto(_) => "produto",
            SourceEnvelope::Resource(_) => "resource.produto",
            SourceEnvelope::Data(_) => "data",
            SourceEnvelope::Bare(_) => "bare",
            SourceEnvelope::Unrecognized => "unrecognized",
        }
    }
}

fn has_any(fields: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| truthy_field(fields, k).is_some())
}

fn first_if_sequence(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Returns the product record carried by `parsed`, if any.
pub fn extract_product(parsed: &Value) -> Option<&Map<String, Value>> {
    let shape = SourceEnvelope::classify(parsed);
    tracing::debug!("payload shape: {}", shape.label());
    shape.record()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codigo(parsed: &Value) -> Option<&str> {
        extract_product(parsed).and_then(|p| p.get("codigo")).and_then(Value::as_str)
    }

    #[test]
    fn retorno_produtos_produto() {
        let v = json!({"retorno": {"produtos": {"produto": {"codigo": "R1"}}}});
        assert!(matches!(SourceEnvelope::classify(&v), SourceEnvelope::Retorno(_)));
        assert_eq!(codigo(&v), Some("R1"));
    }

    #[test]
    fn retorno_produtos_sequence_takes_first() {
        let v = json!({"retorno": {"produtos": [{"produto": {"codigo": "X"}}, {"codigo": "Y"}]}});
        // `.produto` is looked up on the sequence itself, so the sequence is the candidate
        assert_eq!(
            extract_product(&v).and_then(|p| p.get("produto")),
            Some(&json!({"codigo": "X"}))
        );

        let v = json!({"retorno": {"produtos": {"produto": [{"codigo": "R1"}, {"codigo": "R2"}]}}});
        assert_eq!(codigo(&v), Some("R1"));
    }

    #[test]
    fn retorno_produtos_without_produto() {
        let v = json!({"retorno": {"produtos": {"codigo": "R3"}}});
        assert_eq!(codigo(&v), Some("R3"));
    }

    #[test]
    fn produto_single_and_sequence() {
        assert_eq!(codigo(&json!({"produto": {"codigo": "P1"}})), Some("P1"));
        assert_eq!(
            codigo(&json!({"produto": [{"codigo": "P2"}, {"codigo": "P3"}]})),
            Some("P2")
        );
        assert_eq!(extract_product(&json!({"produto": []})), None);
    }

    #[test]
    fn resource_produto() {
        let v = json!({"resource": {"produto": {"codigo": "RS"}}});
        assert!(matches!(SourceEnvelope::classify(&v), SourceEnvelope::Resource(_)));
        assert_eq!(codigo(&v), Some("RS"));
    }

    #[test]
    fn data_requires_an_identifier() {
        let v = json!({"event": "product.updated", "data": {"id": 16, "nome": "Caneca"}});
        assert!(matches!(SourceEnvelope::classify(&v), SourceEnvelope::Data(_)));
        assert_eq!(extract_product(&v).and_then(|p| p.get("id")), Some(&json!(16)));

        let v = json!({"data": {"nome": "sem id"}});
        assert_eq!(SourceEnvelope::classify(&v), SourceEnvelope::Unrecognized);
        assert_eq!(extract_product(&v), None);
    }

    #[test]
    fn bare_envelope_is_the_product() {
        let v = json!({"codigo": "B1", "preco": "10"});
        assert!(matches!(SourceEnvelope::classify(&v), SourceEnvelope::Bare(_)));
        assert_eq!(codigo(&v), Some("B1"));

        let v = json!({"descricao": "only a name"});
        assert!(extract_product(&v).is_some());
    }

    #[test]
    fn nested_shapes_win_over_bare_fields() {
        let v = json!({"id": "envelope-id", "produto": {"codigo": "inner"}});
        assert_eq!(codigo(&v), Some("inner"));
    }

    #[test]
    fn unrecognized_payloads() {
        for v in [
            json!({"hello": "world"}),
            json!("plain text"),
            json!([{"codigo": "X"}]),
            json!({"retorno": {"erros": {"erro": "x"}}}),
            json!({"codigo": ""}),
        ] {
            assert_eq!(extract_product(&v), None, "{v}");
        }
    }
}
