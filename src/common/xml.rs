//! XML to JSON tree conversion for legacy Bling payloads.
//!
//! Attributes are merged into the element's own fields, a leaf element becomes
//! its text, and a child name turns into a sequence only when it repeats.
//! Leaf text is trimmed, so `<codigo> A1 </codigo>` reads as `"A1"`.

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use crate::model::error::SyncError;

/// Key holding an element's text when it also has attributes or children.
pub const TEXT_KEY: &str = "_";

struct Element {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart, decoder: Decoder) -> Result<Self, SyncError> {
        let name = decode(decoder, start.name().as_ref())?;
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SyncError::Xml(e.to_string()))?;
            let key = decode(decoder, attr.key.as_ref())?;
            let raw = decode(decoder, &attr.value)?;
            let value = unescape(&raw)
                .map_err(|e| SyncError::Xml(e.to_string()))?
                .into_owned();
            insert_field(&mut fields, key, Value::String(value));
        }
        Ok(Self {
            name,
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let Element {
            name,
            mut fields,
            text,
        } = self;
        if fields.is_empty() {
            return (name, Value::String(text));
        }
        if !text.is_empty() {
            insert_field(&mut fields, TEXT_KEY.to_string(), Value::String(text));
        }
        (name, Value::Object(fields))
    }
}

fn decode(decoder: Decoder, bytes: &[u8]) -> Result<String, SyncError> {
    decoder
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| SyncError::Xml(e.to_string()))
}

/// Adds a field, turning a repeated key into a sequence.
fn insert_field(fields: &mut Map<String, Value>, key: String, value: Value) {
    match fields.get_mut(&key) {
        None => {
            fields.insert(key, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Parses a document, honouring the charset named in its `<?xml encoding=...?>` declaration.
pub fn parse_xml(xml: &[u8]) -> Result<Value, SyncError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| SyncError::Xml(format!("at position {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(ref e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(SyncError::Xml("more than one root element".to_string()));
                }
                stack.push(Element::open(e, reader.decoder())?);
            }
            Event::Empty(ref e) => {
                let element = Element::open(e, reader.decoder())?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| SyncError::Xml("closing tag without opening tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|e| SyncError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(SyncError::Xml("text outside of root element".to_string())),
                }
            }
            Event::CData(e) => {
                let text = decode(reader.decoder(), &e)?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(&text),
                    None => return Err(SyncError::Xml("cdata outside of root element".to_string())),
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(SyncError::Xml(format!("unclosed element <{}>", open.name)));
    }
    let (name, value) = root.ok_or_else(|| SyncError::Xml("document has no root element".to_string()))?;
    let mut tree = Map::new();
    tree.insert(name, value);
    Ok(Value::Object(tree))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<(String, Value)>,
    element: Element,
) -> Result<(), SyncError> {
    let (name, value) = element.close();
    match stack.last_mut() {
        Some(parent) => {
            insert_field(&mut parent.fields, name, value);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some((name, value));
            Ok(())
        }
        None => Err(SyncError::Xml("more than one root element".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn leaf_elements_become_strings() {
        let tree = parse_xml(
            b"<?xml version=\"1.0\"?><retorno><produtos><produto><codigo>ABC1</codigo>\
             <preco>9,99</preco></produto></produtos></retorno>",
        )
        .unwrap();
        assert_eq!(
            tree,
            json!({"retorno": {"produtos": {"produto": {"codigo": "ABC1", "preco": "9,99"}}}})
        );
    }

    #[test]
    fn repeated_children_become_sequences() {
        let tree = parse_xml(
            b"<imagens><imagem><link>a.png</link></imagem><imagem><link>b.png</link></imagem></imagens>",
        )
        .unwrap();
        assert_eq!(
            tree,
            json!({"imagens": {"imagem": [{"link": "a.png"}, {"link": "b.png"}]}})
        );
    }

    #[test]
    fn attributes_merge_into_fields() {
        let tree = parse_xml(br#"<produto id="7" tipo="P">Widget</produto>"#).unwrap();
        assert_eq!(
            tree,
            json!({"produto": {"id": "7", "tipo": "P", "_": "Widget"}})
        );
    }

    #[test]
    fn empty_elements_and_entities() {
        let tree = parse_xml(b"<p><a/><b>x &amp; y</b><c><![CDATA[<i>raw</i>]]></c></p>").unwrap();
        assert_eq!(tree, json!({"p": {"a": "", "b": "x & y", "c": "<i>raw</i>"}}));
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(parse_xml(b"<a><b></a>").is_err());
        assert!(parse_xml(b"<a>").is_err());
        assert!(parse_xml(b"<a/><b/>").is_err());
        assert!(parse_xml(b"").is_err());
        assert!(parse_xml(b"<a></a>trailing").is_err());
    }

    #[test]
    fn leaf_text_is_trimmed() {
        let tree = parse_xml(b"<produto><codigo> A1 </codigo><nome>\n  Caneca azul\n</nome></produto>").unwrap();
        assert_eq!(tree, json!({"produto": {"codigo": "A1", "nome": "Caneca azul"}}));
    }
}
