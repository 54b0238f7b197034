//! Bling record → Suri product document.
//!
//! Source fields are resolved through one table of candidate keys; the target
//! contract then decides where each resolved field lands.

use serde_json::{Map, Value};

use crate::common::value::{as_text, coerce_number, truthy, truthy_field};
use crate::config::Config;
use crate::model::product::{
    CategoryRef, Dimension, FlatProduct, Logistics, Pricing, VariantProduct,
};
use crate::model::{CanonicalProduct, SchemaVersion, SuriProduct};

pub const DEFAULT_PRICING_TIER: &str = "default";
pub const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Sku,
    Name,
    Description,
    Price,
    Stock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Number where the first `,` is a decimal separator.
    Decimal,
    Quantity,
}

impl Field {
    pub const fn kind(self) -> FieldKind {
        match self {
            Field::Sku | Field::Name | Field::Description => FieldKind::Text,
            Field::Price => FieldKind::Decimal,
            Field::Stock => FieldKind::Quantity,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: Field,
    pub sources: &'static [&'static str],
}

/// Candidate Bling keys per field, in priority order. The first truthy one wins.
pub const BLING_FIELDS: &[FieldRule] = &[
    FieldRule {
        field: Field::Sku,
        sources: &["codigo", "sku", "id"],
    },
    FieldRule {
        field: Field::Name,
        sources: &["descricao", "nome", "name"],
    },
    FieldRule {
        field: Field::Description,
        sources: &["descricaoDetalhada", "descricao", "descricaoCurta", "informacoesAdicionais"],
    },
    FieldRule {
        field: Field::Price,
        sources: &["preco", "precoVenda", "preco_venda", "valor"],
    },
    FieldRule {
        field: Field::Stock,
        sources: &["estoque", "quantidade", "qtd", "stock"],
    },
];

impl FieldRule {
    fn text(&self, record: &Map<String, Value>) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|key| truthy_field(record, key))
            .find_map(as_text)
    }

    fn number(&self, record: &Map<String, Value>) -> f64 {
        self.sources
            .iter()
            .find_map(|key| truthy_field(record, key))
            .map_or(0.0, |v| coerce_number(v, self.field.kind() == FieldKind::Decimal))
    }
}

/// Applies `rules` to a record. Unmatched text becomes `""`, unmatched numbers `0`.
pub fn canonicalize(record: &Map<String, Value>, rules: &[FieldRule]) -> CanonicalProduct {
    let mut product = CanonicalProduct {
        images: collect_images(record),
        ..Default::default()
    };
    for rule in rules {
        match rule.field {
            Field::Sku => product.sku = rule.text(record),
            Field::Name => product.name = rule.text(record).unwrap_or_default(),
            Field::Description => product.description = rule.text(record).unwrap_or_default(),
            Field::Price => product.price = rule.number(record),
            Field::Stock => product.stock = rule.number(record),
        }
    }
    product
}

/// Image URLs from every shape Bling uses, falsy entries dropped, first occurrence kept.
pub fn collect_images(record: &Map<String, Value>) -> Vec<String> {
    let mut found: Vec<&Value> = Vec::new();

    match record.get("imagens") {
        Some(Value::Object(container)) => {
            if let Some(imagem) = truthy_field(container, "imagem") {
                let items: Vec<&Value> = match imagem {
                    Value::Array(items) => items.iter().collect(),
                    single => vec![single],
                };
                found.extend(items.into_iter().filter_map(image_link));
            }
        }
        Some(Value::Array(items)) => found.extend(items.iter().filter_map(image_link)),
        Some(s @ Value::String(_)) => found.push(s),
        _ => {}
    }

    for key in ["urlImagem", "imagemURL"] {
        if let Some(url) = truthy_field(record, key) {
            found.push(url);
        }
    }

    if let Some(Value::Array(fotos)) = record.get("fotos") {
        found.extend(fotos.iter().filter_map(|f| {
            f.as_object()
                .and_then(|f| truthy_field(f, "url").or_else(|| truthy_field(f, "link")))
        }));
    }

    let mut images: Vec<String> = Vec::new();
    for url in found.into_iter().filter(|v| truthy(v)).filter_map(as_text) {
        if !images.contains(&url) {
            images.push(url);
        }
    }
    images
}

fn image_link(item: &Value) -> Option<&Value> {
    match item {
        Value::Object(fields) => truthy_field(fields, "url").or_else(|| truthy_field(fields, "link")),
        Value::String(_) => Some(item),
        _ => None,
    }
}

/// Places canonical fields into the configured Suri contract.
pub fn to_suri(product: CanonicalProduct, cnf: &Config) -> SuriProduct {
    match cnf.suri_schema {
        SchemaVersion::Flat => SuriProduct::Flat(FlatProduct {
            chatbot_id: cnf.chatbot_id().map(str::to_string),
            sku: product.sku,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            images: product.images,
        }),
        SchemaVersion::Variants => SuriProduct::Variants(VariantProduct {
            name: product.name,
            description: product.description,
            images: product.images,
            category: CategoryRef {
                id: cnf.suri_category_id.clone(),
            },
            pricing: Pricing {
                tier: DEFAULT_PRICING_TIER.to_string(),
                currency: DEFAULT_CURRENCY.to_string(),
            },
            logistics: Logistics::default(),
            active: true,
            featured: false,
            dimensions: vec![Dimension {
                sku: product.sku,
                price: product.price,
                stock: product.stock,
            }],
        }),
    }
}

#[tracing::instrument(level = "debug", skip_all)]
pub fn map_bling_to_suri(record: &Map<String, Value>, cnf: &Config) -> SuriProduct {
    let mapped = to_suri(canonicalize(record, BLING_FIELDS), cnf);
    tracing::debug!("mapped product: {mapped:?}");
    mapped
}
