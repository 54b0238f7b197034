use serde::{Deserialize, Serialize};

/// Which Suri product contract the service writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Flat document keyed by sku, written with PUT-then-POST.
    Flat,
    /// Variant-oriented document, sku nested under `dimensions`, written with POST-then-PUT.
    Variants,
}

/// Product fields resolved from a Bling record, independent of the target contract.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalProduct {
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: f64,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatProduct {
    pub chatbot_id: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: f64,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pricing {
    pub tier: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Logistics {
    pub weight: f64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub sku: Option<String>,
    pub price: f64,
    pub stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantProduct {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub category: CategoryRef,
    pub pricing: Pricing,
    pub logistics: Logistics,
    pub active: bool,
    pub featured: bool,
    pub dimensions: Vec<Dimension>,
}

/// Document sent to the Suri API, shaped by [`SchemaVersion`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SuriProduct {
    Flat(FlatProduct),
    Variants(VariantProduct),
}

impl SuriProduct {
    pub fn schema(&self) -> SchemaVersion {
        match self {
            SuriProduct::Flat(_) => SchemaVersion::Flat,
            SuriProduct::Variants(_) => SchemaVersion::Variants,
        }
    }

    pub fn sku(&self) -> Option<&str> {
        match self {
            SuriProduct::Flat(p) => p.sku.as_deref(),
            SuriProduct::Variants(p) => p.dimensions.first().and_then(|d| d.sku.as_deref()),
        }
    }
}
