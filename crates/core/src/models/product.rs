//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, ProductStatus};

/// A product from `/products`, `/products/{id}` or `/admin/products`.
///
/// `tags` and `programs` are comma-joined strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub programs: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub sales: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub fn status(&self) -> ProductStatus {
        ProductStatus::from_raw(self.status.as_deref())
    }

    #[must_use]
    pub fn program_list(&self) -> Vec<&str> {
        split_list(self.programs.as_deref())
    }

    #[must_use]
    pub fn tag_list(&self) -> Vec<&str> {
        split_list(self.tags.as_deref())
    }
}

/// The product fields embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
}

/// Body for `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Price,
    pub tags: Option<String>,
    pub programs: Option<String>,
    pub file_type: Option<String>,
    pub image: Option<String>,
    pub status: ProductStatus,
}

impl ProductPayload {
    /// Join selected programs the way the backend stores them, `None` when
    /// nothing is selected.
    #[must_use]
    pub fn join_programs(programs: &[String]) -> Option<String> {
        let joined = programs
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        (!joined.is_empty()).then_some(joined)
    }
}

/// Split a comma-joined list, trimming entries and dropping blanks.
#[must_use]
pub fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Product {
        serde_json::from_str(
            r#"{
                "id": 1,
                "name": "Dark UI Kit",
                "price": 49.0,
                "programs": "Figma, Sketch,,",
                "tags": "Dark,Minimal",
                "status": null
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_fields_default() {
        let product = sample();
        assert!(product.description.is_none());
        assert!(product.rating.is_none());
        assert_eq!(product.status(), ProductStatus::Active);
    }

    #[test]
    fn test_lists() {
        let product = sample();
        assert_eq!(product.program_list(), vec!["Figma", "Sketch"]);
        assert_eq!(product.tag_list(), vec!["Dark", "Minimal"]);
    }

    #[test]
    fn test_join_programs() {
        let programs = vec!["Figma".to_string(), " Blender ".to_string()];
        assert_eq!(
            ProductPayload::join_programs(&programs).as_deref(),
            Some("Figma,Blender")
        );
        assert_eq!(ProductPayload::join_programs(&[]), None);
    }

    #[test]
    fn test_payload_serializes_status_lowercase() {
        let payload = ProductPayload {
            name: "Icons".to_string(),
            description: None,
            category: Some("Icon Sets".to_string()),
            price: Price::from_cents(1900),
            tags: None,
            programs: None,
            file_type: Some(".fig".to_string()),
            image: None,
            status: ProductStatus::Active,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["status"], "active");
        assert!(json["description"].is_null());
        assert!(json["price"].is_number());
    }
}
