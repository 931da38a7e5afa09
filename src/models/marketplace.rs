use serde::{Deserialize, Serialize};

use super::PersonaVector;

/// A seller with their behavioral persona and track record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub seller_id: String,
    pub seller_name: String,
    pub persona_vector: PersonaVector,
    pub total_sales: u32,
    /// Average rating on a 0-5 scale
    pub avg_rating: f64,
    pub response_time_hours: f64,
}

/// A listing offered by a seller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub seller_id: String,
    pub title: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub view_count: u32,
    #[serde(default)]
    pub like_count: u32,
}

/// Condition tier of a listing, parsed from its free-form label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    New,
    LikeNew,
    Used,
    Worn,
    Unknown,
}

impl ProductCondition {
    /// Accepts English labels as well as the marketplace's Korean labels
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "new" | "새상품" => ProductCondition::New,
            "like-new" | "like_new" | "like new" | "거의새것" => ProductCondition::LikeNew,
            "used" | "중고" => ProductCondition::Used,
            "worn" | "사용감있음" => ProductCondition::Worn,
            _ => ProductCondition::Unknown,
        }
    }
}

/// Optional narrowing applied when fetching products
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ProductFilters {
    /// Checks a product against every filter that is set
    ///
    /// Category must match exactly; location matches on substring.
    pub fn matches(&self, product: &Product) -> bool {
        if self.price_min.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !product.location.contains(location.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.price_min.is_none()
            && self.price_max.is_none()
            && self.category.is_none()
            && self.location.is_none()
    }
}

/// Read-only sellers and products fetched for a single request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceSnapshot {
    pub sellers: Vec<Seller>,
    pub products: Vec<Product>,
}
