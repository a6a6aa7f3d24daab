use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::validation::{validate_decimal_non_negative, validate_not_blank};

/// Backend default for `low_stock_threshold` when a wine is created without one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

/// A catalog entry as returned by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    pub id: i64,
    pub name: String,
    pub vintage_year: i32,
    pub region: String,
    #[serde(default)]
    pub grape_variety: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    pub current_stock: i32,
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_low_stock_threshold() -> i32 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Wine {
    /// Stock value at list price; wines without a price count as zero.
    pub fn stock_value(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO) * Decimal::from(self.current_stock)
    }

    /// Draft pre-filled with this wine's values, used by edit forms.
    pub fn to_draft(&self) -> WineDraft {
        WineDraft {
            name: self.name.clone(),
            vintage_year: Some(self.vintage_year),
            region: self.region.clone(),
            grape_variety: self.grape_variety.clone(),
            price: self.price,
            supplier: self.supplier.clone(),
            storage_location: self.storage_location.clone(),
            current_stock: Some(self.current_stock),
            low_stock_threshold: Some(self.low_stock_threshold),
            notes: self.notes.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Typed form state for creating a wine (or replacing all editable fields).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct WineDraft {
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(required)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage_year: Option<i32>,
    #[validate(custom = "validate_not_blank")]
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grape_variety: Option<String>,
    #[validate(custom = "validate_decimal_non_negative")]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<i32>,
    #[validate(range(min = 0, message = "Low stock threshold cannot be negative"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl WineDraft {
    pub fn new(name: impl Into<String>, region: impl Into<String>, vintage_year: i32) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            vintage_year: Some(vintage_year),
            ..Default::default()
        }
    }

    /// Trims free-text fields and drops the ones left empty.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.region = self.region.trim().to_string();
        self.grape_variety = normalize_optional_string(self.grape_variety);
        self.supplier = normalize_optional_string(self.supplier);
        self.storage_location = normalize_optional_string(self.storage_location);
        self.notes = normalize_optional_string(self.notes);
        self.image_url = normalize_optional_string(self.image_url);
        self
    }
}

/// Partial update; only the fields that are set are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct WinePatch {
    #[validate(custom = "validate_not_blank")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage_year: Option<i32>,
    #[validate(custom = "validate_not_blank")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grape_variety: Option<String>,
    #[validate(custom = "validate_decimal_non_negative")]
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<i32>,
    #[validate(range(min = 0, message = "Low stock threshold cannot be negative"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl WinePatch {
    pub fn is_empty(&self) -> bool {
        self == &WinePatch::default()
    }
}

impl From<WineDraft> for WinePatch {
    fn from(draft: WineDraft) -> Self {
        Self {
            name: Some(draft.name),
            vintage_year: draft.vintage_year,
            region: Some(draft.region),
            grape_variety: draft.grape_variety,
            price: draft.price,
            supplier: draft.supplier,
            storage_location: draft.storage_location,
            current_stock: draft.current_stock,
            low_stock_threshold: draft.low_stock_threshold,
            notes: draft.notes,
            image_url: draft.image_url,
        }
    }
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// Filters and ordering for `GET /wines`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct WineQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grape_variety: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vintage_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<super::StockStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<super::SortOrder>,
}
