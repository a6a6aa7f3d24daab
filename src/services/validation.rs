//! Client-side form validation for wines and stock movements.
//!
//! Every rule is evaluated; callers get the full set of field messages in
//! one pass. A non-empty [`FieldErrors`] never reaches the network layer.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::ServiceError;
use crate::models::{TransactionDraft, TransactionType, WineDraft, WinePatch};

/// Oldest vintage the catalog accepts.
pub const MIN_VINTAGE_YEAR: i32 = 1800;

/// Field name to message, in field-name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(field, message);
        }
    }

    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);
        for (field, list) in fields {
            if let Some(error) = list.first() {
                out.insert(field, describe(field, error));
            }
        }
        out
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    if error.code == "blank" || error.code == "required" {
        return format!("{} is required", humanize(field));
    }
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{} is invalid ({})", humanize(field), error.code),
    }
}

fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_decimal_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("negative");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

fn check_vintage(year: i32, current_year: i32, errors: &mut FieldErrors) {
    let max = current_year + 1;
    if !(MIN_VINTAGE_YEAR..=max).contains(&year) {
        errors.insert(
            "vintage_year",
            format!("Vintage year must be between {MIN_VINTAGE_YEAR} and {max}"),
        );
    }
}

/// Validates a create/edit form against the wall-clock year.
pub fn validate_wine(draft: &WineDraft) -> FieldErrors {
    validate_wine_at(draft, current_year())
}

pub fn validate_wine_at(draft: &WineDraft, current_year: i32) -> FieldErrors {
    let mut errors = match draft.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    };
    if let Some(year) = draft.vintage_year {
        check_vintage(year, current_year, &mut errors);
    }
    errors
}

/// Same rules as [`validate_wine`], applied only to the fields present.
pub fn validate_wine_patch(patch: &WinePatch) -> FieldErrors {
    validate_wine_patch_at(patch, current_year())
}

pub fn validate_wine_patch_at(patch: &WinePatch, current_year: i32) -> FieldErrors {
    let mut errors = match patch.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    };
    if let Some(year) = patch.vintage_year {
        check_vintage(year, current_year, &mut errors);
    }
    errors
}

/// Rules for stock movement forms that vary by deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPolicy {
    pub require_reason: bool,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self {
            require_reason: true,
        }
    }
}

pub fn validate_transaction(
    draft: &TransactionDraft,
    current_stock: i32,
    policy: &TransactionPolicy,
) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if draft.quantity <= 0 {
        errors.insert("quantity", "Quantity must be greater than 0");
    } else if draft.kind == TransactionType::Out && draft.quantity > current_stock {
        errors.insert(
            "quantity",
            format!("Stock-out quantity cannot exceed current stock ({current_stock})"),
        );
    }
    if policy.require_reason && draft.reason.trim().is_empty() {
        errors.insert("reason", "Reason is required");
    }
    errors
}
