//! Projection of a single stock movement before it is submitted.
//!
//! The projection is advisory: the backend remains the source of truth and
//! callers reconcile with the refetched wine after any successful movement.

use serde::Serialize;

use crate::models::TransactionType;
use crate::services::alerts::{classify, AlertLevel};

/// Why a movement cannot be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockViolation {
    #[error("Quantity must be greater than 0")]
    NonPositiveQuantity,
    #[error("Insufficient stock. Current stock: {current_stock}")]
    InsufficientStock { current_stock: i32 },
}

/// Outcome of [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StockProjection {
    pub projected_stock: i64,
    pub is_valid: bool,
    pub violation: Option<StockViolation>,
    pub will_be_out_of_stock: bool,
    pub will_be_below_threshold: bool,
    #[serde(skip)]
    low_stock_threshold: i32,
}

impl StockProjection {
    /// Aggregate alert level the wine would land in after the movement.
    ///
    /// This reads the projected stock with the dashboard's `<= threshold`
    /// rule, so it can report `Low` while `will_be_below_threshold` is false
    /// (projected stock exactly at the threshold).
    pub fn projected_level(&self) -> AlertLevel {
        let stock = self.projected_stock.clamp(0, i64::from(i32::MAX)) as i32;
        classify(stock, self.low_stock_threshold)
    }

    /// Whether the preview should carry a warning line.
    pub fn needs_warning(&self) -> bool {
        self.is_valid && (self.will_be_out_of_stock || self.will_be_below_threshold)
    }
}

/// Projects the effect of moving `quantity` bottles in direction `kind`.
pub fn evaluate(
    current_stock: i32,
    low_stock_threshold: i32,
    kind: TransactionType,
    quantity: i32,
) -> StockProjection {
    let current = i64::from(current_stock);
    let delta = i64::from(quantity);
    let projected_stock = match kind {
        TransactionType::In => current + delta,
        TransactionType::Out => current - delta,
    };

    let violation = if quantity <= 0 {
        Some(StockViolation::NonPositiveQuantity)
    } else if kind == TransactionType::Out && quantity > current_stock {
        Some(StockViolation::InsufficientStock { current_stock })
    } else {
        None
    };

    StockProjection {
        projected_stock,
        is_valid: violation.is_none(),
        violation,
        will_be_out_of_stock: projected_stock == 0,
        will_be_below_threshold: projected_stock > 0
            && projected_stock < i64::from(low_stock_threshold),
        low_stock_threshold,
    }
}
