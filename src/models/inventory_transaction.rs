use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a stock movement.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionType {
    In,
    Out,
}

impl TransactionType {
    /// Backend route segment under `/inventory`.
    pub fn path(&self) -> &'static str {
        match self {
            TransactionType::In => "inventory/in",
            TransactionType::Out => "inventory/out",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::In => "stock-in",
            TransactionType::Out => "stock-out",
        }
    }
}

/// Append-only record of a stock movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub wine_id: i64,
    pub transaction_type: TransactionType,
    pub quantity: i32,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub performed_by: Option<i64>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub wine_name: Option<String>,
    #[serde(default)]
    pub performer_name: Option<String>,
}

/// Typed form state for a stock movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub wine_id: i64,
    pub kind: TransactionType,
    pub quantity: i32,
    #[serde(default)]
    pub reason: String,
}

impl TransactionDraft {
    pub fn new(wine_id: i64, kind: TransactionType, quantity: i32) -> Self {
        Self {
            wine_id,
            kind,
            quantity,
            reason: String::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Request body for `POST /inventory/{in,out}`.
    pub fn to_request(&self) -> TransactionRequest {
        let reason = self.reason.trim();
        TransactionRequest {
            wine_id: self.wine_id,
            quantity: self.quantity,
            reason: if reason.is_empty() {
                None
            } else {
                Some(reason.to_string())
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub wine_id: i64,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Filters for `GET /inventory`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TransactionQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wine_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn transaction_type_round_trips_through_text() {
        assert_eq!(TransactionType::In.to_string(), "in");
        assert_eq!(TransactionType::from_str("out").unwrap(), TransactionType::Out);
        assert!(TransactionType::from_str("sideways").is_err());
        assert_eq!(TransactionType::Out.path(), "inventory/out");
    }

    #[test]
    fn request_drops_blank_reason() {
        let draft = TransactionDraft::new(4, TransactionType::In, 6).with_reason("   ");
        let body = serde_json::to_value(draft.to_request()).unwrap();
        assert_eq!(body, serde_json::json!({"wine_id": 4, "quantity": 6}));

        let draft = draft.with_reason(" restock ");
        assert_eq!(draft.to_request().reason.as_deref(), Some("restock"));
    }

    #[test]
    fn decodes_transaction() {
        let tx: InventoryTransaction = serde_json::from_value(serde_json::json!({
            "id": 1,
            "wine_id": 9,
            "transaction_type": "out",
            "quantity": 2,
            "reason": "sale",
            "performed_by": 3,
            "created_at": "2024-03-01T12:00:00.481233",
            "wine_name": "Rioja",
            "performer_name": "Admin"
        }))
        .unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Out);
        assert_eq!(tx.wine_name.as_deref(), Some("Rioja"));
    }
}
