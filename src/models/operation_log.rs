use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit log entry recorded by the backend for every mutating action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationLog {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
}

impl OperationLog {
    /// `details` is JSON text on most actions; falls back to the raw string.
    pub fn details_json(&self) -> Option<serde_json::Value> {
        let raw = self.details.as_deref()?;
        Some(
            serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.to_string())),
        )
    }
}

/// Filters for `GET /logs`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LogQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(details: Option<&str>) -> OperationLog {
        OperationLog {
            id: 1,
            user_id: Some(1),
            user_name: Some("Admin".into()),
            action_type: "login".into(),
            entity_type: None,
            entity_id: None,
            details: details.map(str::to_string),
            ip_address: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn details_parse_as_json_when_possible() {
        let parsed = log(Some(r#"{"email": "a@b.c"}"#)).details_json().unwrap();
        assert_eq!(parsed["email"], "a@b.c");

        let raw = log(Some("plain text")).details_json().unwrap();
        assert_eq!(raw, serde_json::Value::String("plain text".into()));

        assert!(log(None).details_json().is_none());
    }
}
