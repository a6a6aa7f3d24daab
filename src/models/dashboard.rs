use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_wines: i64,
    pub total_stock: i64,
    pub total_value: f64,
    pub low_stock_count: i64,
    pub out_of_stock_count: i64,
}

/// Daily stock-in / stock-out totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockTrend {
    pub date: String,
    pub stock_in: i64,
    pub stock_out: i64,
}

impl StockTrend {
    pub fn net(&self) -> i64 {
        self.stock_in - self.stock_out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockDistribution {
    pub name: String,
    pub value: i64,
}

/// `GET /dashboard/alerts`; older backends omit the out-of-stock count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub low_stock_count: i64,
    #[serde(default)]
    pub out_of_stock_count: Option<i64>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TrendQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Dimension used by `GET /dashboard/distribution/{dimension}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum DistributionDimension {
    Region,
    Variety,
}

/// Result of `POST /import/wines`. The backend reports the count as `created`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    #[serde(alias = "created")]
    pub imported: i64,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-row failures; rows listed here were skipped.
    #[serde(default)]
    pub errors: Vec<String>,
}
