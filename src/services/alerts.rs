//! Low-stock classification and dashboard-style aggregation.

use std::cmp::Ordering;

use serde::Serialize;

use crate::models::{StockStatus, Wine};

/// Severity of a wine's stock relative to its threshold, most severe first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertLevel {
    OutOfStock,
    Critical,
    Low,
    Normal,
}

impl AlertLevel {
    pub fn is_alert(&self) -> bool {
        *self != AlertLevel::Normal
    }
}

impl From<AlertLevel> for StockStatus {
    fn from(level: AlertLevel) -> Self {
        match level {
            AlertLevel::OutOfStock => StockStatus::Out,
            AlertLevel::Critical | AlertLevel::Low => StockStatus::Low,
            AlertLevel::Normal => StockStatus::Normal,
        }
    }
}

/// Classifies a stock level. Critical means at or below half the threshold.
pub fn classify(current_stock: i32, low_stock_threshold: i32) -> AlertLevel {
    let stock = i64::from(current_stock);
    let threshold = i64::from(low_stock_threshold);
    if stock <= 0 {
        AlertLevel::OutOfStock
    } else if stock > threshold {
        AlertLevel::Normal
    } else if 2 * stock <= threshold {
        AlertLevel::Critical
    } else {
        AlertLevel::Low
    }
}

pub fn classify_wine(wine: &Wine) -> AlertLevel {
    classify(wine.current_stock, wine.low_stock_threshold)
}

/// Per-bucket counts; a wine lands in at most one bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub low_stock_count: usize,
    pub critical_count: usize,
    pub out_of_stock_count: usize,
}

impl AlertSummary {
    pub fn total(&self) -> usize {
        self.low_stock_count + self.critical_count + self.out_of_stock_count
    }

    fn record(&mut self, level: AlertLevel) {
        match level {
            AlertLevel::OutOfStock => self.out_of_stock_count += 1,
            AlertLevel::Critical => self.critical_count += 1,
            AlertLevel::Low => self.low_stock_count += 1,
            AlertLevel::Normal => {}
        }
    }
}

pub fn aggregate<'a, I>(wines: I) -> AlertSummary
where
    I: IntoIterator<Item = &'a Wine>,
{
    wines
        .into_iter()
        .fold(AlertSummary::default(), |mut summary, wine| {
            summary.record(classify_wine(wine));
            summary
        })
}

/// A wine that needs attention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockAlert {
    pub wine_id: i64,
    pub name: String,
    pub vintage_year: i32,
    pub current_stock: i32,
    pub low_stock_threshold: i32,
    pub level: AlertLevel,
    /// Bottles needed to get back to the threshold.
    pub shortfall: i64,
}

impl StockAlert {
    fn from_wine(wine: &Wine, level: AlertLevel) -> Self {
        let shortfall =
            (i64::from(wine.low_stock_threshold) - i64::from(wine.current_stock)).max(0);
        Self {
            wine_id: wine.id,
            name: wine.name.clone(),
            vintage_year: wine.vintage_year,
            current_stock: wine.current_stock,
            low_stock_threshold: wine.low_stock_threshold,
            level,
            shortfall,
        }
    }
}

/// Non-normal wines ordered by severity, then name.
pub fn alerts<'a, I>(wines: I) -> Vec<StockAlert>
where
    I: IntoIterator<Item = &'a Wine>,
{
    let mut alerts: Vec<StockAlert> = wines
        .into_iter()
        .filter_map(|wine| {
            let level = classify_wine(wine);
            level.is_alert().then(|| StockAlert::from_wine(wine, level))
        })
        .collect();
    alerts.sort_by(|a, b| match a.level.cmp(&b.level) {
        Ordering::Equal => a.name.cmp(&b.name).then(a.wine_id.cmp(&b.wine_id)),
        other => other,
    });
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn wine(id: i64, name: &str, stock: i32, threshold: i32) -> Wine {
        Wine {
            id,
            name: name.to_string(),
            vintage_year: 2019,
            region: "Rioja".into(),
            grape_variety: None,
            price: None,
            supplier: None,
            storage_location: None,
            current_stock: stock,
            low_stock_threshold: threshold,
            notes: None,
            image_url: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0, 10, AlertLevel::OutOfStock)]
    #[case(3, 10, AlertLevel::Critical)]
    #[case(5, 10, AlertLevel::Critical)]
    #[case(6, 10, AlertLevel::Low)]
    #[case(10, 10, AlertLevel::Low)]
    #[case(11, 10, AlertLevel::Normal)]
    #[case(1, 3, AlertLevel::Critical)]
    #[case(2, 3, AlertLevel::Low)]
    #[case(1, 0, AlertLevel::Normal)]
    #[case(0, 0, AlertLevel::OutOfStock)]
    fn classification_table(#[case] stock: i32, #[case] threshold: i32, #[case] expected: AlertLevel) {
        assert_eq!(classify(stock, threshold), expected);
    }

    #[test]
    fn one_critical_wine_among_normal_stock() {
        let wines = vec![
            wine(1, "Reserva", 3, 10),
            wine(2, "Crianza", 50, 10),
            wine(3, "Joven", 20, 10),
        ];
        assert_eq!(
            aggregate(&wines),
            AlertSummary {
                low_stock_count: 0,
                critical_count: 1,
                out_of_stock_count: 0,
            }
        );
    }

    #[test]
    fn aggregate_counts_each_wine_once() {
        let wines = vec![
            wine(1, "A", 0, 10),
            wine(2, "B", 3, 10),
            wine(3, "C", 8, 10),
            wine(4, "D", 50, 10),
            wine(5, "E", 0, 5),
        ];
        let summary = aggregate(&wines);
        assert_eq!(
            summary,
            AlertSummary {
                low_stock_count: 1,
                critical_count: 1,
                out_of_stock_count: 2,
            }
        );
        assert_eq!(summary.total(), 4);

        let reversed: Vec<_> = wines.iter().rev().cloned().collect();
        assert_eq!(aggregate(&reversed), summary);
    }

    #[test]
    fn alerts_are_sorted_by_severity_then_name() {
        let wines = vec![
            wine(1, "Zinfandel", 8, 10),
            wine(2, "Barolo", 2, 10),
            wine(3, "Merlot", 0, 10),
            wine(4, "Albarino", 9, 10),
            wine(5, "Chianti", 40, 10),
        ];
        let list = alerts(&wines);
        let names: Vec<_> = list.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Merlot", "Barolo", "Albarino", "Zinfandel"]);
        assert_eq!(list[0].shortfall, 10);
        assert_eq!(list[3].shortfall, 2);
    }

    #[test]
    fn projects_to_badge_status() {
        assert_eq!(StockStatus::from(AlertLevel::Critical), StockStatus::Low);
        assert_eq!(StockStatus::from(AlertLevel::OutOfStock), StockStatus::Out);
        assert_eq!(AlertLevel::OutOfStock.to_string(), "out_of_stock");
    }
}
