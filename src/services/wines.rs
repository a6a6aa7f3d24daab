use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::errors::ServiceError;
use crate::models::{Wine, WineDraft, WinePatch, WineQuery};
use crate::services::alerts::{aggregate, alerts, AlertSummary, StockAlert};
use crate::services::validation::{validate_wine, validate_wine_patch};

/// Upper bound on pages fetched by a full catalog scan.
const MAX_SCAN_PAGES: u32 = 1_000;

/// Validated catalog operations
#[derive(Clone, Debug)]
pub struct WineService {
    client: ApiClient,
    page_size: u32,
}

impl WineService {
    pub fn new(client: ApiClient, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.clamp(1, 100),
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: WineDraft) -> Result<Wine, ServiceError> {
        let draft = draft.normalized();
        validate_wine(&draft).into_result()?;
        let wine = self.client.wines().create(&draft).await?;
        info!(wine_id = wine.id, "wine created");
        Ok(wine)
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: i64, patch: WinePatch) -> Result<Wine, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "update contains no fields".to_string(),
            ));
        }
        validate_wine_patch(&patch).into_result()?;
        let wine = self.client.wines().update(id, &patch).await?;
        info!(wine_id = wine.id, "wine updated");
        Ok(wine)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.client.wines().delete(id).await?;
        info!(wine_id = id, "wine deleted");
        Ok(())
    }

    /// Fetches every wine by paging through the catalog.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Wine>, ServiceError> {
        let mut wines = Vec::new();
        let mut page = 1;
        loop {
            let query = WineQuery {
                page: Some(page),
                page_size: Some(self.page_size),
                ..Default::default()
            };
            let batch = self.client.wines().list(&query).await?;
            let last = batch.is_last();
            wines.extend(batch.items);
            if last || page >= MAX_SCAN_PAGES {
                break;
            }
            page += 1;
        }
        Ok(wines)
    }

    /// Classifies the whole catalog locally.
    pub async fn low_stock_report(&self) -> Result<(AlertSummary, Vec<StockAlert>), ServiceError> {
        let wines = self.all().await?;
        let summary = aggregate(&wines);
        let list = alerts(&wines);
        info!(
            wines = wines.len(),
            alerts = summary.total(),
            "low stock report built"
        );
        Ok((summary, list))
    }
}
