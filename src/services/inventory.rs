use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::client::ApiClient;
use crate::errors::ServiceError;
use crate::models::{InventoryTransaction, TransactionDraft, Wine};
use crate::services::stock::{evaluate, StockProjection};
use crate::services::validation::{validate_transaction, TransactionPolicy};

/// Result of a recorded stock movement.
#[derive(Clone, Debug, Serialize)]
pub struct StockMovement {
    pub transaction: InventoryTransaction,
    /// Local projection made before submitting.
    pub projection: StockProjection,
    /// Authoritative wine state refetched after the movement.
    pub wine: Wine,
}

impl StockMovement {
    /// True when the server's stock differs from the local projection, e.g.
    /// because another operator moved stock concurrently.
    pub fn diverged(&self) -> bool {
        i64::from(self.wine.current_stock) != self.projection.projected_stock
    }
}

/// Service for recording stock movements
#[derive(Clone, Debug)]
pub struct InventoryService {
    client: ApiClient,
    policy: TransactionPolicy,
}

impl InventoryService {
    pub fn new(client: ApiClient, policy: TransactionPolicy) -> Self {
        Self { client, policy }
    }

    /// Projects a movement against the wine's current server state.
    #[instrument(skip(self, draft), fields(wine_id = draft.wine_id, kind = %draft.kind))]
    pub async fn preview(&self, draft: &TransactionDraft) -> Result<(Wine, StockProjection), ServiceError> {
        let wine = self.client.wines().get(draft.wine_id).await?;
        let projection = evaluate(
            wine.current_stock,
            wine.low_stock_threshold,
            draft.kind,
            draft.quantity,
        );
        Ok((wine, projection))
    }

    /// Validates, submits and reconciles a stock movement.
    #[instrument(skip(self, draft), fields(wine_id = draft.wine_id, kind = %draft.kind, quantity = draft.quantity))]
    pub async fn record(&self, draft: &TransactionDraft) -> Result<StockMovement, ServiceError> {
        let (wine, projection) = self.preview(draft).await?;

        validate_transaction(draft, wine.current_stock, &self.policy).into_result()?;

        if projection.will_be_out_of_stock {
            warn!(wine = %wine.name, "movement will leave the wine out of stock");
        } else if projection.will_be_below_threshold {
            warn!(
                wine = %wine.name,
                projected = projection.projected_stock,
                threshold = wine.low_stock_threshold,
                "movement will drop stock below threshold"
            );
        }

        let transaction = self.client.inventory().create(draft).await?;
        let wine = self.client.wines().get(draft.wine_id).await?;

        info!(
            transaction_id = transaction.id,
            current_stock = wine.current_stock,
            "stock movement recorded"
        );
        let movement = StockMovement {
            transaction,
            projection,
            wine,
        };
        if movement.diverged() {
            warn!(
                projected = movement.projection.projected_stock,
                actual = movement.wine.current_stock,
                "server stock differs from local projection"
            );
        }
        Ok(movement)
    }

    /// Movement history for one wine.
    pub async fn history(&self, wine_id: i64) -> Result<Vec<InventoryTransaction>, ServiceError> {
        self.client.inventory().history(wine_id).await
    }
}
