//! Client-side domain logic layered over the HTTP client.

// Pure computations
pub mod alerts;
pub mod stock;
pub mod validation;

// Orchestration over the backend
pub mod inventory;
pub mod wines;

pub use inventory::{InventoryService, StockMovement};
pub use wines::WineService;
