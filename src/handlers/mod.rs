pub mod gateway;
pub mod inventory;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

impl inventory::InventoryHandlerState for AppState {
    fn inventory_service(&self) -> &crate::services::inventory::InventoryService {
        &self.inventory_service
    }
}
