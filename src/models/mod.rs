pub mod inventory_item;
pub mod money;

pub use inventory_item::{InventoryItem, ItemKey, ItemView, NewInventoryItem};
