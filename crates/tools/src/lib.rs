//! The customer-support tool catalogue for SupportDesk.
//!
//! Eight tools cover knowledge search, order lookups, returns, stock checks
//! and escalation to a human. Model-emitted requests are decoded into a
//! closed [`SupportToolCall`] enum and dispatched by [`SupportToolbox`].

pub mod call;
pub mod catalog;
pub mod escalation;
pub mod ids;
pub mod inventory;
pub mod knowledge_search;
pub mod orders;
pub mod registry;
pub mod store;

pub use call::{SupportToolCall, ToolName};
pub use registry::SupportToolbox;
pub use store::{
    InventoryStore, MockInventory, MockOrderStore, Order, OrderStatus, OrderStore, ProductStock,
    StockStatus,
};
