//! Read-only order and inventory lookups.
//!
//! The tools only ever read from these stores. The mock implementations hold
//! sample data with dates relative to the day they were built.

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use supportdesk_core::ToolError;

// ── Orders ──────────────────────────────────────────────────────────────

/// Where an order is in fulfilment, with the data that only exists at that stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderStatus {
    Processing {
        expected_ship: NaiveDate,
    },
    InTransit {
        expected_delivery: NaiveDate,
        tracking_number: String,
    },
    Delivered {
        delivered_on: NaiveDate,
    },
}

/// Status without its payload, for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Processing,
    InTransit,
    Delivered,
}

impl StatusKind {
    /// Grouping order for listings.
    pub const ALL: [StatusKind; 3] = [StatusKind::Processing, StatusKind::InTransit, StatusKind::Delivered];

    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Processing => "Processing",
            StatusKind::InTransit => "In Transit",
            StatusKind::Delivered => "Delivered",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            StatusKind::Processing => "⏳",
            StatusKind::InTransit => "📦",
            StatusKind::Delivered => "✅",
        }
    }
}

impl OrderStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            OrderStatus::Processing { .. } => StatusKind::Processing,
            OrderStatus::InTransit { .. } => StatusKind::InTransit,
            OrderStatus::Delivered { .. } => StatusKind::Delivered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: String,
    #[serde(flatten)]
    pub status: OrderStatus,
    pub items: Vec<String>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Look up one order by its normalised id.
    async fn get(&self, order_id: &str) -> Result<Option<Order>, ToolError>;

    /// Every order, in store order.
    async fn list(&self) -> Result<Vec<Order>, ToolError>;
}

/// In-memory sample orders.
#[derive(Debug, Clone, Default)]
pub struct MockOrderStore {
    orders: Vec<Order>,
}

impl MockOrderStore {
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// The demo data set, dated relative to `today`.
    pub fn sample_at(today: NaiveDate) -> Self {
        Self::new(vec![
            Order {
                id: "123456".into(),
                status: OrderStatus::InTransit {
                    expected_delivery: today + Duration::days(2),
                    tracking_number: "1Z999AA10123456784".into(),
                },
                items: vec!["Wireless Headphones".into(), "USB Cable".into()],
            },
            Order {
                id: "789012".into(),
                status: OrderStatus::Delivered {
                    delivered_on: today - Duration::days(3),
                },
                items: vec!["Laptop Stand".into()],
            },
            Order {
                id: "345678".into(),
                status: OrderStatus::Processing {
                    expected_ship: today + Duration::days(1),
                },
                items: vec!["Mechanical Keyboard".into(), "Mouse Pad".into()],
            },
        ])
    }

    pub fn sample() -> Self {
        Self::sample_at(Local::now().date_naive())
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<Order>, ToolError> {
        Ok(self.orders.iter().find(|o| o.id == order_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Order>, ToolError> {
        Ok(self.orders.clone())
    }
}

// ── Inventory ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock { restock_date: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStock {
    /// Lowercase catalogue key, e.g. "laptop"
    pub key: String,
    pub units: u32,
    #[serde(flatten)]
    pub status: StockStatus,
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// The full catalogue, in catalogue order.
    async fn all(&self) -> Result<Vec<ProductStock>, ToolError>;
}

#[derive(Debug, Clone, Default)]
pub struct MockInventory {
    products: Vec<ProductStock>,
}

impl MockInventory {
    pub fn new(products: Vec<ProductStock>) -> Self {
        Self { products }
    }

    pub fn sample() -> Self {
        let item = |key: &str, units: u32, status: StockStatus| ProductStock {
            key: key.into(),
            units,
            status,
        };
        Self::new(vec![
            item("laptop", 15, StockStatus::InStock),
            item("headphones", 3, StockStatus::LowStock),
            item(
                "mouse",
                0,
                StockStatus::OutOfStock {
                    restock_date: Some("Nov 5, 2025".into()),
                },
            ),
            item("keyboard", 25, StockStatus::InStock),
            item("monitor", 8, StockStatus::InStock),
            item("webcam", 1, StockStatus::LowStock),
        ])
    }
}

#[async_trait]
impl InventoryStore for MockInventory {
    async fn all(&self) -> Result<Vec<ProductStock>, ToolError> {
        Ok(self.products.clone())
    }
}
