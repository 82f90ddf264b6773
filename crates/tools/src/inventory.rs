//! Stock lookups by product name.

use crate::call::AvailabilityArgs;
use crate::store::{InventoryStore, ProductStock, StockStatus};
use supportdesk_core::ToolError;

fn title(key: &str) -> String {
    key.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn stock_block(product: &ProductStock) -> String {
    let name = title(&product.key);
    match &product.status {
        StockStatus::InStock => format!(
            "✅ {name}: IN STOCK ({} units available)\n   Ready to ship within 1-2 business days!",
            product.units
        ),
        StockStatus::LowStock => format!(
            "⚠️ {name}: LOW STOCK ({} units remaining)\n   Order soon to avoid missing out!",
            product.units
        ),
        StockStatus::OutOfStock { restock_date } => format!(
            "❌ {name}: OUT OF STOCK\n   Expected restock: {}\n   Would you like me to notify you when it's back in stock?",
            restock_date.as_deref().unwrap_or("TBD")
        ),
    }
}

/// Every catalogue entry whose key contains the query or is contained by it,
/// case-insensitively ("wireless headphones" matches "headphones").
pub async fn check_availability(
    store: &dyn InventoryStore,
    args: &AvailabilityArgs,
) -> Result<String, ToolError> {
    let query = args.product_name.trim().to_lowercase();

    let mut blocks = Vec::new();
    if !query.is_empty() {
        for product in store.all().await? {
            let key = product.key.to_lowercase();
            if key.contains(&query) || query.contains(&key) {
                blocks.push(stock_block(&product));
            }
        }
    }

    if blocks.is_empty() {
        return Ok(format!(
            "I couldn't find specific inventory information for \"{}\".\n\n\
             Please provide more details or check our online catalog at www.store.com/products\n\n\
             Would you like me to help you find something similar, or would you like to speak with a product specialist?",
            args.product_name
        ));
    }

    Ok(blocks.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockInventory;

    async fn check(name: &str) -> String {
        check_availability(
            &MockInventory::sample(),
            &AvailabilityArgs {
                product_name: name.into(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn in_stock_product() {
        assert_eq!(
            check("laptop").await,
            "✅ Laptop: IN STOCK (15 units available)\n   Ready to ship within 1-2 business days!"
        );
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive_and_bidirectional() {
        let out = check("Wireless HEADPHONES").await;
        assert!(out.starts_with("⚠️ Headphones: LOW STOCK (3 units remaining)"));
    }

    #[tokio::test]
    async fn out_of_stock_shows_restock_date() {
        let out = check("mouse").await;
        assert!(out.contains("❌ Mouse: OUT OF STOCK"));
        assert!(out.contains("Expected restock: Nov 5, 2025"));
    }

    #[tokio::test]
    async fn partial_query_can_match_several_products() {
        // "m" occurs in mouse, monitor and webcam
        let out = check("m").await;
        assert_eq!(out.split("\n\n").count(), 3);
        assert!(out.find("Mouse").unwrap() < out.find("Monitor").unwrap());
        assert!(out.find("Monitor").unwrap() < out.find("Webcam").unwrap());
    }

    #[tokio::test]
    async fn unknown_product() {
        let out = check("hoverboard").await;
        assert!(out.starts_with("I couldn't find specific inventory information for \"hoverboard\"."));
    }

    #[tokio::test]
    async fn blank_query_matches_nothing() {
        assert!(check("   ").await.starts_with("I couldn't find"));
    }
}
