//! Order tools: status lookup, listing and return authorisation.

use crate::call::{ListOrdersArgs, OrderLookupArgs, ReturnArgs};
use crate::ids::return_authorization;
use crate::store::{Order, OrderStatus, OrderStore, StatusKind};
use chrono::NaiveDate;
use supportdesk_core::ToolError;

/// Strip every `#` and surrounding whitespace ("#123456 " → "123456").
pub fn normalize_order_id(raw: &str) -> String {
    raw.replace('#', "").trim().to_string()
}

fn display_date(date: NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}

fn items(order: &Order) -> String {
    order.items.join(", ")
}

pub async fn order_status(store: &dyn OrderStore, args: &OrderLookupArgs) -> Result<String, ToolError> {
    let order_id = normalize_order_id(&args.order_id);
    let Some(order) = store.get(&order_id).await? else {
        return Ok(format!(
            "Order #{order_id} not found.\n\n\
             Please verify the order number and try again. Order numbers are typically 6 digits and can be found in your confirmation email.\n\n\
             If you continue to have trouble, I can escalate this to a human agent who can help locate your order."
        ));
    };

    let text = match &order.status {
        OrderStatus::InTransit {
            expected_delivery,
            tracking_number,
        } => format!(
            "📦 Order #{order_id} - In Transit\n\n\
             Status: Your order is on its way!\n\
             Expected Delivery: {}\n\
             Tracking Number: {tracking_number}\n\
             Items: {}\n\n\
             You can track your package at: https://track.example.com/{tracking_number}",
            display_date(*expected_delivery),
            items(&order),
        ),
        OrderStatus::Delivered { delivered_on } => format!(
            "✅ Order #{order_id} - Delivered\n\n\
             Status: Successfully delivered\n\
             Delivered: {}\n\
             Items: {}\n\n\
             If you haven't received your package or there are any issues, please let me know and I can help!",
            display_date(*delivered_on),
            items(&order),
        ),
        OrderStatus::Processing { expected_ship } => format!(
            "⏳ Order #{order_id} - Processing\n\n\
             Status: Your order is being prepared for shipment\n\
             Expected Ship Date: {}\n\
             Items: {}\n\n\
             You'll receive a tracking number via email as soon as your order ships. Thanks for your patience!",
            display_date(*expected_ship),
            items(&order),
        ),
    };
    Ok(text)
}

/// Map a filter value onto the statuses it selects. `None` means the value
/// matches no status.
fn statuses_for(filter: &str) -> Option<Vec<StatusKind>> {
    let normalized = filter.trim().to_lowercase().replace([' ', '-'], "_");
    let kinds = match normalized.as_str() {
        "" | "all" => StatusKind::ALL.to_vec(),
        "processing" | "pending" | "not_shipped" | "unshipped" => vec![StatusKind::Processing],
        "in_transit" | "transit" | "on_the_way" => vec![StatusKind::InTransit],
        "delivered" => vec![StatusKind::Delivered],
        "shipped" => vec![StatusKind::InTransit, StatusKind::Delivered],
        _ => return None,
    };
    Some(kinds)
}

fn order_line(order: &Order) -> String {
    let detail = match &order.status {
        OrderStatus::Processing { expected_ship } => {
            format!("expected to ship {}", display_date(*expected_ship))
        }
        OrderStatus::InTransit {
            expected_delivery,
            tracking_number,
        } => format!(
            "expected delivery {}, tracking {tracking_number}",
            display_date(*expected_delivery)
        ),
        OrderStatus::Delivered { delivered_on } => format!("delivered {}", display_date(*delivered_on)),
    };
    format!("- Order #{}: {} ({detail})", order.id, items(order))
}

pub async fn list_orders(store: &dyn OrderStore, args: &ListOrdersArgs) -> Result<String, ToolError> {
    let filter = args.status_filter.trim();
    let empty = || format!("No orders found with status '{filter}'.");

    let Some(kinds) = statuses_for(filter) else {
        return Ok(format!(
            "{}\n\nValid filters: all, processing, in_transit, delivered, shipped.",
            empty()
        ));
    };

    let orders = store.list().await?;
    let mut sections = Vec::new();
    for kind in kinds {
        let group: Vec<&Order> = orders.iter().filter(|o| o.status.kind() == kind).collect();
        if group.is_empty() {
            continue;
        }
        let mut section = format!("{} {} ({})", kind.icon(), kind.label(), group.len());
        for order in group {
            section.push('\n');
            section.push_str(&order_line(order));
        }
        sections.push(section);
    }

    if sections.is_empty() {
        return Ok(empty());
    }

    let label = if filter.is_empty() { "all" } else { filter };
    Ok(format!(
        "📋 Your Orders ({label})\n\n{}\n\nAsk me about any order number for full details.",
        sections.join("\n\n")
    ))
}

fn is_defect_reason(reason: &str) -> bool {
    let reason = reason.to_lowercase();
    ["defect", "damaged", "broken"]
        .iter()
        .any(|word| reason.contains(word))
}

/// Authorise a return. Nothing is written back to the store.
pub async fn initiate_return(store: &dyn OrderStore, args: &ReturnArgs) -> Result<String, ToolError> {
    let order_id = normalize_order_id(&args.order_id);
    let Some(order) = store.get(&order_id).await? else {
        return Ok(format!(
            "I couldn't find order #{order_id}. Please verify the order number and try again."
        ));
    };

    let rma = return_authorization(&order_id, &args.reason);
    let header = format!(
        "🔄 Return Authorized - Order #{order_id}\n\n\
         Return Authorization: {rma}\n\
         Reason: {}\n\
         Items: {}\n\n",
        args.reason,
        items(&order),
    );

    let steps = if is_defect_reason(&args.reason) {
        "Since your item is defective/damaged, we'll make this easy:\n\n\
         1. ✅ FREE return shipping label will be emailed to you within 1 hour\n\
         2. 📦 Pack the item securely in any box\n\
         3. 📧 Print the label and attach it to the package\n\
         4. 🚚 Drop off at any UPS location or schedule a pickup\n\
         5. 💰 Full refund processed within 5-7 business days after we receive it\n\n\
         We apologize for the inconvenience! Is there anything else I can help with?"
    } else {
        "Here's how to return your order:\n\n\
         1. 📧 Return label will be emailed to you within 1 hour ($7.99 deducted from refund)\n\
         2. 📦 Pack the item in original packaging with all accessories and tags\n\
         3. 🏷️ Print the label and attach it to the package\n\
         4. 🚚 Drop off at any UPS location\n\
         5. 💰 Refund processed within 5-7 business days after we receive it\n\n\
         Note: Items must be unused and in original condition for a full refund.\n\
         Would you like to proceed with this return?"
    };

    Ok(format!("{header}{steps}"))
}
