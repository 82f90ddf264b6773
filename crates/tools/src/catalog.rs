//! Tool descriptions: the JSON schemas sent to the model, and the
//! customer-facing greeting and capability listing.

use crate::call::ToolName;
use serde_json::json;
use supportdesk_core::ToolDefinition;

/// Customer-facing description of one tool.
struct Capability {
    title: &'static str,
    summary: &'static str,
    examples: &'static str,
}

fn capability(name: ToolName) -> Capability {
    match name {
        ToolName::SearchKnowledgeBase => Capability {
            title: "Knowledge Base Search",
            summary: "Search our policies, FAQs and product information.",
            examples: "\"What's your return policy?\", \"Do you ship internationally?\"",
        },
        ToolName::GetOrderStatus => Capability {
            title: "Order Status",
            summary: "Look up where an order is, with delivery dates and tracking.",
            examples: "\"Where is order #123456?\"",
        },
        ToolName::ListOrders => Capability {
            title: "Order List",
            summary: "List your orders, optionally by status.",
            examples: "\"Show my orders that haven't shipped yet\"",
        },
        ToolName::InitiateReturn => Capability {
            title: "Returns",
            summary: "Start a return and get a return authorization number.",
            examples: "\"I want to return order 789012, it arrived broken\"",
        },
        ToolName::CheckProductAvailability => Capability {
            title: "Product Availability",
            summary: "Check whether a product is in stock.",
            examples: "\"Do you have the mechanical keyboard in stock?\"",
        },
        ToolName::EscalateToHuman => Capability {
            title: "Human Support",
            summary: "Connect you with a member of our support team.",
            examples: "\"I'd like to talk to a person\"",
        },
        ToolName::SendGreeting => Capability {
            title: "Welcome",
            summary: "Say hello and explain what I can help with.",
            examples: "\"Hi!\"",
        },
        ToolName::ListAvailableFunctions => Capability {
            title: "Capabilities",
            summary: "Show this list of everything I can do.",
            examples: "\"What can you do?\"",
        },
    }
}

/// The model-facing definition of one tool.
pub fn definition(name: ToolName) -> ToolDefinition {
    let (description, parameters) = match name {
        ToolName::SearchKnowledgeBase => (
            "Semantic search over store policies (returns, shipping, warranty, payment), product information and FAQs. Use this for any policy or product question.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to search for, in natural language" },
                    "max_results": { "type": "integer", "description": "Number of results (1-10, default 5)" },
                    "categories": {
                        "type": "string",
                        "description": "Optional comma-separated filter: product, shipping, return, payment, general"
                    },
                    "min_similarity_score": { "type": "number", "description": "Minimum relevance between 0 and 1 (default 0)" }
                },
                "required": ["query"]
            }),
        ),
        ToolName::GetOrderStatus => (
            "Get the current status of an order: delivery or ship date, tracking number and items.",
            json!({
                "type": "object",
                "properties": {
                    "order_id": { "type": "string", "description": "The order number, e.g. 123456" }
                },
                "required": ["order_id"]
            }),
        ),
        ToolName::ListOrders => (
            "List the customer's orders grouped by status.",
            json!({
                "type": "object",
                "properties": {
                    "status_filter": {
                        "type": "string",
                        "description": "all (default), processing, in_transit, delivered, or shipped"
                    }
                }
            }),
        ),
        ToolName::InitiateReturn => (
            "Authorize a return for an order and explain the return steps. Defective, damaged or broken items ship back free.",
            json!({
                "type": "object",
                "properties": {
                    "order_id": { "type": "string", "description": "The order number to return" },
                    "reason": { "type": "string", "description": "Why the customer is returning it" }
                },
                "required": ["order_id", "reason"]
            }),
        ),
        ToolName::CheckProductAvailability => (
            "Check stock levels for a product by name.",
            json!({
                "type": "object",
                "properties": {
                    "product_name": { "type": "string", "description": "Product name, e.g. laptop or headphones" }
                },
                "required": ["product_name"]
            }),
        ),
        ToolName::EscalateToHuman => (
            "Create a support ticket and hand the conversation to a human agent. Use when the customer is upset, asks for a person, or the issue is too complex.",
            json!({
                "type": "object",
                "properties": {
                    "reason": { "type": "string", "description": "Why escalation is needed, e.g. frustrated customer or complex issue" },
                    "customer_message": { "type": "string", "description": "The customer's message, verbatim" }
                },
                "required": ["reason", "customer_message"]
            }),
        ),
        ToolName::SendGreeting => (
            "Greet the customer and introduce what the assistant can help with.",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolName::ListAvailableFunctions => (
            "List everything the assistant can do, with examples.",
            json!({ "type": "object", "properties": {} }),
        ),
    };

    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

/// All definitions in declared order.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolName::ALL.into_iter().map(definition).collect()
}

pub const GREETING: &str = "👋 Hello and welcome to our customer support! I'm your virtual assistant.

I can help you with:
- 📚 Questions about our policies (returns, shipping, warranty, payment)
- 📦 Checking the status of your orders
- 📋 Listing your recent orders
- 🔄 Starting a return
- 🛒 Checking product availability
- 👤 Connecting you with a human support agent

How can I help you today?";

/// Numbered capability listing in declared order.
pub fn capability_listing() -> String {
    let mut out = String::from("Here's what I can do for you:\n");
    for (i, name) in ToolName::ALL.into_iter().enumerate() {
        let c = capability(name);
        out.push_str(&format!(
            "\n{}. {} ({name})\n   {}\n   Try: {}\n",
            i + 1,
            c.title,
            c.summary,
            c.examples
        ));
    }
    out.push_str("\nJust ask in your own words and I'll take care of the rest.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_follow_declared_order() {
        let names: Vec<String> = definitions().into_iter().map(|d| d.name).collect();
        let expected: Vec<String> = ToolName::ALL.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn every_schema_is_an_object() {
        for def in definitions() {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn listing_is_numbered_and_complete() {
        let listing = capability_listing();
        assert!(listing.contains("\n1. Knowledge Base Search (search_vector_knowledge_base)"));
        assert!(listing.contains("\n8. Capabilities (list_available_functions)"));
        for name in ToolName::ALL {
            assert!(listing.contains(name.as_str()));
        }
    }

    #[test]
    fn greeting_invites_a_question() {
        assert!(GREETING.starts_with("👋 Hello"));
        assert!(GREETING.ends_with("How can I help you today?"));
    }
}
