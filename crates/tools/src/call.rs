//! Typed tool calls.
//!
//! The model emits loosely-typed JSON arguments. Each [`ToolRequest`] is
//! decoded into exactly one [`SupportToolCall`] variant before anything runs,
//! so dispatch is an exhaustive `match` rather than a string lookup.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use supportdesk_core::{ToolError, ToolRequest};

/// Every tool the support agent can call, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchKnowledgeBase,
    GetOrderStatus,
    ListOrders,
    InitiateReturn,
    CheckProductAvailability,
    EscalateToHuman,
    SendGreeting,
    ListAvailableFunctions,
}

impl ToolName {
    pub const ALL: [ToolName; 8] = [
        ToolName::SearchKnowledgeBase,
        ToolName::GetOrderStatus,
        ToolName::ListOrders,
        ToolName::InitiateReturn,
        ToolName::CheckProductAvailability,
        ToolName::EscalateToHuman,
        ToolName::SendGreeting,
        ToolName::ListAvailableFunctions,
    ];

    /// The wire name the model uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchKnowledgeBase => "search_vector_knowledge_base",
            ToolName::GetOrderStatus => "get_order_status",
            ToolName::ListOrders => "list_orders",
            ToolName::InitiateReturn => "initiate_return",
            ToolName::CheckProductAvailability => "check_product_availability",
            ToolName::EscalateToHuman => "escalate_to_human",
            ToolName::SendGreeting => "send_greeting",
            ToolName::ListAvailableFunctions => "list_available_functions",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

// ── Argument types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchArgs {
    #[serde(deserialize_with = "lenient_string")]
    pub query: String,

    /// Raw count as sent; see [`SearchArgs::limit`]
    #[serde(default, deserialize_with = "lenient_count")]
    pub max_results: Option<i64>,

    /// Comma-separated category names
    #[serde(default, deserialize_with = "lenient_list")]
    pub categories: String,

    #[serde(default, alias = "min_similarity", deserialize_with = "lenient_score")]
    pub min_similarity_score: Option<f64>,
}

impl SearchArgs {
    pub const DEFAULT_RESULTS: usize = 5;
    pub const MAX_RESULTS: usize = 10;

    /// Requested result count clamped to `1..=10`; defaults to 5.
    pub fn limit(&self) -> usize {
        match self.max_results {
            Some(n) => n.clamp(1, Self::MAX_RESULTS as i64) as usize,
            None => Self::DEFAULT_RESULTS,
        }
    }

    /// Minimum relevance clamped to `[0, 1]`; defaults to 0.
    pub fn min_score(&self) -> f32 {
        self.min_similarity_score.unwrap_or(0.0).clamp(0.0, 1.0) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderLookupArgs {
    #[serde(alias = "order_number", deserialize_with = "lenient_string")]
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListOrdersArgs {
    #[serde(
        default = "default_status_filter",
        alias = "status",
        deserialize_with = "lenient_string"
    )]
    pub status_filter: String,
}

fn default_status_filter() -> String {
    "all".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReturnArgs {
    #[serde(alias = "order_number", deserialize_with = "lenient_string")]
    pub order_id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AvailabilityArgs {
    #[serde(alias = "product", deserialize_with = "lenient_string")]
    pub product_name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EscalationArgs {
    #[serde(default, deserialize_with = "lenient_string")]
    pub reason: String,
    #[serde(default, alias = "message", deserialize_with = "lenient_string")]
    pub customer_message: String,
}

/// A fully decoded tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SupportToolCall {
    SearchKnowledgeBase(SearchArgs),
    GetOrderStatus(OrderLookupArgs),
    ListOrders(ListOrdersArgs),
    InitiateReturn(ReturnArgs),
    CheckProductAvailability(AvailabilityArgs),
    EscalateToHuman(EscalationArgs),
    SendGreeting,
    ListAvailableFunctions,
}

impl SupportToolCall {
    pub fn name(&self) -> ToolName {
        match self {
            SupportToolCall::SearchKnowledgeBase(_) => ToolName::SearchKnowledgeBase,
            SupportToolCall::GetOrderStatus(_) => ToolName::GetOrderStatus,
            SupportToolCall::ListOrders(_) => ToolName::ListOrders,
            SupportToolCall::InitiateReturn(_) => ToolName::InitiateReturn,
            SupportToolCall::CheckProductAvailability(_) => ToolName::CheckProductAvailability,
            SupportToolCall::EscalateToHuman(_) => ToolName::EscalateToHuman,
            SupportToolCall::SendGreeting => ToolName::SendGreeting,
            SupportToolCall::ListAvailableFunctions => ToolName::ListAvailableFunctions,
        }
    }
}

impl TryFrom<&ToolRequest> for SupportToolCall {
    type Error = ToolError;

    fn try_from(request: &ToolRequest) -> Result<Self, Self::Error> {
        let name: ToolName = request.tool_name.parse()?;
        let args = Value::Object(request.arguments.clone());

        let decode_err = |e: serde_json::Error| ToolError::InvalidArguments {
            tool_name: name.to_string(),
            reason: e.to_string(),
        };

        Ok(match name {
            ToolName::SearchKnowledgeBase => {
                SupportToolCall::SearchKnowledgeBase(serde_json::from_value(args).map_err(decode_err)?)
            }
            ToolName::GetOrderStatus => {
                SupportToolCall::GetOrderStatus(serde_json::from_value(args).map_err(decode_err)?)
            }
            ToolName::ListOrders => {
                SupportToolCall::ListOrders(serde_json::from_value(args).map_err(decode_err)?)
            }
            ToolName::InitiateReturn => {
                SupportToolCall::InitiateReturn(serde_json::from_value(args).map_err(decode_err)?)
            }
            ToolName::CheckProductAvailability => SupportToolCall::CheckProductAvailability(
                serde_json::from_value(args).map_err(decode_err)?,
            ),
            ToolName::EscalateToHuman => {
                SupportToolCall::EscalateToHuman(serde_json::from_value(args).map_err(decode_err)?)
            }
            ToolName::SendGreeting => SupportToolCall::SendGreeting,
            ToolName::ListAvailableFunctions => SupportToolCall::ListAvailableFunctions,
        })
    }
}

// ── Lenient decoding ────────────────────────────────────────────────────
//
// Models routinely send numbers as strings and vice versa. These accept
// either form; anything unusable for an optional field falls back to the
// field's default rather than failing the call.

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("expected a string, got {other}"))),
    }
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_score<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite()))
}

/// A comma-separated string, or an array of strings joined with commas.
fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    })
}
