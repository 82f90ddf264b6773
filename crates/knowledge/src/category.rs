//! The closed set of knowledge categories and passage types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topic a knowledge passage belongs to. Search filters select on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Return,
    Shipping,
    Product,
    Payment,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Product,
        Category::Shipping,
        Category::Return,
        Category::Payment,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Return => "return",
            Category::Shipping => "shipping",
            Category::Product => "product",
            Category::Payment => "payment",
            Category::General => "general",
        }
    }

    /// Capitalised label used in formatted search output.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Return => "Return",
            Category::Shipping => "Shipping",
            Category::Product => "Product",
            Category::Payment => "Payment",
            Category::General => "General",
        }
    }

    /// Parse a comma-separated filter, silently dropping unknown tokens and
    /// duplicates while keeping first-seen order.
    pub fn parse_list(raw: &str) -> Vec<Category> {
        let mut out = Vec::new();
        for token in raw.split(',') {
            if let Ok(c) = token.parse::<Category>() {
                if !out.contains(&c) {
                    out.push(c);
                }
            }
        }
        out
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "return" | "returns" => Ok(Category::Return),
            "shipping" => Ok(Category::Shipping),
            "product" | "products" => Ok(Category::Product),
            "payment" | "payments" => Ok(Category::Payment),
            "general" => Ok(Category::General),
            _ => Err(UnknownCategory(s.trim().to_string())),
        }
    }
}

/// What kind of passage a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    Policy,
    Info,
    ProductInfo,
    Faq,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Policy => "policy",
            DocType::Info => "info",
            DocType::ProductInfo => "product_info",
            DocType::Faq => "faq",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
