//! Knowledge documents and the JSON source they are rendered from.
//!
//! Each policy block, product entry and FAQ in the source becomes one short
//! plain-text passage tagged with a [`Category`] and [`DocType`].

use crate::category::{Category, DocType};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use supportdesk_core::KnowledgeError;

/// A rendered passage. Identity is its position in the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeDocument {
    pub text: String,
    pub category: Category,
    pub doc_type: DocType,

    /// Set for `product_info` passages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,

    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl KnowledgeDocument {
    pub fn new(text: impl Into<String>, category: Category, doc_type: DocType) -> Self {
        Self {
            text: text.into(),
            category,
            doc_type,
            product_name: None,
            embedding: Vec::new(),
        }
    }
}

// ── Source schema ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct SourceFile {
    #[serde(default)]
    knowledge_base: KnowledgeSource,
}

/// The `knowledge_base` object of the JSON source.
#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeSource {
    #[serde(default)]
    pub policies: Policies,
    #[serde(default)]
    pub products: Products,
    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Policies {
    pub returns: Option<ReturnsPolicy>,
    pub shipping: Option<ShippingTable>,
    pub warranty: Option<WarrantyPolicy>,
    pub payment: Option<PaymentPolicy>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnsPolicy {
    pub time_limit: Option<String>,
    pub condition: Option<String>,
    pub refund_time: Option<String>,
    #[serde(default)]
    pub return_shipping: ReturnShipping,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnShipping {
    pub defective: Option<String>,
    pub other: Option<String>,
}

/// Shipping methods in the order the source lists them.
#[derive(Debug, Default)]
pub struct ShippingTable(pub Vec<(String, ShippingOption)>);

impl<'de> Deserialize<'de> for ShippingTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = ShippingTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of shipping method to time and cost")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ShippingTable, A::Error> {
                let mut methods = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, ShippingOption>()? {
                    methods.push(entry);
                }
                Ok(ShippingTable(methods))
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ShippingOption {
    pub time: Option<String>,
    pub cost: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarrantyPolicy {
    pub standard: Option<String>,
    pub coverage: Option<String>,
    #[serde(default)]
    pub extended_available: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentPolicy {
    #[serde(default)]
    pub methods: Vec<String>,
    pub processor: Option<String>,
    pub security: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Products {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub top_products: Vec<ProductEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductEntry {
    pub name: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FaqEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

// ── Loading ─────────────────────────────────────────────────────────────

/// Read and parse a knowledge source file.
pub fn load_source(path: &Path) -> Result<KnowledgeSource, KnowledgeError> {
    let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::Load {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_source(&content).map_err(|e| match e {
        KnowledgeError::Load { reason, .. } => KnowledgeError::Load {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })
}

/// Parse a knowledge source from a JSON string.
pub fn parse_source(json: &str) -> Result<KnowledgeSource, KnowledgeError> {
    let file: SourceFile = serde_json::from_str(json).map_err(|e| KnowledgeError::Load {
        path: "<inline>".into(),
        reason: e.to_string(),
    })?;
    Ok(file.knowledge_base)
}

/// The fixed support-desk information passage appended to every index.
pub const SUPPORT_INFO: &str = "Customer Support Information:
- Hours: Monday-Friday, 9 AM - 6 PM EST
- Contact methods: Chat, email (support@store.com), phone (1-800-SUPPORT)
- Order modifications: Available within 1 hour of placing order
- Price matching: Available on identical items from authorized retailers
- Gift wrapping: Available for $5 per item with custom messages
";

fn or_na(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("N/A")
}

/// Capitalise the first letter of every alphabetic run ("two_day" → "Two_Day").
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

impl KnowledgeSource {
    /// Render every record into a passage, in a fixed order: returns,
    /// shipping, warranty, payment, product categories, products, FAQs,
    /// then the support information block.
    pub fn into_documents(self) -> Vec<KnowledgeDocument> {
        let mut docs = Vec::new();
        let policies = self.policies;

        if let Some(r) = &policies.returns {
            let text = format!(
                "Return Policy:\n- Time limit: {}\n- Condition: {}\n- Refund processing time: {}\n- Return shipping cost: Free for defective items, ${} for other reasons\n",
                or_na(&r.time_limit),
                or_na(&r.condition),
                or_na(&r.refund_time),
                or_na(&r.return_shipping.other),
            );
            docs.push(KnowledgeDocument::new(text, Category::Return, DocType::Policy));
        }

        if let Some(shipping) = &policies.shipping {
            let mut text = String::from("Shipping Options:\n");
            for (method, details) in &shipping.0 {
                text.push_str(&format!(
                    "- {}: {} - {}\n",
                    title_case(method),
                    or_na(&details.time),
                    or_na(&details.cost)
                ));
            }
            docs.push(KnowledgeDocument::new(text, Category::Shipping, DocType::Policy));
        }

        if let Some(w) = &policies.warranty {
            let text = format!(
                "Warranty Information:\n- Standard warranty: {}\n- Coverage: {}\n- Extended warranty available: {}\n",
                or_na(&w.standard),
                or_na(&w.coverage),
                if w.extended_available { "Yes" } else { "No" },
            );
            docs.push(KnowledgeDocument::new(text, Category::Product, DocType::Policy));
        }

        if let Some(p) = &policies.payment {
            let text = format!(
                "Payment Information:\n- Accepted methods: {}\n- Payment processor: {}\n- Security: {}\n- Payment timing: Charged when order ships\n",
                p.methods.join(", "),
                or_na(&p.processor),
                or_na(&p.security),
            );
            docs.push(KnowledgeDocument::new(text, Category::Payment, DocType::Policy));
        }

        if !self.products.categories.is_empty() {
            let text = format!("Product Categories: {}", self.products.categories.join(", "));
            docs.push(KnowledgeDocument::new(text, Category::Product, DocType::Info));
        }

        for product in &self.products.top_products {
            let name = product.name.as_deref().unwrap_or("Unknown Product");
            let text = format!(
                "{name}\nPrice: {}\nFeatures: {}\n",
                or_na(&product.price),
                product.features.join(", ")
            );
            let mut doc = KnowledgeDocument::new(text, Category::Product, DocType::ProductInfo);
            doc.product_name = product.name.clone();
            docs.push(doc);
        }

        for faq in &self.faq {
            let text = format!("Question: {}\nAnswer: {}\n", faq.question, faq.answer);
            docs.push(KnowledgeDocument::new(text, Category::General, DocType::Faq));
        }

        docs.push(KnowledgeDocument::new(SUPPORT_INFO, Category::General, DocType::Info));
        docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "knowledge_base": {
        "policies": {
          "returns": {
            "time_limit": "30 days from delivery",
            "condition": "Unused, in original packaging",
            "refund_time": "5-7 business days",
            "return_shipping": {"defective": "free", "other": "7.99"}
          },
          "shipping": {
            "standard": {"time": "5-7 business days", "cost": "$5.99"},
            "two_day": {"time": "2 business days", "cost": "$12.99"}
          },
          "warranty": {"standard": "1 year", "coverage": "Manufacturing defects", "extended_available": true},
          "payment": {"methods": ["Visa", "PayPal"], "processor": "Stripe", "security": "PCI DSS"}
        },
        "products": {
          "categories": ["Electronics", "Accessories"],
          "top_products": [{"name": "Wireless Headphones", "price": "$79.99", "features": ["ANC", "30h battery"]}]
        },
        "faq": [{"question": "Do you ship internationally?", "answer": "Yes, to 40 countries."}]
      }
    }"#;

    #[test]
    fn renders_all_sections_in_order() {
        let docs = parse_source(SAMPLE).unwrap().into_documents();
        let kinds: Vec<(Category, DocType)> = docs.iter().map(|d| (d.category, d.doc_type)).collect();
        assert_eq!(
            kinds,
            vec![
                (Category::Return, DocType::Policy),
                (Category::Shipping, DocType::Policy),
                (Category::Product, DocType::Policy),
                (Category::Payment, DocType::Policy),
                (Category::Product, DocType::Info),
                (Category::Product, DocType::ProductInfo),
                (Category::General, DocType::Faq),
                (Category::General, DocType::Info),
            ]
        );
    }

    #[test]
    fn return_policy_passage_text() {
        let docs = parse_source(SAMPLE).unwrap().into_documents();
        let text = &docs[0].text;
        assert!(text.starts_with("Return Policy:\n- Time limit: 30 days from delivery\n"));
        assert!(text.contains("- Refund processing time: 5-7 business days"));
        assert!(text.contains("Free for defective items, $7.99 for other reasons"));
    }

    #[test]
    fn shipping_methods_are_title_cased() {
        let docs = parse_source(SAMPLE).unwrap().into_documents();
        assert!(docs[1].text.contains("- Standard: 5-7 business days - $5.99"));
        assert!(docs[1].text.contains("- Two_Day: 2 business days - $12.99"));
    }

    #[test]
    fn shipping_methods_keep_source_order() {
        let source = r#"{"knowledge_base":{"policies":{"shipping":{
            "standard": {"time": "5-7 days", "cost": "$5.99"},
            "express": {"time": "2-3 days", "cost": "$12.99"},
            "overnight": {"time": "Next day", "cost": "$24.99"}
        }}}}"#;
        let docs = parse_source(source).unwrap().into_documents();
        let text = &docs[0].text;
        let standard = text.find("- Standard:").unwrap();
        let express = text.find("- Express:").unwrap();
        let overnight = text.find("- Overnight:").unwrap();
        assert!(standard < express && express < overnight, "{text}");
    }

    #[test]
    fn product_passage_carries_name() {
        let docs = parse_source(SAMPLE).unwrap().into_documents();
        let product = docs.iter().find(|d| d.doc_type == DocType::ProductInfo).unwrap();
        assert_eq!(product.product_name.as_deref(), Some("Wireless Headphones"));
        assert!(product.text.contains("Features: ANC, 30h battery"));
    }

    #[test]
    fn empty_source_still_has_support_info() {
        let docs = parse_source("{}").unwrap().into_documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, SUPPORT_INFO);
    }

    #[test]
    fn missing_fields_render_as_na() {
        let docs = parse_source(r#"{"knowledge_base":{"policies":{"returns":{}}}}"#)
            .unwrap()
            .into_documents();
        assert!(docs[0].text.contains("- Time limit: N/A"));
    }

    #[test]
    fn load_missing_file_is_error() {
        let err = load_source(Path::new("/nonexistent/kb.json")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Load { .. }));
    }

    #[test]
    fn load_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_source(&path).unwrap_err();
        assert!(err.to_string().contains("kb.json"));
    }
}
