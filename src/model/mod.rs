//! # Order Model
//!
//! The normalized order the layout engine consumes. It is read-only for the
//! engine: nothing here is mutated during generation, and `line_items` is
//! printed in exactly the order it arrives.
//!
//! Orders can be built in code, deserialized from camelCase JSON, or
//! converted from a Saleor GraphQL payload (see [`crate::adapter`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// One order, ready to be laid out as an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocument {
    pub order_number: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub shipping_method_name: Option<String>,
    #[serde(default)]
    pub payment_status_label: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_cost: Option<Money>,
    #[serde(default)]
    pub totals: Option<Totals>,
}

impl OrderDocument {
    /// Parse an order from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: PostalAddress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default)]
    pub street_lines: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl PostalAddress {
    /// Non-empty street lines joined the way the customer block prints them.
    pub fn street(&self) -> String {
        self.street_lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A monetary amount in a single currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn new(amount: f64, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub net: Money,
    pub tax: Money,
    pub gross: Money,
}

/// One product/variant entry of an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub subtotal: Option<Money>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A named product attribute such as "Vintage" or "Size".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

impl LineItem {
    /// First value of the first attribute named exactly `name`.
    ///
    /// Matching is case-sensitive. A missing attribute, or one without any
    /// values, resolves to the empty string so the result can always be
    /// drawn as-is.
    pub fn attribute(&self, name: &str) -> &str {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .and_then(|attribute| attribute.values.first())
            .map(String::as_str)
            .unwrap_or("")
    }
}
