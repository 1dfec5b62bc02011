//! Saleor GraphQL order payloads.
//!
//! Mirrors the fields of the `OrderDetailForPdfLib` query plus the order
//! `number` and `created` timestamp from the webhook payload. Accepts either
//! the raw GraphQL response (`{"data": {"order": {...}}}`) or the bare order
//! object.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::FolioError;
use crate::model::{Attribute, Customer, LineItem, Money, OrderDocument, PostalAddress, Totals};

/// Fallbacks applied while converting a Saleor order.
#[derive(Debug, Clone, Default)]
pub struct AdapterDefaults {
    /// Currency for amounts that arrive without one. When unset such
    /// amounts are a [`FolioError::MalformedOrder`].
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleorOrder {
    #[serde(default)]
    pub id: Option<String>,
    pub number: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub payment_status_display: Option<String>,
    #[serde(default)]
    pub shipping_method_name: Option<String>,
    #[serde(default)]
    pub shipping_price: Option<SaleorTaxedMoney>,
    #[serde(default)]
    pub shipping_address: Option<SaleorAddress>,
    #[serde(default)]
    pub lines: Vec<SaleorLine>,
    #[serde(default)]
    pub total: Option<SaleorTotal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorMoney {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorTaxedMoney {
    pub gross: SaleorMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorTotal {
    pub net: SaleorMoney,
    pub tax: SaleorMoney,
    pub gross: SaleorMoney,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaleorAddress {
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    pub phone: Option<String>,
    pub street_address1: String,
    pub street_address2: String,
    pub postal_code: String,
    pub city: String,
    pub city_area: String,
    pub country_area: String,
    pub country: Option<SaleorCountry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorCountry {
    pub country: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleorLine {
    #[serde(default)]
    pub variant: Option<SaleorVariant>,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub total_price: Option<SaleorTaxedMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaleorVariant {
    pub sku: Option<String>,
    pub pricing: Option<SaleorPricing>,
    pub product: Option<SaleorProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorPricing {
    #[serde(default)]
    pub price: Option<SaleorTaxedMoney>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaleorProduct {
    pub attributes: Vec<SaleorAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorAttribute {
    pub attribute: SaleorAttributeName,
    #[serde(default)]
    pub values: Vec<SaleorAttributeValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorAttributeName {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaleorAttributeValue {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: GraphQlData,
}

#[derive(Deserialize)]
struct GraphQlData {
    order: Option<SaleorOrder>,
}

impl SaleorOrder {
    /// Parse a GraphQL response or a bare order object.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("data").is_some() {
            let response: GraphQlResponse = serde_json::from_value(value)?;
            response
                .data
                .order
                .ok_or_else(|| FolioError::missing("data.order"))
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Normalize into the engine's order model.
    pub fn into_document(self, defaults: &AdapterDefaults) -> Result<OrderDocument, FolioError> {
        let money = |m: SaleorMoney, field: &str| -> Result<Money, FolioError> {
            let currency = m
                .currency
                .filter(|c| !c.is_empty())
                .or_else(|| defaults.currency.clone())
                .ok_or_else(|| FolioError::missing(format!("{}.currency", field)))?;
            Ok(Money::new(m.amount, currency))
        };

        let address = self.shipping_address.unwrap_or_default();
        let name = join_nonblank(&[address.first_name.as_str(), address.last_name.as_str()], " ");
        let customer = Customer {
            name,
            email: self.user_email.filter(|e| !e.is_empty()),
            company_name: Some(address.company_name).filter(|c| !c.is_empty()),
            phone: address.phone.filter(|p| !p.is_empty()),
            address: PostalAddress {
                street_lines: vec![address.street_address1, address.street_address2],
                city: Some(address.city).filter(|c| !c.is_empty()),
                postal_code: Some(address.postal_code).filter(|p| !p.is_empty()),
                country: address.country.map(|c| c.country).filter(|c| !c.is_empty()),
            },
        };

        let mut line_items = Vec::with_capacity(self.lines.len());
        for (index, line) in self.lines.into_iter().enumerate() {
            let variant = line.variant.unwrap_or_default();
            let unit_price = variant
                .pricing
                .and_then(|pricing| pricing.price)
                .map(|price| money(price.gross, &format!("lines[{}].variant.pricing", index)))
                .transpose()?;
            let subtotal = line
                .total_price
                .map(|total| money(total.gross, &format!("lines[{}].totalPrice", index)))
                .transpose()?;
            let attributes = variant
                .product
                .map(|product| product.attributes)
                .unwrap_or_default()
                .into_iter()
                .map(|a| Attribute {
                    name: a.attribute.name,
                    values: a.values.into_iter().filter_map(|v| v.name).collect(),
                })
                .collect();

            line_items.push(LineItem {
                sku: variant.sku.filter(|s| !s.is_empty()),
                description: line.product_name,
                quantity: line.quantity,
                unit_price,
                subtotal,
                attributes,
            });
        }

        let shipping_cost = self
            .shipping_price
            .map(|price| money(price.gross, "shippingPrice"))
            .transpose()?;
        let totals = self
            .total
            .map(|total| -> Result<Totals, FolioError> {
                Ok(Totals {
                    net: money(total.net, "total.net")?,
                    tax: money(total.tax, "total.tax")?,
                    gross: money(total.gross, "total.gross")?,
                })
            })
            .transpose()?;

        Ok(OrderDocument {
            order_number: self.number,
            created_at: self.created,
            customer,
            shipping_method_name: self.shipping_method_name.filter(|m| !m.is_empty()),
            payment_status_label: self.payment_status_display,
            line_items,
            shipping_cost,
            totals,
        })
    }
}

fn join_nonblank(parts: &[&str], separator: &str) -> Option<String> {
    let joined = parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    (!joined.is_empty()).then_some(joined)
}
