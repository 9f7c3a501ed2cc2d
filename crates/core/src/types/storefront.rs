//! Storefront models handed to the dispatcher.
//!
//! These mirror what the storefront already holds in its session and cart:
//! the logged-in user, checkout personal details, catalog products, the cart
//! and placed orders. Field names accept the storefront's own JSON spelling.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Logged-in storefront user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub email: String,
    #[serde(default, alias = "first_name", skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, alias = "last_name", skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(
        default,
        alias = "phoneNumber",
        alias = "phone_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub telephone: Option<String>,
}

impl User {
    /// A user known only by email (newsletter-only visitors).
    #[must_use]
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

/// Personal details entered at checkout by a guest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub email_address: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Catalog product, or a cart/order line when `qty` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub sku: String,
    /// SKU of the configurable parent when this is a child variant.
    #[serde(default, alias = "parentSku", skip_serializing_if = "Option::is_none")]
    pub parent_sku: Option<String>,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qty: Option<u32>,
}

impl Product {
    /// Key under which a back-in-stock watch for this product is stored.
    ///
    /// Child variants are keyed `{parent_sku}-{sku}`, everything else by SKU.
    #[must_use]
    pub fn watch_key(&self) -> String {
        self.parent_sku.as_ref().map_or_else(
            || self.sku.clone(),
            |parent| format!("{parent}-{}", self.sku),
        )
    }

    /// Price the customer pays per unit.
    #[must_use]
    pub fn final_price(&self) -> Decimal {
        self.special_price.unwrap_or(self.price)
    }

    /// Quantity on the line, `1` for catalog products.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.qty.unwrap_or(1)
    }

    /// Line total: unit price times quantity.
    #[must_use]
    pub fn row_total(&self) -> Decimal {
        self.final_price() * Decimal::from(self.quantity())
    }
}

/// Shopping cart at checkout start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<Product>,
    pub grand_total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_url: Option<String>,
}

/// Placed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    #[serde(default)]
    pub products: Vec<Product>,
    pub grand_total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(sku: &str, parent: Option<&str>) -> Product {
        Product {
            id: 7,
            sku: sku.to_string(),
            parent_sku: parent.map(String::from),
            name: "Glow Serum".to_string(),
            price: Decimal::new(2500, 2),
            ..Product::default()
        }
    }

    #[test]
    fn test_watch_key() {
        assert_eq!(product("SER-30", None).watch_key(), "SER-30");
        assert_eq!(product("SER-30", Some("SER")).watch_key(), "SER-SER-30");
    }

    #[test]
    fn test_row_total_prefers_special_price() {
        let mut line = product("SER-30", None);
        line.qty = Some(3);
        assert_eq!(line.row_total(), Decimal::new(7500, 2));

        line.special_price = Some(Decimal::new(2000, 2));
        assert_eq!(line.row_total(), Decimal::new(6000, 2));
    }

    #[test]
    fn test_storefront_spellings() {
        let user: User = serde_json::from_value(json!({
            "email": "jo@example.com",
            "firstname": "Jo",
            "phoneNumber": "+15550100"
        }))
        .unwrap();
        assert_eq!(user.firstname.as_deref(), Some("Jo"));
        assert_eq!(user.telephone.as_deref(), Some("+15550100"));

        let details: PersonalDetails = serde_json::from_value(json!({
            "emailAddress": "guest@example.com",
            "firstName": "Guest"
        }))
        .unwrap();
        assert_eq!(details.email_address, "guest@example.com");

        let child: Product = serde_json::from_value(json!({
            "id": 9, "sku": "S-1", "parentSku": "S", "name": "Soap", "price": 4.5
        }))
        .unwrap();
        assert_eq!(child.watch_key(), "S-S-1");
    }
}
