//! Storefront models to Klaviyo property objects.
//!
//! Property names follow Klaviyo's e-commerce conventions so the standard
//! flows (browse abandonment, abandoned cart, post-purchase) pick them up.

use serde_json::{Map, Value, json};
use storefront_klaviyo_core::{Cart, Order, PersonalDetails, Product, User};

use crate::customer::Customer;

/// Customer properties of a logged-in user.
#[must_use]
pub fn map_customer(user: &User) -> Customer {
    let mut customer = Customer::default();
    customer.set("$email", user.email.clone());

    if let Some(id) = user.id {
        customer.set("$id", id);
    }
    if let Some(first_name) = &user.firstname {
        customer.set("$first_name", first_name.clone());
    }
    if let Some(last_name) = &user.lastname {
        customer.set("$last_name", last_name.clone());
    }
    if let Some(phone) = &user.telephone {
        customer.set("$phone_number", phone.clone());
    }

    customer
}

/// Customer properties of a guest at checkout.
#[must_use]
pub fn map_personal_details(details: &PersonalDetails) -> Customer {
    let mut customer = Customer::default();
    customer.set("$email", details.email_address.clone());

    if let Some(first_name) = &details.first_name {
        customer.set("$first_name", first_name.clone());
    }
    if let Some(last_name) = &details.last_name {
        customer.set("$last_name", last_name.clone());
    }

    customer
}

/// `Viewed Product` properties.
#[must_use]
pub fn map_product(product: &Product) -> Value {
    let mut properties = Map::new();
    properties.insert("ProductName".into(), json!(product.name));
    properties.insert("ProductID".into(), json!(product.id));
    properties.insert("SKU".into(), json!(product.sku));
    properties.insert("Categories".into(), json!(product.categories));
    properties.insert("ImageURL".into(), json!(product.image));
    properties.insert("URL".into(), json!(product.url));
    properties.insert("Price".into(), json!(product.final_price()));

    if product.special_price.is_some() {
        properties.insert("CompareAtPrice".into(), json!(product.price));
    }

    Value::Object(properties)
}

/// `Added to Cart Product` / `Removed from Cart Product` properties.
#[must_use]
pub fn map_line_item(product: &Product) -> Value {
    json!({
        "$value": product.row_total(),
        "AddedItemProductName": product.name,
        "AddedItemProductID": product.id,
        "AddedItemSKU": product.sku,
        "AddedItemCategories": product.categories,
        "AddedItemImageURL": product.image,
        "AddedItemURL": product.url,
        "AddedItemPrice": product.final_price(),
        "AddedItemQuantity": product.quantity(),
    })
}

/// `Started Checkout` properties.
#[must_use]
pub fn map_cart(cart: &Cart) -> Value {
    json!({
        "$event_id": checkout_event_id(cart),
        "$value": cart.grand_total,
        "ItemNames": item_names(&cart.items),
        "Categories": categories(&cart.items),
        "CheckoutURL": cart.checkout_url,
        "Items": cart.items.iter().map(map_item).collect::<Vec<_>>(),
    })
}

/// `Placed Order` properties.
#[must_use]
pub fn map_order(order: &Order) -> Value {
    json!({
        "$event_id": order.order_id,
        "$value": order.grand_total,
        "OrderId": order.order_id,
        "DiscountCode": order.coupon_code,
        "DiscountValue": order.discount_amount,
        "ItemNames": item_names(&order.products),
        "Categories": categories(&order.products),
        "Items": order.products.iter().map(map_item).collect::<Vec<_>>(),
    })
}

/// `Ordered Product` properties, one event per order line.
#[must_use]
pub fn map_ordered_product(order: &Order, product: &Product) -> Value {
    json!({
        "$event_id": format!("{}_{}", order.order_id, product.sku),
        "$value": product.row_total(),
        "OrderId": order.order_id,
        "ProductID": product.id,
        "SKU": product.sku,
        "ProductName": product.name,
        "Quantity": product.quantity(),
        "ProductURL": product.url,
        "ImageURL": product.image,
        "Categories": product.categories,
    })
}

/// Line entry inside cart and order `Items`.
fn map_item(product: &Product) -> Value {
    json!({
        "ProductID": product.id,
        "SKU": product.sku,
        "ProductName": product.name,
        "Quantity": product.quantity(),
        "ItemPrice": product.final_price(),
        "RowTotal": product.row_total(),
        "ProductURL": product.url,
        "ImageURL": product.image,
        "ProductCategories": product.categories,
    })
}

fn item_names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

/// Distinct categories across lines, first occurrence order.
fn categories(products: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in products.iter().flat_map(|p| &p.categories) {
        if !seen.contains(&category.as_str()) {
            seen.push(category);
        }
    }
    seen
}

/// Checkout has no natural ID; SKUs and quantities stand in so repeated
/// `Started Checkout` events for an unchanged cart deduplicate.
fn checkout_event_id(cart: &Cart) -> String {
    cart.items
        .iter()
        .map(|p| format!("{}x{}", p.sku, p.quantity()))
        .collect::<Vec<_>>()
        .join("_")
}
