use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::CartLine;
use crate::errors::CheckoutError;

pub const TAX_RATE: f64 = 0.1;
pub const SHIPPING_COST: f64 = 0.0;

/// Money owed for a cart, as shown on the cart and checkout pages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CheckoutSummary {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl CheckoutSummary {
    pub fn for_subtotal(subtotal: f64) -> Self {
        let tax = round_cents(subtotal * TAX_RATE);
        CheckoutSummary {
            subtotal,
            shipping: SHIPPING_COST,
            tax,
            total: round_cents(subtotal + SHIPPING_COST + tax),
        }
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Contact and shipping details collected from a guest shopper.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl GuestDetails {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(name));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_number: String,
    pub customer: GuestDetails,
    pub lines: Vec<CartLine>,
    pub summary: CheckoutSummary,
    pub placed_at: DateTime<Utc>,
}

pub(crate) fn new_order_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..8].to_uppercase())
}
