//! Per-device shopping cart.
//!
//! `CartStore` owns the lines in memory and writes a full snapshot to its
//! storage slot after every mutation. Persistence failures are logged and
//! otherwise ignored, so callers must not rely on a write having landed.
//! Two processes sharing one slot race; the last write wins.

mod checkout;
mod storage;

use serde::{Deserialize, Serialize};

pub use checkout::{CheckoutSummary, GuestDetails, OrderConfirmation, SHIPPING_COST, TAX_RATE};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

use crate::errors::{CartError, CheckoutError};

/// Storage slot holding the serialized cart.
pub const CART_SLOT: &str = "cart";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub image: String,
    pub quantity: u32,
}

/// Product details captured when an item is added.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub image: String,
}

pub struct CartStore {
    lines: Vec<CartLine>,
    storage: Box<dyn KeyValueStorage>,
}

impl CartStore {
    /// Opens the cart saved in `storage`, starting empty when the slot is
    /// missing or unreadable.
    pub fn open(storage: impl KeyValueStorage + 'static) -> Self {
        let lines = load_snapshot(&storage);
        CartStore {
            lines,
            storage: Box::new(storage),
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn add_item(&mut self, item: NewCartItem) {
        match self.lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                id: item.id,
                name: item.name,
                price: item.price,
                image: item.image,
                quantity: 1,
            }),
        }
        self.persist();
    }

    /// Replaces a line's quantity. Zero or below removes the line; an unknown
    /// id changes nothing.
    pub fn set_quantity(&mut self, id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
            self.persist();
        }
    }

    pub fn remove_item(&mut self, id: i64) {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);
        if self.lines.len() != before {
            self.persist();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn subtotal(&self) -> f64 {
        self.lines
            .iter()
            .map(|line| line.price * f64::from(line.quantity))
            .sum()
    }

    pub fn summary(&self) -> CheckoutSummary {
        CheckoutSummary::for_subtotal(self.subtotal())
    }

    /// Places a guest order for everything in the cart and empties it.
    pub fn checkout(&mut self, customer: GuestDetails) -> Result<OrderConfirmation, CheckoutError> {
        if self.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        customer.validate()?;

        let confirmation = OrderConfirmation {
            order_number: checkout::new_order_number(),
            summary: self.summary(),
            lines: std::mem::take(&mut self.lines),
            customer,
            placed_at: chrono::Utc::now(),
        };
        self.persist();
        log::info!(
            "Placed order {} for {} items",
            confirmation.order_number,
            confirmation.lines.iter().map(|l| u64::from(l.quantity)).sum::<u64>()
        );
        Ok(confirmation)
    }

    fn persist(&mut self) {
        let snapshot = match serde_json::to_string(&self.lines) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize cart: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(CART_SLOT, &snapshot) {
            log::warn!("Failed to persist cart: {}", e);
        }
    }
}

fn load_snapshot(storage: &dyn KeyValueStorage) -> Vec<CartLine> {
    let raw = match storage.get(CART_SLOT) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Failed to read saved cart, starting empty: {}", e);
            return Vec::new();
        }
    };
    let saved: Vec<CartLine> = match serde_json::from_str(&raw) {
        Ok(lines) => lines,
        Err(e) => {
            log::warn!("Discarding corrupt saved cart: {}", e);
            return Vec::new();
        }
    };

    // keep the first line per id and drop empty lines
    let mut lines: Vec<CartLine> = Vec::with_capacity(saved.len());
    for line in saved {
        if line.quantity > 0 && !lines.iter().any(|kept| kept.id == line.id) {
            lines.push(line);
        }
    }
    lines
}

/// Composition-root slot for the device's cart.
#[derive(Default)]
pub struct CartContext {
    store: Option<CartStore>,
}

impl CartContext {
    pub fn new() -> Self {
        CartContext::default()
    }

    pub fn initialize(&mut self, storage: impl KeyValueStorage + 'static) -> &mut CartStore {
        self.store.insert(CartStore::open(storage))
    }

    pub fn store(&self) -> Result<&CartStore, CartError> {
        self.store.as_ref().ok_or(CartError::NotInitialized)
    }

    pub fn store_mut(&mut self) -> Result<&mut CartStore, CartError> {
        self.store.as_mut().ok_or(CartError::NotInitialized)
    }
}
