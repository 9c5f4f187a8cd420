//! Test domain: a small stock ledger shared by command handlers.

use std::collections::HashMap;
use std::sync::Mutex;

use microbus::{Command, CommandError};
use serde::{Deserialize, Serialize};

#[derive(Default)]
pub struct Inventory {
    stock: Mutex<HashMap<String, u32>>,
}

impl Inventory {
    pub fn with_stock(items: &[(&str, u32)]) -> Self {
        let stock = items.iter().map(|(sku, n)| (sku.to_string(), *n)).collect();
        Self {
            stock: Mutex::new(stock),
        }
    }

    pub fn available(&self, sku: &str) -> Option<u32> {
        self.stock.lock().ok()?.get(sku).copied()
    }

    pub fn reserve(&self, sku: &str, quantity: u32) -> Result<u32, CommandError> {
        let mut stock = self
            .stock
            .lock()
            .map_err(|_| CommandError::Rejected("inventory unavailable".into()))?;
        let available = stock
            .get_mut(sku)
            .ok_or_else(|| CommandError::NotFound(sku.to_string()))?;
        if *available < quantity {
            return Err(CommandError::Rejected(format!(
                "only {available} of {sku} left"
            )));
        }
        *available -= quantity;
        Ok(*available)
    }

    pub fn release(&self, sku: &str, quantity: u32) -> Result<u32, CommandError> {
        let mut stock = self
            .stock
            .lock()
            .map_err(|_| CommandError::Rejected("inventory unavailable".into()))?;
        let available = stock
            .get_mut(sku)
            .ok_or_else(|| CommandError::NotFound(sku.to_string()))?;
        *available += quantity;
        Ok(*available)
    }
}

#[derive(Debug, Serialize, Deserialize, Command)]
#[command(name = "inventory.reserve", response = "Reserved")]
pub struct ReserveStock {
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, Command)]
#[command(name = "inventory.release", response = "Reserved")]
pub struct ReleaseStock {
    pub sku: String,
    pub quantity: u32,
}

/// Untyped response: decodes into `microbus::Value`.
#[derive(Debug, Serialize, Command)]
#[command(name = "inventory.audit")]
pub struct AuditStock;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Reserved {
    pub sku: String,
    pub remaining: u32,
}
