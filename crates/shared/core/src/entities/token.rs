use serde::{Deserialize, Serialize};

use super::MintId;
use crate::values::EpochSeconds;

/// A discovered token
///
/// Written once, on the first creation event for its mint, and never
/// mutated afterwards. A second creation event for the same mint is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub mint: MintId,
    /// Receipt time of the creation event
    pub discovered_at: EpochSeconds,
    /// Creator's initial buy in SOL (0 when absent upstream)
    pub initial_liquidity: f64,
    pub name: String,
    pub symbol: String,
}

impl Token {
    pub fn new(mint: impl Into<MintId>, discovered_at: EpochSeconds) -> Self {
        Self {
            mint: mint.into(),
            discovered_at,
            initial_liquidity: 0.0,
            name: String::new(),
            symbol: String::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.name = name.into();
        self.symbol = symbol.into();
        self
    }

    pub fn with_initial_liquidity(mut self, amount: f64) -> Self {
        self.initial_liquidity = amount;
        self
    }
}
