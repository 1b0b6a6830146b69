use serde::{Deserialize, Serialize};

use super::{MintId, TradeKind};
use crate::values::EpochSeconds;

/// One recorded market action on a token
///
/// Append-only. Amounts default to 0 when the feed omits them; the receipt
/// timestamp is assigned by this process, never taken from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Owning token (must already be stored)
    pub mint: MintId,
    pub received_at: EpochSeconds,
    /// Trader public key, when the feed provides one
    pub trader: Option<String>,
    pub kind: TradeKind,
    pub token_amount: f64,
    pub sol_amount: f64,
    /// Trader's token balance after the trade
    pub new_token_balance: f64,
    pub bonding_curve_key: Option<String>,
    /// Virtual token reserve of the bonding curve after the trade
    pub curve_token_reserve: f64,
    /// Virtual SOL reserve of the bonding curve after the trade
    pub curve_sol_reserve: f64,
    pub market_cap_sol: f64,
}

impl TradeEvent {
    /// Create an event with every amount zeroed and no optional keys
    pub fn new(mint: impl Into<MintId>, kind: TradeKind, received_at: EpochSeconds) -> Self {
        Self {
            mint: mint.into(),
            received_at,
            trader: None,
            kind,
            token_amount: 0.0,
            sol_amount: 0.0,
            new_token_balance: 0.0,
            bonding_curve_key: None,
            curve_token_reserve: 0.0,
            curve_sol_reserve: 0.0,
            market_cap_sol: 0.0,
        }
    }

    pub fn with_amounts(mut self, token_amount: f64, sol_amount: f64) -> Self {
        self.token_amount = token_amount;
        self.sol_amount = sol_amount;
        self
    }

    pub fn with_trader(mut self, trader: impl Into<String>) -> Self {
        self.trader = Some(trader.into());
        self
    }
}
