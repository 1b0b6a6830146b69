use serde::{Deserialize, Serialize};

/// Kind of a recorded trade event
///
/// The wire and storage spelling is the feed's `txType` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    /// Synthetic record accompanying a token creation
    #[serde(rename = "create")]
    Creation,
    Buy,
    Sell,
}

impl TradeKind {
    /// Parse the feed's `txType` value. Unknown kinds yield `None`.
    pub fn from_wire(tx_type: &str) -> Option<Self> {
        match tx_type {
            "create" => Some(TradeKind::Creation),
            "buy" => Some(TradeKind::Buy),
            "sell" => Some(TradeKind::Sell),
            _ => None,
        }
    }

    /// The `txType` spelling, also used as the stored kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Creation => "create",
            TradeKind::Buy => "buy",
            TradeKind::Sell => "sell",
        }
    }

    /// Returns true for buys and sells (market trades, not creations)
    pub fn is_market_trade(&self) -> bool {
        matches!(self, TradeKind::Buy | TradeKind::Sell)
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
