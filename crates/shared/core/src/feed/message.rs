use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use super::error::{MessageError, ValidationError};
use crate::entities::{MintId, Token, TradeEvent, TradeKind};
use crate::values::EpochSeconds;

/// Inbound feed frame as decoded from JSON
///
/// The feed is only partially trusted: every field is optional, numeric
/// fields accept numbers, numeric strings or null, and unknown fields are
/// ignored. Use [`FeedMessage::into_event`] to obtain a typed event.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMessage {
    #[serde(default)]
    pub mint: Option<String>,
    #[serde(default)]
    pub tx_type: Option<String>,

    // Creation metadata
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub initial_buy: f64,

    // Trade fields
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub trader_public_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub token_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sol_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub new_token_balance: f64,
    #[serde(default)]
    pub bonding_curve_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub v_tokens_in_bonding_curve: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub v_sol_in_bonding_curve: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap_sol: f64,
}

/// Validated feed event, discriminated by `txType`
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// A new token: the token row plus the raw creation record
    Created {
        token: Token,
        trade: TradeEvent,
        uri: Option<String>,
    },
    /// A buy or sell on a known token
    Traded(TradeEvent),
    /// A kind this engine does not store (forward compatibility)
    Unrecognized { mint: MintId, tx_type: String },
}

impl FeedEvent {
    pub fn mint(&self) -> &MintId {
        match self {
            FeedEvent::Created { token, .. } => &token.mint,
            FeedEvent::Traded(trade) => &trade.mint,
            FeedEvent::Unrecognized { mint, .. } => mint,
        }
    }

    /// The wire `txType` of the event
    pub fn tx_type(&self) -> &str {
        match self {
            FeedEvent::Created { .. } => TradeKind::Creation.as_str(),
            FeedEvent::Traded(trade) => trade.kind.as_str(),
            FeedEvent::Unrecognized { tx_type, .. } => tx_type,
        }
    }
}

impl FeedMessage {
    /// Decode a raw text frame
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode and validate in one step
    pub fn parse(raw: &str, received_at: EpochSeconds) -> Result<FeedEvent, MessageError> {
        Ok(Self::decode(raw)?.into_event(received_at)?)
    }

    /// Validate the frame and build the typed event, stamping it with the
    /// local receipt time.
    pub fn into_event(self, received_at: EpochSeconds) -> Result<FeedEvent, ValidationError> {
        let mint = match self.mint.as_deref() {
            Some(m) if !m.is_empty() => MintId::new(m),
            _ => return Err(ValidationError::MissingMint),
        };
        let tx_type = match self.tx_type.as_deref() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ValidationError::MissingTxType),
        };

        let Some(kind) = TradeKind::from_wire(&tx_type) else {
            return Ok(FeedEvent::Unrecognized { mint, tx_type });
        };

        let trade = TradeEvent {
            mint: mint.clone(),
            received_at,
            trader: self.trader_public_key,
            kind,
            token_amount: self.token_amount,
            sol_amount: self.sol_amount,
            new_token_balance: self.new_token_balance,
            bonding_curve_key: self.bonding_curve_key,
            curve_token_reserve: self.v_tokens_in_bonding_curve,
            curve_sol_reserve: self.v_sol_in_bonding_curve,
            market_cap_sol: self.market_cap_sol,
        };

        match kind {
            TradeKind::Creation => {
                let token = Token {
                    mint,
                    discovered_at: received_at,
                    initial_liquidity: self.initial_buy,
                    name: self.name.unwrap_or_default(),
                    symbol: self.symbol.unwrap_or_default(),
                };
                Ok(FeedEvent::Created {
                    token,
                    trade,
                    uri: self.uri,
                })
            }
            TradeKind::Buy | TradeKind::Sell => Ok(FeedEvent::Traded(trade)),
        }
    }
}

/// Accept a JSON number, a numeric string, or null; absent and null mean 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Number(f64),
        Text(String),
    }

    match Option::<Lenient>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Lenient::Number(n)) => Ok(n),
        Some(Lenient::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| D::Error::custom(format!("not a number: {s:?}")))
        }
    }
}
