mod mint;
mod token;
mod trade;
mod trade_kind;

pub use mint::MintId;
pub use token::Token;
pub use trade::TradeEvent;
pub use trade_kind::TradeKind;
