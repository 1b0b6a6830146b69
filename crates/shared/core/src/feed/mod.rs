//! Feed wire shapes
//!
//! Inbound frames are decoded into [`FeedMessage`] (every field optional and
//! leniently typed), then validated into a [`FeedEvent`] discriminated by
//! `txType`. Outbound frames are [`SubscribeCommand`]s.

mod command;
mod error;
mod message;

pub use command::SubscribeCommand;
pub use error::{MessageError, ValidationError};
pub use message::{FeedEvent, FeedMessage};
