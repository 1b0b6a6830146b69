//! Pumpstream Gateway
//!
//! Owns the live feed connection and the set of subscriptions on it:
//! - **Transport**: `FeedConnector` seam with a WebSocket implementation and
//!   an in-process channel implementation
//! - **Supervisor**: `Disconnected → Connecting → Connected` state machine with
//!   exponential reconnect backoff
//! - **Reconciler**: subscription queue replayed from the store on every
//!   new connection
//!
//! ## Architecture
//!
//! ```text
//!   Feed endpoint
//!         │ WebSocket
//!    ┌────▼─────────────────┐  on_connected  ┌────────────────────────┐
//!    │ ConnectionSupervisor │───────────────►│ SubscriptionReconciler │◄── enqueue(mint)
//!    │  (backoff, state)    │                │  (pending, subscribed) │
//!    └────┬──────────▲──────┘                └───────────┬────────────┘
//!         │ receive  │ FeedSender (shared send handle)   │ subscribe commands
//!         ▼          └───────────────────────────────────┘
//!   Ingestion loop
//! ```

pub mod backoff;
pub mod error;
pub mod reconciler;
pub mod supervisor;
pub mod transport;

// Re-export commonly used types
pub use backoff::Backoff;
pub use error::{GatewayError, TransportError};
pub use reconciler::{ReconcilerConfig, SubscriptionReconciler};
pub use supervisor::{ConnectionObserver, ConnectionState, ConnectionSupervisor};
pub use transport::{
    FeedConnector, FeedLink, FeedSender, LinkEvent, Outbound,
    channel::{ChannelConnector, RemoteFeed},
    websocket::WsConnector,
};
