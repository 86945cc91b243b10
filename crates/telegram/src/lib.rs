//! Telegram Bot API transport
//!
//! - **Polling** (`polling`) - `getUpdates` long polling with reconnect backoff
//! - **Events** (`events`) - update normalization and dispatch to a [`ChatService`]
//! - **Commands** (`commands`) - `/start`, `/law <topic>`, ... parsing
//! - **Keyboard** (`keyboard`) - message builders, inline menus, 4096-char splitting
//! - **API** (`api`) - reqwest client for the Bot API methods the bot uses
//!
//! ```text
//! getUpdates → PollingRunner → UpdateDispatcher → ChatService
//!                                    ↓
//!              sendMessage / editMessageText ← Reply
//! ```

pub mod api;
pub mod commands;
pub mod events;
pub mod keyboard;
pub mod polling;

#[cfg(test)]
pub(crate) mod testing;

pub use api::BotApi;
pub use events::{ChatService, EventContext, HandlerResult, ReplySink, UpdateDispatcher};
pub use polling::{PollingError, PollingRunner, ReconnectPolicy, TransportError, UpdateTransport};
