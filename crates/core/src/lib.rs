pub mod config;
pub mod domain;
pub mod errors;

pub use domain::command::ChatCommand;
pub use domain::conversation::{ConversationId, SessionState};
pub use domain::intent::{Intent, UnknownIntent};
pub use domain::reply::{MenuOption, Reply, ReplyFormat};
pub use errors::ApplicationError;
