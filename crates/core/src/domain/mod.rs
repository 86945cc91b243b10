pub mod command;
pub mod conversation;
pub mod intent;
pub mod reply;
