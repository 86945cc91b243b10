use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::intent::Intent;

/// Chat identifier assigned by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub pending_intent: Option<Intent>,
    pub language: Option<String>,
}

impl SessionState {
    /// Takes the pending selection so it applies to exactly one message.
    pub fn take_pending_intent(&mut self) -> Option<Intent> {
        self.pending_intent.take()
    }

    pub fn set_pending_intent(&mut self, intent: Intent) {
        self.pending_intent = Some(intent);
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }
}
