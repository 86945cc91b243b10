use serde::Serialize;

use crate::domain::intent::Intent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyFormat {
    #[default]
    Plain,
    Markdown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub label: String,
    pub selection: String,
}

impl From<Intent> for MenuOption {
    fn from(intent: Intent) -> Self {
        Self { label: intent.menu_label().to_owned(), selection: intent.callback_data() }
    }
}

/// Transport-neutral answer to one inbound event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub menu: Vec<MenuOption>,
    /// Sent as a separate message after `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), format: ReplyFormat::Markdown, ..Self::default() }
    }

    pub fn with_menu(mut self, menu: impl IntoIterator<Item = MenuOption>) -> Self {
        self.menu = menu.into_iter().collect();
        self
    }

    pub fn with_follow_up(mut self, follow_up: impl Into<String>) -> Self {
        self.follow_up = Some(follow_up.into());
        self
    }
}
