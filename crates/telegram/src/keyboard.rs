use legaltune_core::{MenuOption, Reply, ReplyFormat};
use serde::Serialize;

/// Hard limit on the text of a single Bot API message.
pub const MESSAGE_CHAR_LIMIT: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: callback_data.into() }
    }
}

impl From<&MenuOption> for InlineKeyboardButton {
    fn from(option: &MenuOption) -> Self {
        Self::new(option.label.clone(), option.selection.clone())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// One button per row, in the given order.
    pub fn single_column<'a>(options: impl IntoIterator<Item = &'a MenuOption>) -> Self {
        Self {
            inline_keyboard: options
                .into_iter()
                .map(|option| vec![InlineKeyboardButton::from(option)])
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inline_keyboard.iter().all(Vec::is_empty)
    }
}

/// Body of `sendMessage`; `editMessageText` reuses it with a message id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    pub fn without_formatting(&self) -> Self {
        Self { parse_mode: None, ..self.clone() }
    }
}

pub struct MessageBuilder {
    chat_id: i64,
    text: String,
    parse_mode: Option<ParseMode>,
    keyboard: Option<InlineKeyboardMarkup>,
}

impl MessageBuilder {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self { chat_id, text: text.into(), parse_mode: None, keyboard: None }
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Markdown);
        self
    }

    pub fn keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        if !keyboard.is_empty() {
            self.keyboard = Some(keyboard);
        }
        self
    }

    pub fn build(self) -> OutgoingMessage {
        OutgoingMessage {
            chat_id: self.chat_id,
            text: self.text,
            parse_mode: self.parse_mode,
            reply_markup: self.keyboard,
        }
    }
}

/// Messages for the primary part of a reply. Oversized text is split into
/// consecutive messages; the menu rides on the last one.
pub fn primary_messages(chat_id: i64, reply: &Reply) -> Vec<OutgoingMessage> {
    let chunks = split_text(&reply.text, MESSAGE_CHAR_LIMIT);
    let last = chunks.len().saturating_sub(1);

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut builder = MessageBuilder::new(chat_id, chunk);
            if reply.format == ReplyFormat::Markdown {
                builder = builder.markdown();
            }
            if index == last {
                builder = builder.keyboard(InlineKeyboardMarkup::single_column(&reply.menu));
            }
            builder.build()
        })
        .collect()
}

pub fn follow_up_messages(chat_id: i64, reply: &Reply) -> Vec<OutgoingMessage> {
    reply
        .follow_up
        .as_deref()
        .map(|text| {
            split_text(text, MESSAGE_CHAR_LIMIT)
                .into_iter()
                .map(|chunk| MessageBuilder::new(chat_id, chunk).build())
                .collect()
        })
        .unwrap_or_default()
}

/// Splits `text` into pieces of at most `limit` characters, preferring to
/// break after a newline. Always returns at least one piece.
pub fn split_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        let hard_end = rest.char_indices().nth(limit).map_or(rest.len(), |(index, _)| index);
        let cut = rest[..hard_end]
            .rfind('\n')
            .map(|newline| newline + 1)
            .unwrap_or(hard_end);
        chunks.push(rest[..cut].to_owned());
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_owned());
    }
    chunks
}
