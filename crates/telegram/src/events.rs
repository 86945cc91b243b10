use std::sync::Arc;

use async_trait::async_trait;
use legaltune_core::{ChatCommand, ConversationId, Intent, Reply};
use thiserror::Error;
use tracing::{info, warn};

use crate::api::Update;
use crate::commands::parse_command;
use crate::keyboard::{follow_up_messages, primary_messages, MessageBuilder, OutgoingMessage};
use crate::polling::TransportError;

pub const PROCESSING_STATUS: &str = "🔍 Processing...";
pub const ANALYZING_STATUS: &str = "🔍 Analyzing...";
/// Photos arrive without a name; they are analysed as PNG images.
pub const PHOTO_FILE_NAME: &str = "image.png";
const UNNAMED_DOCUMENT: &str = "document";

pub fn received_file_status(file_name: &str) -> String {
    format!("🔍 Received {file_name}. Analyzing content...")
}

/// Transport-neutral view of one Telegram update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    Command { chat_id: i64, first_name: Option<String>, command: ChatCommand },
    Text { chat_id: i64, text: String },
    Callback { chat_id: i64, message_id: Option<i64>, callback_id: String, data: String },
    File { chat_id: i64, file_id: String, file_name: String },
    Unsupported { update_id: i64 },
}

impl InboundEvent {
    pub fn from_update(update: &Update) -> Self {
        if let Some(query) = &update.callback_query {
            return Self::Callback {
                chat_id: update.chat_id().unwrap_or(query.from.id),
                message_id: query.message.as_ref().map(|message| message.message_id),
                callback_id: query.id.clone(),
                data: query.data.clone().unwrap_or_default(),
            };
        }

        let Some(message) = &update.message else {
            return Self::Unsupported { update_id: update.update_id };
        };
        let chat_id = message.chat.id;

        if let Some(document) = &message.document {
            return Self::File {
                chat_id,
                file_id: document.file_id.clone(),
                file_name: document
                    .file_name
                    .clone()
                    .unwrap_or_else(|| UNNAMED_DOCUMENT.to_owned()),
            };
        }
        if let Some(largest) = message.photo.as_ref().and_then(|sizes| sizes.last()) {
            return Self::File {
                chat_id,
                file_id: largest.file_id.clone(),
                file_name: PHOTO_FILE_NAME.to_owned(),
            };
        }

        match message.text.as_deref() {
            Some(text) => match parse_command(text) {
                Some(command) => Self::Command {
                    chat_id,
                    first_name: message.from.as_ref().map(|user| user.first_name.clone()),
                    command,
                },
                None => Self::Text { chat_id, text: text.to_owned() },
            },
            None => Self::Unsupported { update_id: update.update_id },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Text { .. } => "text",
            Self::Callback { .. } => "callback",
            Self::File { .. } => "file",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Reply),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Application side of the bot.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn on_text(&self, conversation: ConversationId, text: &str) -> Reply;
    async fn on_callback(&self, conversation: ConversationId, selection: &str) -> Reply;
    async fn on_file(&self, conversation: ConversationId, bytes: &[u8], file_name: &str) -> Reply;
    async fn on_command(
        &self,
        conversation: ConversationId,
        first_name: Option<&str>,
        command: &ChatCommand,
    ) -> Reply;
}

/// Outbound side of the Bot API.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Returns the id of the sent message.
    async fn send(&self, message: &OutgoingMessage) -> Result<i64, TransportError>;
    async fn edit(&self, message_id: i64, message: &OutgoingMessage) -> Result<(), TransportError>;
    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), TransportError>;
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError>;
}

pub struct UpdateDispatcher {
    service: Arc<dyn ChatService>,
    sink: Arc<dyn ReplySink>,
}

impl UpdateDispatcher {
    pub fn new(service: Arc<dyn ChatService>, sink: Arc<dyn ReplySink>) -> Self {
        Self { service, sink }
    }

    pub async fn dispatch(
        &self,
        update: &Update,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let event = InboundEvent::from_update(update);
        info!(
            event_name = "ingress.telegram.event_dispatched",
            correlation_id = %ctx.correlation_id,
            event_type = event.kind(),
            "dispatching telegram event"
        );

        let reply = match event {
            InboundEvent::Command { chat_id, first_name, command } => {
                let placeholder = match &command {
                    ChatCommand::Law(topic) if !topic.is_empty() => {
                        Some(self.post_status(chat_id, ANALYZING_STATUS).await?)
                    }
                    _ => None,
                };
                let reply = self
                    .service
                    .on_command(ConversationId(chat_id), first_name.as_deref(), &command)
                    .await;
                self.deliver(chat_id, placeholder, &reply).await?;
                reply
            }
            InboundEvent::Text { chat_id, text } => {
                let placeholder = self.post_status(chat_id, PROCESSING_STATUS).await?;
                let reply = self.service.on_text(ConversationId(chat_id), &text).await;
                self.deliver(chat_id, Some(placeholder), &reply).await?;
                reply
            }
            InboundEvent::Callback { chat_id, message_id, callback_id, data } => {
                if let Err(error) = self.sink.answer_callback(&callback_id).await {
                    warn!(
                        correlation_id = %ctx.correlation_id,
                        error = %error,
                        "failed to answer callback query"
                    );
                }
                let reply = self.service.on_callback(ConversationId(chat_id), &data).await;
                // The policy goes out as its own message and leaves the menu in place.
                let target = if data == Intent::Privacy.callback_data() { None } else { message_id };
                self.deliver(chat_id, target, &reply).await?;
                reply
            }
            InboundEvent::File { chat_id, file_id, file_name } => {
                let placeholder = self.post_status(chat_id, &received_file_status(&file_name)).await?;
                let reply = match self.sink.download(&file_id).await {
                    Ok(bytes) => {
                        self.service.on_file(ConversationId(chat_id), &bytes, &file_name).await
                    }
                    Err(error) => {
                        warn!(
                            correlation_id = %ctx.correlation_id,
                            error = %error,
                            "file download failed"
                        );
                        Reply::plain(format!("⚠️ Error: {error}"))
                    }
                };
                self.deliver(chat_id, Some(placeholder), &reply).await?;
                reply
            }
            InboundEvent::Unsupported { .. } => return Ok(HandlerResult::Ignored),
        };

        Ok(HandlerResult::Responded(reply))
    }

    async fn post_status(&self, chat_id: i64, status: &str) -> Result<i64, TransportError> {
        self.sink.send(&MessageBuilder::new(chat_id, status).build()).await
    }

    /// Writes the reply into `placeholder` when there is one, otherwise sends
    /// it fresh. Overflow chunks and the follow-up go out as new messages.
    async fn deliver(
        &self,
        chat_id: i64,
        placeholder: Option<i64>,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        let mut pending_edit = placeholder;
        for message in primary_messages(chat_id, reply) {
            match pending_edit.take() {
                Some(message_id) => self.edit_with_fallback(message_id, &message).await?,
                None => self.send_with_fallback(&message).await?,
            }
        }
        for message in follow_up_messages(chat_id, reply) {
            self.send_with_fallback(&message).await?;
        }
        Ok(())
    }

    async fn send_with_fallback(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        match self.sink.send(message).await {
            Err(TransportError::Api { .. }) if message.parse_mode.is_some() => {
                warn!("markdown rejected by bot api; resending as plain text");
                self.sink.send(&message.without_formatting()).await.map(|_| ())
            }
            other => other.map(|_| ()),
        }
    }

    async fn edit_with_fallback(
        &self,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        match self.sink.edit(message_id, message).await {
            Err(TransportError::Api { .. }) if message.parse_mode.is_some() => {
                warn!("markdown rejected by bot api; editing as plain text");
                self.sink.edit(message_id, &message.without_formatting()).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use legaltune_core::{ChatCommand, ConversationId, Intent, MenuOption, Reply};
    use serde_json::json;
    use tokio::sync::Mutex;

    use super::{
        ChatService, EventContext, HandlerResult, InboundEvent, UpdateDispatcher,
        ANALYZING_STATUS, PROCESSING_STATUS,
    };
    use crate::api::Update;
    use crate::keyboard::{ParseMode, MESSAGE_CHAR_LIMIT};
    use crate::testing::{RecordingSink, SinkCall};

    #[derive(Default)]
    struct ScriptedService {
        files: Mutex<Vec<(i64, Vec<u8>, String)>>,
        reply: Option<Reply>,
    }

    impl ScriptedService {
        fn replying(reply: Reply) -> Self {
            Self { reply: Some(reply), ..Self::default() }
        }

        fn answer(&self, fallback: &str) -> Reply {
            self.reply.clone().unwrap_or_else(|| Reply::plain(fallback))
        }
    }

    #[async_trait]
    impl ChatService for ScriptedService {
        async fn on_text(&self, _conversation: ConversationId, text: &str) -> Reply {
            self.answer(&format!("text:{text}"))
        }

        async fn on_callback(&self, _conversation: ConversationId, selection: &str) -> Reply {
            self.answer(&format!("callback:{selection}"))
        }

        async fn on_file(&self, conversation: ConversationId, bytes: &[u8], file_name: &str) -> Reply {
            self.files.lock().await.push((conversation.0, bytes.to_vec(), file_name.to_owned()));
            self.answer("file")
        }

        async fn on_command(
            &self,
            _conversation: ConversationId,
            first_name: Option<&str>,
            command: &ChatCommand,
        ) -> Reply {
            match command {
                ChatCommand::Start => Reply::markdown(format!("Hello {}", first_name.unwrap_or("?")))
                    .with_menu(Intent::MENU.map(MenuOption::from)),
                other => self.answer(&format!("command:{}", other.name())),
            }
        }
    }

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).expect("update should decode")
    }

    fn text(update_id: i64, text: &str) -> Update {
        update(json!({
            "update_id": update_id,
            "message": {
                "message_id": 100,
                "chat": { "id": 55 },
                "from": { "id": 3, "first_name": "Arjun" },
                "text": text
            }
        }))
    }

    fn dispatcher(service: ScriptedService, sink: Arc<RecordingSink>) -> UpdateDispatcher {
        UpdateDispatcher::new(Arc::new(service), sink)
    }

    #[test]
    fn photo_uses_largest_size_and_fixed_name() {
        let event = InboundEvent::from_update(&update(json!({
            "update_id": 1,
            "message": {
                "message_id": 4,
                "chat": { "id": 55 },
                "photo": [
                    { "file_id": "thumb", "width": 90, "height": 60 },
                    { "file_id": "full", "width": 1280, "height": 853 }
                ]
            }
        })));

        assert_eq!(
            event,
            InboundEvent::File { chat_id: 55, file_id: "full".to_owned(), file_name: "image.png".to_owned() }
        );
    }

    #[test]
    fn slash_text_becomes_command_with_sender_name() {
        let event = InboundEvent::from_update(&text(1, "/law IPC 302"));

        assert_eq!(
            event,
            InboundEvent::Command {
                chat_id: 55,
                first_name: Some("Arjun".to_owned()),
                command: ChatCommand::Law("IPC 302".to_owned()),
            }
        );
    }

    #[tokio::test]
    async fn text_reply_replaces_processing_placeholder() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());

        let result = dispatcher
            .dispatch(&text(1, "what is bail"), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Responded(Reply::plain("text:what is bail")));
        let calls = sink.calls().await;
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], SinkCall::Send(message) if message.text == PROCESSING_STATUS));
        assert!(matches!(&calls[1], SinkCall::Edit(1, message) if message.text == "text:what is bail"));
    }

    #[tokio::test]
    async fn start_sends_markdown_menu_without_placeholder() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());

        dispatcher.dispatch(&text(1, "/start"), &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert_eq!(calls.len(), 1);
        let SinkCall::Send(message) = &calls[0] else { panic!("expected send, got {calls:?}") };
        assert_eq!(message.text, "Hello Arjun");
        assert_eq!(message.parse_mode, Some(ParseMode::Markdown));
        assert_eq!(message.reply_markup.as_ref().map(|m| m.inline_keyboard.len()), Some(6));
    }

    #[tokio::test]
    async fn law_command_with_topic_shows_analyzing_status() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());

        dispatcher.dispatch(&text(1, "/law IPC 420"), &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert!(matches!(&calls[0], SinkCall::Send(message) if message.text == ANALYZING_STATUS));
        assert!(matches!(&calls[1], SinkCall::Edit(1, message) if message.text == "command:law"));
    }

    #[tokio::test]
    async fn callback_is_answered_and_menu_message_edited() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());
        let callback = update(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-9",
                "from": { "id": 3, "first_name": "Arjun" },
                "message": { "message_id": 31, "chat": { "id": 55 } },
                "data": "intent_case_assist"
            }
        }));

        dispatcher.dispatch(&callback, &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert_eq!(calls[0], SinkCall::Answer("cb-9".to_owned()));
        assert!(matches!(&calls[1], SinkCall::Edit(31, message) if message.text == "callback:intent_case_assist"));
    }

    #[tokio::test]
    async fn privacy_selection_is_sent_below_the_menu() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());
        let callback = update(json!({
            "update_id": 6,
            "callback_query": {
                "id": "cb-10",
                "from": { "id": 3, "first_name": "Arjun" },
                "message": { "message_id": 31, "chat": { "id": 55 } },
                "data": "intent_privacy"
            }
        }));

        dispatcher.dispatch(&callback, &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], SinkCall::Answer("cb-10".to_owned()));
        assert!(matches!(&calls[1], SinkCall::Send(m) if m.chat_id == 55 && m.text == "callback:intent_privacy"));
    }

    #[tokio::test]
    async fn document_is_downloaded_and_follow_up_sent() {
        let sink = Arc::new(RecordingSink::default());
        let service = ScriptedService::replying(
            Reply::plain("Analysis Complete. Summary below:").with_follow_up("the analysis"),
        );
        let dispatcher = UpdateDispatcher::new(Arc::new(service), sink.clone());
        let document = update(json!({
            "update_id": 3,
            "message": {
                "message_id": 40,
                "chat": { "id": 55 },
                "document": { "file_id": "file-7", "file_name": "petition.docx" }
            }
        }));

        dispatcher.dispatch(&document, &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert!(matches!(&calls[0], SinkCall::Send(m) if m.text == "🔍 Received petition.docx. Analyzing content..."));
        assert_eq!(calls[1], SinkCall::Download("file-7".to_owned()));
        assert!(matches!(&calls[2], SinkCall::Edit(1, m) if m.text == "Analysis Complete. Summary below:"));
        assert!(matches!(&calls[3], SinkCall::Send(m) if m.text == "the analysis"));
    }

    #[tokio::test]
    async fn downloaded_bytes_reach_the_service() {
        let sink = Arc::new(RecordingSink::default());
        let service = Arc::new(ScriptedService::default());
        let dispatcher = UpdateDispatcher::new(service.clone(), sink);
        let photo = update(json!({
            "update_id": 4,
            "message": {
                "message_id": 41,
                "chat": { "id": 56 },
                "photo": [{ "file_id": "p-1", "width": 10, "height": 10 }]
            }
        }));

        dispatcher.dispatch(&photo, &EventContext::default()).await.expect("dispatch");

        let files = service.files.lock().await;
        assert_eq!(files.as_slice(), [(56, b"bytes-of-p-1".to_vec(), "image.png".to_owned())]);
    }

    #[tokio::test]
    async fn oversized_reply_edits_first_chunk_and_sends_rest() {
        let sink = Arc::new(RecordingSink::default());
        let long = "z".repeat(MESSAGE_CHAR_LIMIT + 10);
        let dispatcher = dispatcher(ScriptedService::replying(Reply::plain(long)), sink.clone());

        dispatcher.dispatch(&text(1, "long please"), &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[1], SinkCall::Edit(1, m) if m.text.chars().count() == MESSAGE_CHAR_LIMIT));
        assert!(matches!(&calls[2], SinkCall::Send(m) if m.text.len() == 10));
    }

    #[tokio::test]
    async fn rejected_markdown_is_resent_plain() {
        let sink = Arc::new(RecordingSink::rejecting_markdown());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());

        dispatcher.dispatch(&text(1, "/start"), &EventContext::default()).await.expect("dispatch");

        let calls = sink.calls().await;
        assert_eq!(calls.len(), 2);
        let SinkCall::Send(retry) = &calls[1] else { panic!("expected send, got {calls:?}") };
        assert_eq!(retry.parse_mode, None);
        assert_eq!(retry.text, "Hello Arjun");
    }

    #[tokio::test]
    async fn unsupported_updates_are_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = dispatcher(ScriptedService::default(), sink.clone());

        let result = dispatcher
            .dispatch(&update(json!({ "update_id": 5 })), &EventContext::default())
            .await
            .expect("dispatch");

        assert_eq!(result, HandlerResult::Ignored);
        assert!(sink.calls().await.is_empty());
    }
}
