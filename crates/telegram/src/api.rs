//! Bot API client and the subset of the update model the bot consumes.

use std::time::Duration;

use async_trait::async_trait;
use legaltune_core::config::TelegramConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::events::ReplySink;
use crate::keyboard::OutgoingMessage;
use crate::polling::{TransportError, UpdateTransport};

/// Extra time allowed on top of the long-poll window before the HTTP client
/// gives up.
const HTTP_GRACE_SECS: u64 = 15;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Chat the update belongs to. Callbacks without their message fall back
    /// to the sender, which is the private chat id.
    pub fn chat_id(&self) -> Option<i64> {
        if let Some(query) = &self.callback_query {
            return Some(query.message.as_ref().map_or(query.from.id, |message| message.chat.id));
        }
        self.message.as_ref().map(|message| message.chat.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &'static str) -> Result<T, TransportError> {
        if !self.ok {
            return Err(TransportError::Api {
                method,
                code: self.error_code,
                description: self.description.unwrap_or_else(|| "no description".to_owned()),
            });
        }
        self.result.ok_or_else(|| TransportError::Decode(format!("{method}: missing result")))
    }
}

#[derive(Serialize)]
struct EditMessage<'a> {
    message_id: i64,
    #[serde(flatten)]
    message: &'a OutgoingMessage,
}

#[derive(Clone)]
pub struct BotApi {
    http: Client,
    base_url: String,
    token: SecretString,
    poll_timeout_secs: u32,
}

impl BotApi {
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs) + HTTP_GRACE_SECS))
            .build()
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token.expose_secret())
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{file_path}", self.base_url, self.token.expose_secret())
    }

    async fn call<T, B>(&self, method: &'static str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        debug!(method, "calling bot api");
        let response = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;

        let payload = response
            .text()
            .await
            .map_err(|error| TransportError::Receive(error.without_url().to_string()))?;

        serde_json::from_str::<ApiResponse<T>>(&payload)
            .map_err(|error| TransportError::Decode(format!("{method}: {error}")))?
            .into_result(method)
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body).await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TransportError> {
        let body = json!({ "drop_pending_updates": drop_pending_updates });
        self.call::<bool, _>("deleteWebhook", &body).await.map(|_| ())
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Message, TransportError> {
        self.call("sendMessage", message).await
    }

    pub async fn edit_message_text(
        &self,
        message_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        // The result is either the edited Message or `true`; neither is needed.
        self.call::<serde_json::Value, _>("editMessageText", &EditMessage { message_id, message })
            .await
            .map(|_| ())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TransportError> {
        let body = json!({ "callback_query_id": callback_query_id });
        self.call::<bool, _>("answerCallbackQuery", &body).await.map(|_| ())
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File, TransportError> {
        self.call("getFile", &json!({ "file_id": file_id })).await
    }

    pub async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        let file = self.get_file(file_id).await?;
        let file_path = file
            .file_path
            .ok_or_else(|| TransportError::Decode(format!("getFile: no file_path for {file_id}")))?;

        let response = self
            .http
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(TransportError::Api {
                method: "file",
                code: Some(i64::from(response.status().as_u16())),
                description: format!("download of {file_id} failed"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| TransportError::Receive(error.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl UpdateTransport for BotApi {
    async fn prepare(&self) -> Result<(), TransportError> {
        self.delete_webhook(true).await
    }

    async fn poll(&self, offset: Option<i64>) -> Result<Option<Vec<Update>>, TransportError> {
        self.get_updates(offset).await.map(Some)
    }
}

#[async_trait]
impl ReplySink for BotApi {
    async fn send(&self, message: &OutgoingMessage) -> Result<i64, TransportError> {
        self.send_message(message).await.map(|sent| sent.message_id)
    }

    async fn edit(&self, message_id: i64, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.edit_message_text(message_id, message).await
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), TransportError> {
        self.answer_callback_query(callback_query_id).await
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        BotApi::download(self, file_id).await
    }
}
