use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::events::ReplySink;
use crate::keyboard::OutgoingMessage;
use crate::polling::TransportError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SinkCall {
    Send(OutgoingMessage),
    Edit(i64, OutgoingMessage),
    Answer(String),
    Download(String),
}

/// Records every outbound call. Sent messages get ids 1, 2, 3, ...
#[derive(Default)]
pub(crate) struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    reject_markdown: bool,
    answer_delay: Option<Duration>,
}

impl RecordingSink {
    pub(crate) fn rejecting_markdown() -> Self {
        Self { reject_markdown: true, ..Self::default() }
    }

    /// Answering a callback query takes `delay`, like a slow Bot API round trip.
    pub(crate) fn slow_callback_answers(delay: Duration) -> Self {
        Self { answer_delay: Some(delay), ..Self::default() }
    }

    pub(crate) async fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().await.clone()
    }

    fn check(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        if self.reject_markdown && message.parse_mode.is_some() {
            return Err(TransportError::Api {
                method: "sendMessage",
                code: Some(400),
                description: "Bad Request: can't parse entities".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send(&self, message: &OutgoingMessage) -> Result<i64, TransportError> {
        let mut calls = self.calls.lock().await;
        calls.push(SinkCall::Send(message.clone()));
        self.check(message)?;
        let sent = calls.iter().filter(|call| matches!(call, SinkCall::Send(_))).count();
        Ok(i64::try_from(sent).unwrap_or(i64::MAX))
    }

    async fn edit(&self, message_id: i64, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.calls.lock().await.push(SinkCall::Edit(message_id, message.clone()));
        self.check(message)
    }

    async fn answer_callback(&self, callback_query_id: &str) -> Result<(), TransportError> {
        if let Some(delay) = self.answer_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(SinkCall::Answer(callback_query_id.to_owned()));
        Ok(())
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().await.push(SinkCall::Download(file_id.to_owned()));
        Ok(format!("bytes-of-{file_id}").into_bytes())
    }
}
