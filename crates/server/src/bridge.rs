use std::sync::Arc;

use async_trait::async_trait;
use legaltune_agent::AgentRuntime;
use legaltune_core::{ChatCommand, ConversationId, Reply};
use legaltune_telegram::ChatService;

/// Exposes the agent runtime to the Telegram dispatcher.
#[derive(Clone)]
pub struct RuntimeChatService {
    runtime: Arc<AgentRuntime>,
}

impl RuntimeChatService {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl ChatService for RuntimeChatService {
    async fn on_text(&self, conversation: ConversationId, text: &str) -> Reply {
        self.runtime.on_text(conversation, text).await
    }

    async fn on_callback(&self, conversation: ConversationId, selection: &str) -> Reply {
        self.runtime.on_callback(conversation, selection).await
    }

    async fn on_file(&self, conversation: ConversationId, bytes: &[u8], file_name: &str) -> Reply {
        self.runtime.on_file(conversation, bytes, file_name).await
    }

    async fn on_command(
        &self,
        conversation: ConversationId,
        first_name: Option<&str>,
        command: &ChatCommand,
    ) -> Reply {
        self.runtime.on_command(conversation, first_name, command).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use legaltune_agent::{
        AgentRuntime, DocumentAnalysis, LlmClient, LlmFailure, LlmGateway, RetryPolicy,
    };
    use legaltune_core::{ChatCommand, ConversationId, Intent};
    use legaltune_documents::{DocumentExtractor, OcrEngine, OcrError};
    use legaltune_telegram::api::Update;
    use legaltune_telegram::keyboard::OutgoingMessage;
    use legaltune_telegram::{
        ChatService, PollingRunner, ReconnectPolicy, ReplySink, TransportError, UpdateDispatcher,
        UpdateTransport,
    };
    use serde_json::json;

    use super::RuntimeChatService;

    struct EchoClient;

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn generate_content(&self, prompt: &str) -> Result<String, LlmFailure> {
            Ok(format!("answered {} chars", prompt.chars().count()))
        }
    }

    struct NoOcr;

    #[async_trait]
    impl OcrEngine for NoOcr {
        async fn recognize(&self, _image_png: &[u8]) -> Result<String, OcrError> {
            Err(OcrError::BinaryNotFound)
        }
    }

    #[derive(Default)]
    struct PromptLog {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for PromptLog {
        async fn generate_content(&self, prompt: &str) -> Result<String, LlmFailure> {
            self.prompts.lock().expect("prompt log lock").push(prompt.to_owned());
            Ok("answer".to_owned())
        }
    }

    /// Hands out one batch, then reports the source closed.
    struct OneBatch {
        batch: Mutex<Option<Vec<Update>>>,
    }

    #[async_trait]
    impl UpdateTransport for OneBatch {
        async fn prepare(&self) -> Result<(), TransportError> {
            Ok(())
        }

        async fn poll(&self, _offset: Option<i64>) -> Result<Option<Vec<Update>>, TransportError> {
            Ok(self.batch.lock().expect("batch lock").take())
        }
    }

    /// Bot API stand-in whose callback answers lag behind.
    struct LaggingApi;

    #[async_trait]
    impl ReplySink for LaggingApi {
        async fn send(&self, _message: &OutgoingMessage) -> Result<i64, TransportError> {
            Ok(1)
        }

        async fn edit(&self, _message_id: i64, _message: &OutgoingMessage) -> Result<(), TransportError> {
            Ok(())
        }

        async fn answer_callback(&self, _callback_query_id: &str) -> Result<(), TransportError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }

        async fn download(&self, _file_id: &str) -> Result<Vec<u8>, TransportError> {
            Ok(Vec::new())
        }
    }

    fn service() -> (RuntimeChatService, Arc<AgentRuntime>) {
        let gateway = LlmGateway::new(Arc::new(EchoClient), RetryPolicy::default());
        let runtime = Arc::new(
            AgentRuntime::new(gateway, DocumentExtractor::new(Arc::new(NoOcr)), DocumentAnalysis::Summary)
                .expect("prompt templates should load"),
        );
        (RuntimeChatService::new(Arc::clone(&runtime)), runtime)
    }

    #[tokio::test]
    async fn menu_selection_reaches_runtime_session() {
        let (service, runtime) = service();
        let conversation = ConversationId(42);

        let reply = service.on_callback(conversation, &Intent::ExplainLaw.callback_data()).await;

        assert!(!reply.text.is_empty());
        let state = runtime.sessions().snapshot(conversation).await.expect("session should exist");
        assert_eq!(state.pending_intent, Some(Intent::ExplainLaw));
    }

    #[tokio::test]
    async fn start_command_greets_by_first_name() {
        let (service, _) = service();

        let reply = service.on_command(ConversationId(7), Some("Asha"), &ChatCommand::Start).await;

        assert!(reply.text.contains("Asha"));
        assert_eq!(reply.menu.len(), Intent::MENU.len());
    }

    #[tokio::test(start_paused = true)]
    async fn menu_selection_applies_to_the_message_polled_with_it() {
        let llm = Arc::new(PromptLog::default());
        let gateway = LlmGateway::new(llm.clone(), RetryPolicy::default());
        let runtime = Arc::new(
            AgentRuntime::new(gateway, DocumentExtractor::new(Arc::new(NoOcr)), DocumentAnalysis::Summary)
                .expect("prompt templates should load"),
        );
        let batch: Vec<Update> = serde_json::from_value(json!([
            {
                "update_id": 1,
                "callback_query": {
                    "id": "cb-1",
                    "from": { "id": 9, "first_name": "Ravi" },
                    "message": { "message_id": 3, "chat": { "id": 9 } },
                    "data": Intent::ExplainLaw.callback_data()
                }
            },
            { "update_id": 2, "message": { "message_id": 4, "chat": { "id": 9 }, "text": "hello" } }
        ]))
        .expect("updates should decode");
        let dispatcher = Arc::new(UpdateDispatcher::new(
            Arc::new(RuntimeChatService::new(Arc::clone(&runtime))),
            Arc::new(LaggingApi),
        ));
        let transport = Arc::new(OneBatch { batch: Mutex::new(Some(batch)) });

        PollingRunner::new(transport, dispatcher, ReconnectPolicy::default())
            .start()
            .await
            .expect("runner should stop cleanly");

        let prompts = llm.prompts.lock().expect("prompt log lock").clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User Query: hello\n\nExplain this law"), "unexpected prompt: {}", prompts[0]);
        assert!(!prompts[0].contains("Legal FAQ"));
        let state = runtime.sessions().snapshot(ConversationId(9)).await.expect("session should exist");
        assert_eq!(state.pending_intent, None);
    }
}
