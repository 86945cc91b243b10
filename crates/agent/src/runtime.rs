use std::sync::Arc;

use legaltune_core::{
    ApplicationError, ChatCommand, ConversationId, Intent, MenuOption, Reply, SessionState,
};
use legaltune_documents::{extension_of, has_enough_text, DocumentExtractor, UNSUPPORTED_FORMAT};
use tracing::{error, info, warn};

use crate::conversation::IntentClassifier;
use crate::llm::LlmGateway;
use crate::prompts::{DocumentAnalysis, PromptBuilder, PromptError, CASE_DOCUMENT_TYPE};
use crate::replies;
use crate::session::SessionStore;

impl From<PromptError> for ApplicationError {
    fn from(error: PromptError) -> Self {
        ApplicationError::Prompt(error.to_string())
    }
}

/// Turns inbound chat events into replies. Every handler is infallible:
/// failures are logged and rendered as a warning reply.
pub struct AgentRuntime {
    classifier: IntentClassifier,
    prompts: PromptBuilder,
    gateway: LlmGateway,
    extractor: DocumentExtractor,
    sessions: Arc<SessionStore>,
    analysis: DocumentAnalysis,
}

impl AgentRuntime {
    pub fn new(
        gateway: LlmGateway,
        extractor: DocumentExtractor,
        analysis: DocumentAnalysis,
    ) -> Result<Self, PromptError> {
        Ok(Self {
            classifier: IntentClassifier::new(),
            prompts: PromptBuilder::new()?,
            gateway,
            extractor,
            sessions: Arc::new(SessionStore::new()),
            analysis,
        })
    }

    pub fn with_sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn sessions(&self) -> Arc<SessionStore> {
        Arc::clone(&self.sessions)
    }

    pub fn analysis(&self) -> DocumentAnalysis {
        self.analysis
    }

    pub async fn on_text(&self, conversation: ConversationId, text: &str) -> Reply {
        let session = self.sessions.session(conversation).await;
        let mut state = session.lock().await;

        let pending = state.pending_intent;
        let classification = self.classifier.classify(text, pending);
        if classification.consumed_pending {
            state.take_pending_intent();
        }

        info!(
            event_name = "conversation.text.classified",
            conversation_id = %conversation,
            intent = %classification.intent,
            from_selection = classification.consumed_pending,
            "routing text message"
        );

        let result = match classification.intent {
            Intent::ChangeLanguage => Ok(self.change_language(&mut state, text)),
            Intent::CaseAssist => self.case_assist(text, state.language.as_deref()).await,
            Intent::Faq => self.faq(text, state.language.as_deref()).await,
            Intent::ExplainLaw | Intent::GeneralQuery | Intent::UploadCase | Intent::Privacy => {
                self.explain(text, state.language.as_deref()).await
            }
        };

        into_reply(conversation, result)
    }

    pub async fn on_callback(&self, conversation: ConversationId, selection: &str) -> Reply {
        let intent = match Intent::from_callback_data(selection) {
            Ok(intent) => intent,
            Err(error) => {
                warn!(
                    event_name = "conversation.callback.unknown",
                    conversation_id = %conversation,
                    error = %error,
                    "ignoring unknown menu selection"
                );
                return Reply::plain(replies::UNKNOWN_SELECTION);
            }
        };

        let session = self.sessions.session(conversation).await;
        session.lock().await.set_pending_intent(intent);

        info!(
            event_name = "conversation.callback.selected",
            conversation_id = %conversation,
            intent = %intent,
            "menu selection stored"
        );

        match intent {
            Intent::Privacy => Reply::markdown(replies::PRIVACY_POLICY),
            other => Reply::plain(replies::selection_instruction(other)),
        }
    }

    pub async fn on_file(&self, conversation: ConversationId, bytes: &[u8], file_name: &str) -> Reply {
        let session = self.sessions.session(conversation).await;
        let mut state = session.lock().await;
        if state.pending_intent == Some(Intent::UploadCase) {
            state.take_pending_intent();
        }

        info!(
            event_name = "conversation.file.received",
            conversation_id = %conversation,
            file_name,
            size = bytes.len(),
            "analysing uploaded document"
        );

        let result = self.analyze_document(bytes, file_name, state.language.as_deref()).await;
        into_reply(conversation, result)
    }

    pub async fn on_command(
        &self,
        conversation: ConversationId,
        first_name: Option<&str>,
        command: &ChatCommand,
    ) -> Reply {
        match command {
            ChatCommand::Start => Reply::markdown(replies::welcome(first_name))
                .with_menu(Intent::MENU.into_iter().map(MenuOption::from)),
            ChatCommand::Help | ChatCommand::Unknown(_) => Reply::markdown(replies::HELP),
            ChatCommand::Privacy => Reply::markdown(replies::PRIVACY_POLICY),
            ChatCommand::Faq => Reply::markdown(replies::FAQ),
            ChatCommand::Law(topic) if topic.trim().is_empty() => Reply::plain(replies::LAW_USAGE),
            ChatCommand::Law(topic) => {
                let session = self.sessions.session(conversation).await;
                let state = session.lock().await;
                let result = self.explain(topic, state.language.as_deref()).await;
                into_reply(conversation, result)
            }
            ChatCommand::Case => {
                self.set_pending(conversation, Intent::UploadCase).await;
                Reply::plain(replies::CASE_UPLOAD_REQUEST)
            }
            ChatCommand::Language => {
                self.set_pending(conversation, Intent::ChangeLanguage).await;
                Reply::plain(replies::LANGUAGE_REQUEST)
            }
        }
    }

    /// Extracts, checks and analyses one document. Used by [`on_file`] and by
    /// the operator CLI.
    ///
    /// [`on_file`]: Self::on_file
    pub async fn analyze_document(
        &self,
        bytes: &[u8],
        file_name: &str,
        language: Option<&str>,
    ) -> Result<Reply, ApplicationError> {
        let extension = extension_of(file_name);
        let text = self
            .extractor
            .extract(bytes, &extension)
            .await
            .map_err(|error| ApplicationError::Document(error.to_string()))?;

        if text == UNSUPPORTED_FORMAT {
            return Ok(Reply::plain(replies::UNSUPPORTED_FILE));
        }
        if !has_enough_text(&text) {
            return Ok(Reply::plain(replies::UNREADABLE_FILE));
        }

        let prompt = self.prompts.document_analysis(self.analysis, &text, CASE_DOCUMENT_TYPE)?;
        let analysis = self.gateway.generate(&prompt, language).await;

        Ok(Reply::plain(replies::ANALYSIS_COMPLETE)
            .with_follow_up(format!("{analysis}{}", replies::DISCLAIMER)))
    }

    async fn set_pending(&self, conversation: ConversationId, intent: Intent) {
        let session = self.sessions.session(conversation).await;
        session.lock().await.set_pending_intent(intent);
    }

    fn change_language(&self, state: &mut SessionState, text: &str) -> Reply {
        let language = text.trim();
        state.set_language(language);
        Reply::plain(replies::language_confirmation(language))
    }

    async fn explain(&self, query: &str, language: Option<&str>) -> Result<Reply, ApplicationError> {
        let prompt = self.prompts.explain_law(query)?;
        Ok(self.answer(&prompt, language).await)
    }

    async fn faq(&self, question: &str, language: Option<&str>) -> Result<Reply, ApplicationError> {
        let prompt = self.prompts.faq(question)?;
        Ok(self.answer(&prompt, language).await)
    }

    async fn case_assist(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Reply, ApplicationError> {
        let prompt = self.prompts.case_assist(query)?;
        Ok(self.answer(&prompt, language).await)
    }

    async fn answer(&self, prompt: &str, language: Option<&str>) -> Reply {
        let text = self.gateway.generate(prompt, language).await;
        Reply::plain(format!("{text}{}", replies::DISCLAIMER))
    }
}

fn into_reply(conversation: ConversationId, result: Result<Reply, ApplicationError>) -> Reply {
    result.unwrap_or_else(|error| {
        error!(
            event_name = "conversation.handler.failed",
            conversation_id = %conversation,
            error_class = error.class(),
            error = %error,
            "request processing failed"
        );
        Reply::plain(error.user_message())
    })
}
