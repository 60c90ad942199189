use tracing::{debug, instrument};

use crate::bridge::{AiRequest, ResponseBridge};
use crate::models::{ChatMessage, Content, Role, Tool};

pub const WELCOME_MESSAGE: &str = "স্বাগতম! আমি রাজবাড়ী জেলা তথ্য সহায়িকা। রাজবাড়ী সম্পর্কে জানতে আপনি আমাকে যেকোনো প্রশ্ন করতে পারেন।";

/// Greeting left behind when the user clears the conversation
pub const RESET_MESSAGE: &str = "স্বাগতম! আমি রাজবাড়ী সম্পর্কে আপনাকে কি তথ্য দিয়ে সাহায্য করতে পারি?";

pub const CHAT_SYSTEM_INSTRUCTION: &str = "
আপনি হলেন \"রাজবাড়ী জেলা তথ্য সহায়িকা – AI Chat Assistant\"।
আপনার দায়িত্ব ও বৈশিষ্ট্য:
১. রাজবাড়ী জেলা সম্পর্কে সকল তথ্য প্রদান করা।
২. ভাষা: সর্বদা বাংলা ব্যবহার করবেন।
৩. টোন: বিনয়ী ও সম্মানজনক।
";

/// Ordered chat history of one user session
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation holding only the welcome message
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::model(WELCOME_MESSAGE)],
        }
    }

    /// Resume from a history supplied by the caller
    pub fn from_history(messages: Vec<ChatMessage>) -> Self {
        if messages.is_empty() {
            return Self::new();
        }
        Self { messages }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }

    /// Discard every turn, leaving only the reset greeting
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::model(RESET_MESSAGE)];
    }

    /// Turns sent to the model: all non-error messages, in order
    fn history_contents(&self) -> Vec<Content> {
        self.messages
            .iter()
            .filter(|m| !m.is_error)
            .map(ChatMessage::to_content)
            .collect()
    }

    /// Append the user's question, ask the model and append its reply.
    ///
    /// Blank input is ignored and returns `None`. Failures become an error
    /// bubble rather than an `Err`.
    #[instrument(skip(self, bridge, api_key))]
    pub async fn ask(
        &mut self,
        bridge: &ResponseBridge,
        api_key: Option<&str>,
        text: &str,
    ) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::user(text));
        Some(self.send(bridge, api_key, text).await)
    }

    /// Resend the last user question without appending it again
    #[instrument(skip(self, bridge, api_key))]
    pub async fn retry(
        &mut self,
        bridge: &ResponseBridge,
        api_key: Option<&str>,
    ) -> Option<&ChatMessage> {
        let last = self
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)?
            .text
            .clone();
        Some(self.send(bridge, api_key, &last).await)
    }

    async fn send(
        &mut self,
        bridge: &ResponseBridge,
        api_key: Option<&str>,
        text: &str,
    ) -> &ChatMessage {
        // The question must be the final turn exactly once.
        let mut contents = self.history_contents();
        let already_last = contents.last().is_some_and(|c| {
            c.role == Some(Role::User) && c.parts.first().is_some_and(|p| p.text == text)
        });
        if !already_last {
            contents.push(Content::user(text));
        }
        debug!("Chat request with {} turn(s)", contents.len());

        let request = AiRequest::new(contents)
            .with_system_instruction(CHAT_SYSTEM_INSTRUCTION)
            .with_tools(vec![Tool::google_search()]);

        let reply = match bridge.call(api_key, request).await {
            Ok(response) => ChatMessage {
                sources: response.sources(),
                mode: Some(response.mode),
                ..ChatMessage::model(response.text)
            },
            Err(e) => ChatMessage::error(e.user_message()),
        };
        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeminiConfig;
    use crate::error::BridgeError;
    use crate::gemini::{BackendError, GenerateContentRequest, GenerateContentResponse, GenerativeBackend};
    use crate::models::ResponseMode;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct EchoBackend {
        seen: Mutex<Vec<GenerateContentRequest>>,
    }

    #[async_trait]
    impl GenerativeBackend for EchoBackend {
        async fn generate_content(
            &self,
            _api_key: &str,
            _model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, BackendError> {
            self.seen.lock().unwrap().push(request.clone());
            let last = request.contents.last().unwrap().parts[0].text.clone();
            Ok(GenerateContentResponse::from_text(format!("উত্তর: {last}")))
        }
    }

    fn setup() -> (Arc<EchoBackend>, ResponseBridge) {
        let backend = Arc::new(EchoBackend {
            seen: Mutex::new(Vec::new()),
        });
        let bridge = ResponseBridge::new(
            backend.clone(),
            ResponseMode::ClientDirect,
            &GeminiConfig::default(),
        );
        (backend, bridge)
    }

    #[tokio::test]
    async fn test_ask_appends_both_turns() {
        let (backend, bridge) = setup();
        let mut chat = Conversation::new();

        let reply = chat.ask(&bridge, Some("k"), "রাজবাড়ীর দর্শনীয় স্থান?").await.unwrap();
        assert_eq!(reply.text, "উত্তর: রাজবাড়ীর দর্শনীয় স্থান?");
        assert_eq!(reply.mode, Some(ResponseMode::ClientDirect));
        assert_eq!(chat.messages().len(), 3);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].contents.len(), 2);
        assert_eq!(seen[0].contents[0].role, Some(Role::Model));
        assert_eq!(seen[0].tools, vec![Tool::google_search()]);
    }

    #[tokio::test]
    async fn test_error_turns_are_excluded_from_history() {
        let (backend, bridge) = setup();
        let mut chat = Conversation::new();

        let reply = chat.ask(&bridge, None, "প্রথম প্রশ্ন").await.unwrap();
        assert!(reply.is_error);
        assert_eq!(reply.text, BridgeError::missing_api_key("API_KEY").user_message());

        chat.ask(&bridge, Some("k"), "দ্বিতীয় প্রশ্ন").await.unwrap();
        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        // welcome, first question, second question; the error bubble is dropped
        assert_eq!(seen[0].contents.len(), 3);
    }

    #[tokio::test]
    async fn test_retry_does_not_duplicate_question() {
        let (backend, bridge) = setup();
        let mut chat = Conversation::new();
        chat.ask(&bridge, None, "ট্রেনের সময়?").await;

        let reply = chat.retry(&bridge, Some("k")).await.unwrap();
        assert!(!reply.is_error);
        let user_turns = chat
            .messages()
            .iter()
            .filter(|m| m.role == Role::User)
            .count();
        assert_eq!(user_turns, 1);
        assert_eq!(backend.seen.lock().unwrap()[0].contents.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_and_reset() {
        let (_, bridge) = setup();
        let mut chat = Conversation::new();
        assert!(chat.ask(&bridge, Some("k"), "   ").await.is_none());
        assert!(chat.retry(&bridge, Some("k")).await.is_none());

        chat.ask(&bridge, Some("k"), "হ্যালো").await;
        chat.reset();
        assert_eq!(chat.messages(), &[ChatMessage::model(RESET_MESSAGE)]);

        let reply = chat.ask(&bridge, Some("k"), "আবার শুরু").await.unwrap();
        assert_eq!(reply.text, "উত্তর: আবার শুরু");
        assert_eq!(chat.messages().len(), 3);
    }
}
