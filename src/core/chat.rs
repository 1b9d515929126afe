//! Chat completion helper for the turn-based receptionist mode.
//!
//! A stateless request/response call: persona plus prior turns plus the
//! caller's transcript in, generated reply text out. Every failure path
//! degrades to a fixed fallback utterance so the call always gets an answer;
//! there are no retries.

use serde::{Deserialize, Serialize};

/// Spoken when the backend cannot produce a reply.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having a little trouble right now. Could you please repeat that?";

/// Substituted for the caller's transcript when nothing was heard, so an
/// empty gather result produces a gentle prompt instead of an empty-input
/// request.
pub const SILENT_CALLER_PROMPT: &str =
    "The caller did not say anything. Politely ask how you can help.";

/// Default chat completions endpoint.
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One prior turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat completion client for the turns mode.
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    instructions: String,
}

impl ChatClient {
    pub fn new(api_key: String, model: String, instructions: String) -> Self {
        Self::with_endpoint(OPENAI_CHAT_URL.to_string(), api_key, model, instructions)
    }

    /// Construct against a specific endpoint (mock servers in tests).
    pub fn with_endpoint(
        endpoint: String,
        api_key: String,
        model: String,
        instructions: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
            instructions,
        }
    }

    /// Produce a reply for the caller's transcript, given the prior turns.
    ///
    /// Never fails: a non-success status, transport error, or malformed body
    /// yields [`FALLBACK_REPLY`]. An empty transcript is answered from
    /// [`SILENT_CALLER_PROMPT`] rather than treated as a fault.
    pub async fn reply(&self, history: &[ChatMessage], transcript: &str) -> String {
        let user_content = if transcript.trim().is_empty() {
            SILENT_CALLER_PROMPT
        } else {
            transcript
        };

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(self.instructions.clone()));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_content));

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Chat completion request failed: {e}");
                return FALLBACK_REPLY.to_string();
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), "Chat completion returned non-success");
            return FALLBACK_REPLY.to_string();
        }

        match response.json::<ChatResponse>().await {
            Ok(body) => body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|content| !content.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_REPLY.to_string()),
            Err(e) => {
                tracing::error!("Failed to parse chat completion response: {e}");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
