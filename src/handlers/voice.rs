//! Inbound call webhook handlers
//!
//! The telephony provider POSTs here when a call arrives. The response is
//! call-control markup (TwiML): in realtime mode it directs the provider to
//! open the media stream WebSocket; in turns mode it gathers caller speech
//! and loops each transcript through the chat completion helper.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::info;

use crate::config::ReceptionistMode;
use crate::state::AppState;
use crate::utils::xml;

/// Spoken while the media stream is being connected (realtime mode).
const CONNECTING_NOTICE: &str = "Connecting you to our receptionist.";

/// Spoken greeting that opens a turns-mode call.
const TURNS_GREETING: &str = "Hello! Thank you for calling. How can I help you today?";

/// Form fields posted by the provider on webhook callbacks.
///
/// Field names are the provider's PascalCase; only the fields the gateway
/// reads are declared.
#[derive(Debug, Deserialize)]
pub struct VoiceWebhookForm {
    /// Call correlation id
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    /// Transcript of gathered speech (turns mode)
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// `POST /voice` - entry point for an inbound call.
pub async fn voice_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<VoiceWebhookForm>,
) -> impl IntoResponse {
    info!(call_sid = ?form.call_sid, mode = %state.config.mode, "Inbound call");

    let twiml = match state.config.mode {
        ReceptionistMode::Realtime => {
            // Validation guarantees public_host in realtime mode
            let stream_url = state
                .config
                .media_stream_url()
                .unwrap_or_else(|| "wss://localhost/media".to_string());
            realtime_twiml(&stream_url)
        }
        ReceptionistMode::Turns => gather_twiml(TURNS_GREETING),
    };

    xml_response(twiml)
}

/// `POST /voice/respond` - one gathered caller turn (turns mode).
///
/// An absent or empty transcript is not a fault; the chat helper answers it
/// from the silent-caller prompt.
pub async fn respond_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<VoiceWebhookForm>,
) -> impl IntoResponse {
    let transcript = form.speech_result.unwrap_or_default();
    let call_sid = form.call_sid.unwrap_or_default();
    info!(call_sid = %call_sid, transcript_len = transcript.len(), "Caller turn");

    let history = state.call_history(&call_sid);
    let reply = state.chat.reply(&history, &transcript).await;
    state.record_turn(&call_sid, &transcript, &reply);

    xml_response(gather_twiml(&reply))
}

/// TwiML that speaks a connection notice and opens the media stream.
fn realtime_twiml(stream_url: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Say>{notice}</Say>
  <Connect>
    <Stream url="{url}"/>
  </Connect>
  <Pause length="60"/>
</Response>"#,
        notice = xml::escape(CONNECTING_NOTICE),
        url = xml::escape(stream_url),
    )
}

/// TwiML that speaks `say_text` and gathers the caller's next utterance.
///
/// The trailing Redirect keeps the loop alive when the gather times out
/// without speech; the next turn then runs with an empty transcript.
fn gather_twiml(say_text: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Gather input="speech" action="/voice/respond" method="POST" speechTimeout="auto">
    <Say>{text}</Say>
  </Gather>
  <Redirect method="POST">/voice/respond</Redirect>
</Response>"#,
        text = xml::escape(say_text),
    )
}

fn xml_response(twiml: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/xml")], twiml)
}
