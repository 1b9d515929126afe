//! End-to-end call flow tests for the media bridge.
//!
//! These drive raw provider frames through the public decode + bridge API
//! with a mock AI session, verifying the relay and turn-segmentation
//! contracts:
//! - audio is forwarded in arrival order with byte-identical payloads
//! - malformed frames never fault and never advance turn state
//! - one commit+response pair per silence gap
//! - teardown closes the AI leg regardless of readiness

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use frontdesk_gateway::core::realtime::{
    AudioDeltaCallback, RealtimeError, RealtimeResult, RealtimeSession, SessionClosedCallback,
    SessionErrorCallback,
};
use frontdesk_gateway::core::session::CallBridge;
use frontdesk_gateway::core::turn::TurnPolicy;
use frontdesk_gateway::handlers::media::InboundFrame;

/// Operations observed by the scripted AI session, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Op {
    Append(String),
    Commit,
    CreateResponse,
    Disconnect,
}

/// Scripted AI session: records operations, optionally not ready.
struct ScriptedSession {
    ready: bool,
    ops: Arc<Mutex<Vec<Op>>>,
}

impl ScriptedSession {
    fn new(ready: bool) -> (Self, Arc<Mutex<Vec<Op>>>) {
        let ops = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                ready,
                ops: ops.clone(),
            },
            ops,
        )
    }
}

#[async_trait]
impl RealtimeSession for ScriptedSession {
    async fn connect(&mut self) -> RealtimeResult<()> {
        self.ready = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> RealtimeResult<()> {
        self.ready = false;
        self.ops.lock().unwrap().push(Op::Disconnect);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn append_audio(&mut self, audio: &str) -> RealtimeResult<()> {
        if !self.ready {
            return Err(RealtimeError::NotConnected);
        }
        self.ops.lock().unwrap().push(Op::Append(audio.to_string()));
        Ok(())
    }

    async fn commit_input(&mut self) -> RealtimeResult<()> {
        self.ops.lock().unwrap().push(Op::Commit);
        Ok(())
    }

    async fn create_response(&mut self) -> RealtimeResult<()> {
        self.ops.lock().unwrap().push(Op::CreateResponse);
        Ok(())
    }

    fn on_audio(&mut self, _callback: AudioDeltaCallback) {}
    fn on_close(&mut self, _callback: SessionClosedCallback) {}
    fn on_error(&mut self, _callback: SessionErrorCallback) {}
}

const SILENCE: Duration = Duration::from_millis(900);
const POLL: Duration = Duration::from_millis(200);

fn media_frame(payload: &str) -> String {
    format!(r#"{{"event":"media","media":{{"track":"inbound","payload":"{payload}"}}}}"#)
}

/// Feed one raw frame through decode into the bridge, the way the media
/// handler does.
async fn feed(bridge: &mut CallBridge, raw: &str) {
    match InboundFrame::decode(raw) {
        Some(InboundFrame::Start { start }) => bridge.on_start(start.stream_sid),
        Some(InboundFrame::Media { media }) => {
            bridge.on_media(&media.payload, Instant::now()).await
        }
        Some(InboundFrame::Stop) => bridge.on_stop().await,
        Some(_) => {}
        None => {}
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_call_single_turn() {
    let (session, ops) = ScriptedSession::new(true);
    let mut bridge = CallBridge::new(
        Box::new(session),
        TurnPolicy::SilenceTimeout { silence: SILENCE },
    );

    feed(&mut bridge, r#"{"event":"connected","protocol":"Call"}"#).await;
    feed(
        &mut bridge,
        r#"{"event":"start","start":{"streamSid":"MZcall1"}}"#,
    )
    .await;
    assert_eq!(bridge.stream_sid(), Some("MZcall1"));

    // Caller speaks: chunks at t=0, 100, 200ms
    for payload in ["AAAA", "BBBB", "CCCC"] {
        feed(&mut bridge, &media_frame(payload)).await;
        tokio::time::advance(Duration::from_millis(100)).await;
    }

    // Silence; polls every 200ms
    let mut boundary_polls = 0;
    for _ in 0..8 {
        tokio::time::advance(POLL).await;
        bridge.on_poll(Instant::now()).await;
        boundary_polls += 1;
        if ops.lock().unwrap().iter().any(|op| *op == Op::Commit) {
            break;
        }
    }
    // Last chunk at t=200ms, polls from t=500ms on the 200ms grid: the
    // boundary lands on the first poll at t >= 1100ms
    assert_eq!(boundary_polls, 4);

    let recorded = ops.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            Op::Append("AAAA".to_string()),
            Op::Append("BBBB".to_string()),
            Op::Append("CCCC".to_string()),
            Op::Commit,
            Op::CreateResponse,
        ]
    );

    // Provider hangs up
    bridge.shutdown().await;
    assert_eq!(ops.lock().unwrap().last(), Some(&Op::Disconnect));
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_never_advance_turn_state() {
    let (session, ops) = ScriptedSession::new(true);
    let mut bridge = CallBridge::new(
        Box::new(session),
        TurnPolicy::SilenceTimeout { silence: SILENCE },
    );

    for noise in [
        "not json",
        "",
        r#"{"event":"media"}"#,
        r#"{"truncated":"#,
        r#"{"event":"dtmf","dtmf":{"digit":"1"}}"#,
    ] {
        feed(&mut bridge, noise).await;
    }

    assert!(!bridge.has_unflushed_audio());

    // Long silence after only noise: no boundary, no AI traffic at all
    for _ in 0..20 {
        tokio::time::advance(POLL).await;
        bridge.on_poll(Instant::now()).await;
    }
    assert!(ops.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_multi_turn_call_one_pair_per_gap() {
    let (session, ops) = ScriptedSession::new(true);
    let mut bridge = CallBridge::new(
        Box::new(session),
        TurnPolicy::SilenceTimeout { silence: SILENCE },
    );

    for turn in 0..3 {
        feed(&mut bridge, &media_frame(&format!("UTT{turn}"))).await;
        // Gap well past the threshold, with many polls seeing it
        for _ in 0..10 {
            tokio::time::advance(POLL).await;
            bridge.on_poll(Instant::now()).await;
        }
    }

    let recorded = ops.lock().unwrap().clone();
    let commits = recorded.iter().filter(|op| **op == Op::Commit).count();
    assert_eq!(commits, 3, "one commit per utterance gap: {recorded:?}");

    // Each commit is immediately followed by a response request
    for (i, op) in recorded.iter().enumerate() {
        if *op == Op::Commit {
            assert_eq!(recorded.get(i + 1), Some(&Op::CreateResponse));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_audio_before_readiness_is_dropped_not_queued() {
    let (session, ops) = ScriptedSession::new(false);
    let mut bridge = CallBridge::new(
        Box::new(session),
        TurnPolicy::SilenceTimeout { silence: SILENCE },
    );

    feed(&mut bridge, &media_frame("EARLY")).await;
    tokio::time::advance(Duration::from_secs(3)).await;
    bridge.on_poll(Instant::now()).await;

    // Nothing reached the AI leg and no boundary fired for the dropped chunk
    assert!(ops.lock().unwrap().is_empty());

    bridge.shutdown().await;
    assert_eq!(ops.lock().unwrap().clone(), vec![Op::Disconnect]);
}

#[tokio::test]
async fn test_explicit_stop_policy_responds_without_waiting() {
    let (session, ops) = ScriptedSession::new(true);
    let mut bridge = CallBridge::new(Box::new(session), TurnPolicy::ExplicitStop);

    feed(&mut bridge, &media_frame("AAAA")).await;
    feed(&mut bridge, r#"{"event":"stop","stop":{"callSid":"CA1"}}"#).await;

    let recorded = ops.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![
            Op::Append("AAAA".to_string()),
            Op::Commit,
            Op::CreateResponse,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_teardown_before_boundary_forces_no_response() {
    let (session, ops) = ScriptedSession::new(true);
    let mut bridge = CallBridge::new(
        Box::new(session),
        TurnPolicy::SilenceTimeout { silence: SILENCE },
    );

    feed(&mut bridge, &media_frame("AAAA")).await;
    // Provider closes before any boundary fires
    bridge.shutdown().await;

    let recorded = ops.lock().unwrap().clone();
    assert_eq!(
        recorded,
        vec![Op::Append("AAAA".to_string()), Op::Disconnect],
        "no commit/response for an unfinished turn"
    );
}
