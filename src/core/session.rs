//! Per-call bridge between the telephony leg and the AI leg.
//!
//! A [`CallBridge`] pairs one telephony media stream with exactly one
//! realtime AI session and carries the relay rules:
//!
//! - inbound audio is forwarded in arrival order, payload untouched;
//! - audio arriving before the AI session is ready is dropped, not queued;
//! - a turn boundary issues exactly one commit + response pair, and only
//!   after all audio received before the boundary has been forwarded;
//! - shutdown is idempotent and closes the AI leg whether or not it was
//!   ready.
//!
//! The bridge holds no timer of its own. The media handler's select loop
//! drives [`CallBridge::on_poll`] and owns the interval, so closing the
//! telephony leg cancels the recurring check by construction.

use tokio::time::Instant;

use crate::core::realtime::{BoxedRealtimeSession, RealtimeError};
use crate::core::turn::{TurnDetector, TurnPolicy};

/// One active phone call: the AI leg plus turn segmentation state.
pub struct CallBridge {
    session: BoxedRealtimeSession,
    detector: TurnDetector,
    /// Stream correlation id from the provider's start frame
    stream_sid: Option<String>,
    closed: bool,
}

impl CallBridge {
    /// Pair a freshly created AI session with this call.
    pub fn new(session: BoxedRealtimeSession, policy: TurnPolicy) -> Self {
        Self {
            session,
            detector: TurnDetector::new(policy),
            stream_sid: None,
            closed: false,
        }
    }

    /// Stream id from the provider, once the start frame has arrived.
    pub fn stream_sid(&self) -> Option<&str> {
        self.stream_sid.as_deref()
    }

    /// Whether audio is waiting to be flushed at the next boundary.
    pub fn has_unflushed_audio(&self) -> bool {
        self.detector.has_unflushed_audio()
    }

    /// Session-start frame: record the stream id for correlation.
    pub fn on_start(&mut self, stream_sid: String) {
        tracing::info!(stream_sid = %stream_sid, "Media stream started");
        self.stream_sid = Some(stream_sid);
    }

    /// Inbound audio chunk. Forwards the base64 payload to the AI leg when
    /// it is ready; otherwise the chunk is dropped.
    pub async fn on_media(&mut self, payload: &str, now: Instant) {
        let appended = if self.session.is_ready() {
            match self.session.append_audio(payload).await {
                Ok(()) => true,
                Err(RealtimeError::NotConnected) => false,
                Err(e) => {
                    tracing::warn!("Failed to forward audio to AI leg: {e}");
                    false
                }
            }
        } else {
            tracing::debug!("AI session not ready, dropping audio chunk");
            false
        };

        self.detector.record_audio(now, appended);
    }

    /// Explicit stop frame from the provider. Under the explicit-stop policy
    /// this is the turn boundary; under silence timeout it only marks the
    /// end of inbound media.
    pub async fn on_stop(&mut self) {
        if self.detector.on_stop() {
            self.flush_turn().await;
        } else {
            tracing::debug!(stream_sid = ?self.stream_sid, "Media stream stop");
        }
    }

    /// Recurring silence check, driven by the handler's poll interval.
    /// A tick with nothing unflushed does nothing.
    pub async fn on_poll(&mut self, now: Instant) {
        if self.detector.poll(now) {
            self.flush_turn().await;
        }
    }

    /// Commit the input buffer and request a response. Called exactly once
    /// per detected boundary.
    async fn flush_turn(&mut self) {
        tracing::debug!(stream_sid = ?self.stream_sid, "Turn boundary, requesting response");
        if let Err(e) = self.session.commit_input().await {
            tracing::warn!("Failed to commit input buffer: {e}");
            return;
        }
        if let Err(e) = self.session.create_response().await {
            tracing::warn!("Failed to request response: {e}");
        }
    }

    /// Tear down the AI leg. Idempotent: repeated calls are no-ops, and a
    /// session that never became ready closes the same way.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.session.disconnect().await {
            tracing::error!("Failed to disconnect AI session: {e}");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::{
        AudioDeltaCallback, RealtimeResult, RealtimeSession, SessionClosedCallback,
        SessionErrorCallback,
    };
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Operations observed by the mock AI session, in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Append(String),
        Commit,
        CreateResponse,
        Disconnect,
    }

    /// Mock realtime session recording every operation.
    struct MockSession {
        ready: bool,
        ops: Arc<Mutex<Vec<Op>>>,
    }

    impl MockSession {
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
    impl RealtimeSession for MockSession {
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

    fn silence_bridge(ready: bool) -> (CallBridge, Arc<Mutex<Vec<Op>>>) {
        let (session, ops) = MockSession::new(ready);
        (
            CallBridge::new(Box::new(session), TurnPolicy::SilenceTimeout { silence: SILENCE }),
            ops,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_forwarded_in_order_byte_identical() {
        let (mut bridge, ops) = silence_bridge(true);

        let payloads = ["AAAA", "BBBB", "CCCC", "DDDD"];
        for p in payloads {
            bridge.on_media(p, Instant::now()).await;
        }

        let recorded = ops.lock().unwrap().clone();
        assert_eq!(
            recorded,
            payloads
                .iter()
                .map(|p| Op::Append(p.to_string()))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_dropped_before_readiness() {
        let (mut bridge, ops) = silence_bridge(false);

        bridge.on_media("AAAA", Instant::now()).await;
        assert!(ops.lock().unwrap().is_empty());
        assert!(!bridge.has_unflushed_audio());

        // Dropped audio never produces a commit, even after a long gap
        tokio::time::advance(Duration::from_secs(5)).await;
        bridge.on_poll(Instant::now()).await;
        assert!(ops.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_commit_response_pair_per_gap() {
        let (mut bridge, ops) = silence_bridge(true);

        // Burst of chunks, then a gap past the threshold
        for p in ["AAAA", "BBBB", "CCCC"] {
            bridge.on_media(p, Instant::now()).await;
            tokio::time::advance(Duration::from_millis(100)).await;
        }
        for _ in 0..20 {
            tokio::time::advance(Duration::from_millis(200)).await;
            bridge.on_poll(Instant::now()).await;
        }

        let recorded = ops.lock().unwrap().clone();
        let commits = recorded.iter().filter(|op| **op == Op::Commit).count();
        let responses = recorded
            .iter()
            .filter(|op| **op == Op::CreateResponse)
            .count();
        assert_eq!(commits, 1, "exactly one commit per gap: {recorded:?}");
        assert_eq!(responses, 1);

        // All appends precede the commit
        let commit_idx = recorded.iter().position(|op| *op == Op::Commit).unwrap();
        assert!(recorded[..commit_idx]
            .iter()
            .all(|op| matches!(op, Op::Append(_))));
        assert_eq!(recorded[commit_idx + 1], Op::CreateResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_gap_yields_second_pair() {
        let (mut bridge, ops) = silence_bridge(true);

        bridge.on_media("AAAA", Instant::now()).await;
        tokio::time::advance(SILENCE).await;
        bridge.on_poll(Instant::now()).await;

        bridge.on_media("BBBB", Instant::now()).await;
        tokio::time::advance(SILENCE).await;
        bridge.on_poll(Instant::now()).await;

        let recorded = ops.lock().unwrap().clone();
        assert_eq!(
            recorded,
            vec![
                Op::Append("AAAA".to_string()),
                Op::Commit,
                Op::CreateResponse,
                Op::Append("BBBB".to_string()),
                Op::Commit,
                Op::CreateResponse,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_without_unflushed_audio_is_noop() {
        let (mut bridge, ops) = silence_bridge(true);
        for _ in 0..10 {
            tokio::time::advance(Duration::from_millis(200)).await;
            bridge.on_poll(Instant::now()).await;
        }
        assert!(ops.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_stop_triggers_immediate_flush() {
        let (session, ops) = MockSession::new(true);
        let mut bridge = CallBridge::new(Box::new(session), TurnPolicy::ExplicitStop);

        bridge.on_media("AAAA", Instant::now()).await;
        bridge.on_stop().await;

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

    #[tokio::test]
    async fn test_stop_under_silence_policy_does_not_flush() {
        let (mut bridge, ops) = silence_bridge(true);
        bridge.on_media("AAAA", Instant::now()).await;
        bridge.on_stop().await;

        let recorded = ops.lock().unwrap().clone();
        assert_eq!(recorded, vec![Op::Append("AAAA".to_string())]);
    }

    #[tokio::test]
    async fn test_shutdown_closes_ai_leg_when_not_ready() {
        let (mut bridge, ops) = silence_bridge(false);
        bridge.shutdown().await;
        assert_eq!(ops.lock().unwrap().clone(), vec![Op::Disconnect]);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let (mut bridge, ops) = silence_bridge(true);
        bridge.shutdown().await;
        bridge.shutdown().await;
        assert_eq!(ops.lock().unwrap().clone(), vec![Op::Disconnect]);
    }

    #[tokio::test]
    async fn test_start_frame_records_stream_sid() {
        let (mut bridge, _ops) = silence_bridge(true);
        assert!(bridge.stream_sid().is_none());
        bridge.on_start("MZ1234".to_string());
        assert_eq!(bridge.stream_sid(), Some("MZ1234"));
    }
}
