//! Media stream WebSocket handler
//!
//! One connection per phone call. The handler owns the pairing of the
//! telephony leg with its AI session: it wires the frame decoder, turn
//! detector, and audio relay together, drives the recurring silence check,
//! and guarantees symmetric teardown.
//!
//! Concurrency shape: the socket is split; a spawned sender task is the only
//! writer, fed by an mpsc channel so outbound audio keeps arrival order. The
//! main loop is a `select!` over inbound frames and the poll timer, so
//! closing the telephony leg tears down the timer and the AI session with
//! it. No state is shared across calls.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::realtime::create_session;
use crate::core::session::CallBridge;
use crate::core::turn::TurnPolicy;
use crate::state::AppState;

use super::messages::{InboundFrame, MediaRoute, OutboundFrame};

/// Channel buffer size for the outbound route channel
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Media stream WebSocket handler
///
/// Upgrades the HTTP connection the telephony provider opens against
/// `/media` and runs the call session until either leg closes.
pub async fn media_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("Media stream connection upgrade requested");
    ws.on_upgrade(move |socket| handle_media_socket(socket, state))
}

/// Run one call session over an upgraded media socket.
async fn handle_media_socket(socket: WebSocket, state: Arc<AppState>) {
    info!("Media stream connected");

    let (mut sender, mut receiver) = socket.split();
    let (route_tx, mut route_rx) = mpsc::channel::<MediaRoute>(CHANNEL_BUFFER_SIZE);

    // Sender task: sole writer on the telephony socket. Outbound media needs
    // the stream id from the start frame; deltas that arrive before it are
    // unaddressable and dropped.
    let sender_task = tokio::spawn(async move {
        let mut stream_sid: Option<String> = None;
        while let Some(route) = route_rx.recv().await {
            if matches!(route, MediaRoute::Close) {
                info!("Closing media stream connection");
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            match outbound_for(route, &mut stream_sid) {
                Some(json) => {
                    if let Err(e) = sender.send(Message::Text(json.into())).await {
                        error!("Failed to send media frame: {}", e);
                        break;
                    }
                }
                None => continue,
            }
        }
    });

    // Session factory: the AI leg is built per call from configuration
    let mut session = match create_session(&state.config) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create AI session: {e}");
            let _ = route_tx.send(MediaRoute::Close).await;
            let _ = sender_task.await;
            return;
        }
    };

    // Callbacks are registered before connect. AI audio goes to the sender
    // task; AI close propagates as telephony close; AI errors are non-fatal.
    let tx = route_tx.clone();
    session.on_audio(Arc::new(move |payload: String| {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(MediaRoute::AudioDelta(payload)).await;
        })
    }));

    let tx = route_tx.clone();
    session.on_close(Arc::new(move || {
        let tx = tx.clone();
        Box::pin(async move {
            let _ = tx.send(MediaRoute::Close).await;
        })
    }));

    session.on_error(Arc::new(move |e| {
        Box::pin(async move {
            warn!("AI session error (relay continues): {e}");
        })
    }));

    if let Err(e) = session.connect().await {
        error!("Failed to connect AI session: {e}");
        let _ = route_tx.send(MediaRoute::Close).await;
        let _ = sender_task.await;
        return;
    }

    let mut bridge = CallBridge::new(session, TurnPolicy::from_config(&state.config.turn));

    // The recurring silence check lives in this loop; dropping the loop is
    // the cancellation mechanism.
    let mut poll = tokio::time::interval(Duration::from_millis(state.config.turn.poll_interval_ms));

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match InboundFrame::decode(&text) {
                            Some(InboundFrame::Start { start }) => {
                                let _ = route_tx
                                    .send(MediaRoute::StreamStarted(start.stream_sid.clone()))
                                    .await;
                                bridge.on_start(start.stream_sid);
                            }
                            Some(InboundFrame::Media { media }) => {
                                bridge.on_media(&media.payload, Instant::now()).await;
                            }
                            Some(InboundFrame::Stop) => {
                                bridge.on_stop().await;
                            }
                            Some(InboundFrame::Connected)
                            | Some(InboundFrame::Mark)
                            | Some(InboundFrame::Unknown) => {}
                            None => {
                                // Malformed frames are expected noise
                                debug!("Discarding unparseable media frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(stream_sid = ?bridge.stream_sid(), "Media stream closed by provider");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Media stream error: {}", e);
                        break;
                    }
                    None => {
                        info!(stream_sid = ?bridge.stream_sid(), "Media stream ended");
                        break;
                    }
                }
            }
            _ = poll.tick() => {
                bridge.on_poll(Instant::now()).await;
            }
        }
    }

    // Teardown: telephony leg is gone; cancel the sender and close the AI
    // leg. Both paths are idempotent, so an AI-initiated close ends here too.
    sender_task.abort();
    bridge.shutdown().await;

    info!("Media stream session terminated");
}

/// Translate a route message into an outbound JSON frame, tracking the
/// stream id from the start frame. Returns `None` when there is nothing to
/// write (id update, or a delta with no stream to address).
fn outbound_for(route: MediaRoute, stream_sid: &mut Option<String>) -> Option<String> {
    match route {
        MediaRoute::StreamStarted(sid) => {
            *stream_sid = Some(sid);
            None
        }
        MediaRoute::AudioDelta(payload) => match stream_sid {
            Some(sid) => {
                let frame = OutboundFrame::media(sid.clone(), payload);
                match serde_json::to_string(&frame) {
                    Ok(json) => Some(json),
                    Err(e) => {
                        error!("Failed to serialize outbound media frame: {}", e);
                        None
                    }
                }
            }
            None => {
                debug!("Dropping audio delta received before start frame");
                None
            }
        },
        // Close is handled by the sender loop before translation
        MediaRoute::Close => None,
    }
}
