//! One WebSocket connection driving one session.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppState;
use super::messages::{IncomingMessage, OutgoingMessage};
use crate::conversation::observer::{ChannelObserver, SessionEvent};
use crate::conversation::session::Session;
use crate::error::codes;

type Outbox = mpsc::UnboundedSender<OutgoingMessage>;

/// Upgrades `GET /ws` into a call session.
pub(super) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Counts a connection for as long as it lives.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let _active = ActiveGuard::new(&state.active_sessions);
    let (mut sender, mut receiver) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutgoingMessage>();
    let (observer, mut events) = ChannelObserver::channel();
    let session = Session::new(
        state.config.pacing.clone(),
        Arc::clone(&state.generator),
        Arc::new(observer),
    );
    info!(session = %session.id(), "call connected");

    let sender_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("failed to serialize outgoing frame: {e}");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(json.into())).await {
                debug!("websocket send failed: {e}");
                break;
            }
        }
    });

    loop {
        tokio::select! {
            inbound = receiver.next() => match inbound {
                Some(Ok(message)) => {
                    let Some(reply) = process_message(message, &session, &out_tx) else {
                        break;
                    };
                    // Notifications raised while handling the frame precede its reply.
                    flush_events(&mut events, &out_tx);
                    if let Some(reply) = reply {
                        let _ = out_tx.send(reply);
                    }
                }
                Some(Err(e)) => {
                    warn!(session = %session.id(), "websocket error: {e}");
                    break;
                }
                None => break,
            },
            Some(event) = events.recv() => {
                if out_tx.send(event.into()).is_err() {
                    break;
                }
            }
            () = state.shutdown.cancelled() => {
                debug!(session = %session.id(), "server shutting down");
                break;
            }
        }
    }

    session.clear();
    sender_task.abort();
    info!(session = %session.id(), "call disconnected");
}

fn flush_events(events: &mut mpsc::UnboundedReceiver<SessionEvent>, out: &Outbox) {
    while let Ok(event) = events.try_recv() {
        let _ = out.send(event.into());
    }
}

/// Handle one frame.
///
/// `None` closes the connection; otherwise carries the direct reply, if any.
fn process_message(
    message: Message,
    session: &Arc<Session>,
    out: &Outbox,
) -> Option<Option<OutgoingMessage>> {
    match message {
        Message::Text(text) => match serde_json::from_str::<IncomingMessage>(text.as_str()) {
            Ok(incoming) => Some(handle_incoming(incoming, session, out)),
            Err(e) => {
                debug!(session = %session.id(), "invalid frame: {e}");
                Some(Some(OutgoingMessage::error(
                    codes::INVALID_MESSAGE,
                    format!("Invalid message format: {e}"),
                )))
            }
        },
        Message::Binary(_) => Some(Some(OutgoingMessage::error(
            codes::INVALID_MESSAGE,
            "binary frames are not supported",
        ))),
        Message::Ping(_) | Message::Pong(_) => Some(None),
        Message::Close(_) => None,
    }
}

fn handle_incoming(
    incoming: IncomingMessage,
    session: &Arc<Session>,
    out: &Outbox,
) -> Option<OutgoingMessage> {
    match incoming {
        IncomingMessage::Transcript {
            text,
            speaker,
            is_final,
        } => {
            session.handle_transcript(&text, speaker.as_deref(), is_final);
            None
        }
        IncomingMessage::QuestionShown => {
            session.notify_question_shown();
            None
        }
        IncomingMessage::GenerateQuestion => session
            .generate_now()
            .err()
            .map(|e| OutgoingMessage::error(e.code(), e.to_string())),
        IncomingMessage::GetCompletionStatus => Some(OutgoingMessage::CompletionStatus {
            data: session.completion_status(),
        }),
        IncomingMessage::EndCall => {
            let session = Arc::clone(session);
            let out = out.clone();
            tokio::spawn(async move {
                // Success is reported through the observer.
                if let Err(e) = session.generate_summary().await {
                    warn!(session = %session.id(), "summary failed: {e}");
                    let _ = out.send(OutgoingMessage::error(e.code(), e.to_string()));
                }
            });
            None
        }
        IncomingMessage::Clear => {
            session.clear();
            Some(OutgoingMessage::Cleared)
        }
    }
}
