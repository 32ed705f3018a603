use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{
        SharedState,
        bus::{display_channel, player_channel, room_channel},
    },
};

/// Subscribe to a room's shared event channel.
pub fn subscribe_room(state: &SharedState, room_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.bus().subscribe(&room_channel(room_id))
}

/// Subscribe to a room's display channel.
pub fn subscribe_display(state: &SharedState, room_id: Uuid) -> broadcast::Receiver<ServerEvent> {
    state.bus().subscribe(&display_channel(room_id))
}

/// Subscribe to a player's private channel.
pub fn subscribe_player(
    state: &SharedState,
    room_id: Uuid,
    player_id: Uuid,
) -> broadcast::Receiver<ServerEvent> {
    state.bus().subscribe(&player_channel(room_id, player_id))
}

/// Build the first event pushed to a freshly connected stream.
pub async fn handshake_event(state: &SharedState, channel: &str) -> Option<ServerEvent> {
    ServerEvent::json(
        Some("connected".to_string()),
        &Handshake {
            channel: channel.to_owned(),
            message: "subscribed".to_owned(),
            degraded: state.is_degraded().await,
        },
    )
    .ok()
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    handshake: Option<ServerEvent>,
    channel: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if let Some(payload) = handshake {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive;
                            // clients re-fetch state on the next event anyway.
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!(channel, "SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
