// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! WebSocket handler for live reload functionality.
//!
//! Every subscription owns its own broadcast receiver, so a slow tab only
//! lags itself and never holds up the watcher or other tabs.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::watcher::ChangeEvent;

/// Why a subscription ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEnd {
    /// The event stream closed (registry shut down).
    EventsClosed,
    /// The client went away or a write failed.
    ClientGone,
}

/// Handles a WebSocket connection for live reload notifications.
pub async fn handle_websocket(socket: WebSocket, events: broadcast::Receiver<ChangeEvent>) {
    let (sink, stream) = socket.split();
    let end = forward_events(sink, stream, events).await;
    debug!(?end, "live reload subscription ended");
}

/// Sends one text frame per change event until either side goes away.
///
/// The frame holds the event kind, e.g. `WRITE`.
pub async fn forward_events<Tx, Rx, E>(
    mut sink: Tx,
    mut incoming: Rx,
    mut events: broadcast::Receiver<ChangeEvent>,
) -> SubscriptionEnd
where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        if sink.send(Message::Text(event.kind.to_string())).await.is_err() {
                            return SubscriptionEnd::ClientGone;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        let _ = sink.send(Message::Close(None)).await;
                        return SubscriptionEnd::EventsClosed;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "live reload subscriber lagged behind");
                        continue;
                    }
                }
            }
            // Pings are answered by the protocol layer; only watch for the end.
            msg = incoming.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                        return SubscriptionEnd::ClientGone;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
