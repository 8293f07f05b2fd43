//! Server-Sent Events stream of the caller's tree changes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use growth::tree::Tree;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::owner::Owner;
use crate::state::{AppState, ForestEvent};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SsePayload<'a> {
    #[serde(rename = "type")]
    event_type: &'static str,
    tree: &'a Tree,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_tree: Option<&'a Tree>,
}

impl<'a> From<&'a ForestEvent> for SsePayload<'a> {
    fn from(event: &'a ForestEvent) -> Self {
        match event {
            ForestEvent::TreePlanted { tree } => SsePayload {
                event_type: "tree_planted",
                tree,
                completed_tree: None,
            },
            ForestEvent::TreeUpdated { tree } => SsePayload {
                event_type: "tree_updated",
                tree,
                completed_tree: None,
            },
            ForestEvent::TreeCompleted {
                completed_tree,
                new_tree,
            } => SsePayload {
                event_type: "tree_completed",
                tree: new_tree,
                completed_tree: Some(completed_tree),
            },
        }
    }
}

/// Serialized payload for `event` if it belongs to `owner_id`.
fn payload_for(owner_id: &str, event: &ForestEvent) -> Option<String> {
    if event.owner_id() != owner_id {
        return None;
    }
    serde_json::to_string(&SsePayload::from(event)).ok()
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();
    debug!(owner = %owner_id, "SSE client connected");

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(forest_event) => {
                    if let Some(json) = payload_for(&owner_id, &forest_event) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
