//! Server-Sent Events (SSE) feed of engine events
//!
//! A new client first receives an `EngineState` event carrying the current
//! snapshot, then every `LiveplayEvent` as it is broadcast. The SSE event
//! name is the event's `type` tag.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use liveplay_common::events::LiveplayEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// GET /events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    // Subscribe before reading the snapshot so nothing falls between them
    let rx = ctx.state.subscribe_events();
    let initial = Event::default()
        .event("EngineState")
        .json_data(ctx.state.get_snapshot().await)
        .map_err(|e| warn!("Failed to serialize engine state: {}", e))
        .ok();

    let live = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => to_sse_event(&event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("SSE client lagged, skipped {} events", skipped);
                None
            }
        }
    });

    let stream = stream::iter(initial)
        .chain(live)
        .map(Ok::<_, Infallible>);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}

fn to_sse_event(event: &LiveplayEvent) -> Option<Event> {
    match Event::default().event(event.event_type()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", event.event_type(), e);
            None
        }
    }
}
