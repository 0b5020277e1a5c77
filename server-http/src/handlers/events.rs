use crate::state::AppState;
use axum::{
    extract::State,
    http::Uri,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use vision::events::RecognitionEvent;

#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    event_type: Vec<String>,
    fingerprint: Vec<String>,
}

impl EventFilter {
    /// Parse query string with CSV support for multiple values
    /// Examples: ?type=cache_hit,local_fallback&fingerprint=ab12...
    fn from_query_string(query: &str) -> Self {
        let mut filter = Self::default();

        for pair in query.split('&') {
            if let Some((key, value)) = pair.split_once('=') {
                let values = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                match key {
                    "type" => filter.event_type.extend(values),
                    "fingerprint" => filter.fingerprint.extend(values),
                    _ => {}
                }
            }
        }

        filter
    }

    fn matches(&self, event: &RecognitionEvent) -> bool {
        if !self.event_type.is_empty() && !self.event_type.iter().any(|t| t == event.kind()) {
            return false;
        }

        // Cache-wide events (clear) carry no fingerprint and always pass
        if !self.fingerprint.is_empty() {
            if let Some(fingerprint) = event.fingerprint() {
                if !self.fingerprint.iter().any(|f| f == fingerprint) {
                    return false;
                }
            }
        }

        true
    }
}

/// SSE endpoint that streams recognition events to clients
pub async fn stream_events(
    State(state): State<AppState>,
    uri: Uri,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let filter = uri
        .query()
        .map(EventFilter::from_query_string)
        .unwrap_or_default();

    tracing::info!(
        "New SSE client connected. Filters: type={:?}, fingerprint={:?}",
        filter.event_type,
        filter.fingerprint
    );

    let stream = BroadcastStream::new(state.event_channel.subscribe());

    let filtered_stream = stream.filter_map(move |result| {
        let filter = filter.clone();
        async move {
            match result {
                Ok(event) => {
                    let should_send = filter.matches(&event);
                    tracing::debug!("Received event: type={}, should_send={}", event.kind(), should_send);
                    should_send.then(|| Ok(to_sse_event(&event)))
                }
                Err(BroadcastStreamRecvError::Lagged(n)) => Some(Ok(Event::default()
                    .event("error")
                    .data(format!("Lagged by {} events", n)))),
            }
        }
    });

    Sse::new(filtered_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse_event(event: &RecognitionEvent) -> Event {
    Event::default()
        .event(event.kind())
        .json_data(event)
        .unwrap_or_else(|e| {
            Event::default()
                .event("error")
                .data(format!("Failed to encode event: {}", e))
        })
}
