use std::sync::Arc;
use tokio::sync::broadcast;
use vision::RecognitionService;
use vision::events::RecognitionEvent;

/// Buffered events per SSE subscriber before it starts lagging
const EVENT_BUFFER: usize = 1000;

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub recognition: Arc<RecognitionService>,
    pub event_channel: broadcast::Sender<RecognitionEvent>,
}

impl AppState {
    /// Attach an event channel to the service so `/events` can observe it
    pub fn new(service: RecognitionService) -> Self {
        let (event_tx, _event_rx) = broadcast::channel(EVENT_BUFFER);
        let recognition = Arc::new(service.with_event_broadcaster(event_tx.clone()));

        Self {
            recognition,
            event_channel: event_tx,
        }
    }

    pub fn remote_enabled(&self) -> bool {
        self.recognition.remote_enabled()
    }
}
