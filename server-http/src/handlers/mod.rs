pub mod admin;
pub mod events;
pub mod health;
pub mod recognition;

pub use admin::{clear_cache, preload_model};
pub use events::stream_events;
pub use health::health_check;
pub use recognition::recognize_vehicle;
