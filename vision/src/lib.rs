pub mod adapters;
pub mod clock;
pub mod domain;
pub mod events;
pub mod fingerprint;
pub mod parser;
pub mod planes;
pub mod ports;

pub use domain::{CacheEntry, DamageLevel, RecognitionResult, RecognitionSettings, RecognitionSource};
pub use fingerprint::{Fingerprint, PreparedImage};
pub use planes::data::{RecognitionService, Served, ServedFrom};
