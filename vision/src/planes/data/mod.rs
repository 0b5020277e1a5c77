pub mod recognition_operations;

pub use recognition_operations::{RecognitionService, Served, ServedFrom};
