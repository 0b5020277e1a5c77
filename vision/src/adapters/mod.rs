pub mod gemini;
pub mod local;

pub use gemini::GeminiRecognizer;
pub use local::PlaceholderLocalRecognizer;
