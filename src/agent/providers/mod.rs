//! Concrete [`LlmProvider`](super::provider::LlmProvider) implementations.

pub mod gemini;
pub mod groq;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
