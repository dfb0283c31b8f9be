mod client;
pub(crate) mod wire;

pub use client::{OpenAIClient, OPENAI_API_BASE};
