//! OpenAI-compatible chat-completions client.
//!
//! Every provider in the endpoint table speaks this wire format, so one
//! client covers all of them; only the base URL and credential differ.

mod api;
mod client;

pub use client::{OpenAiCompatClient, OpenAiCompatFactory};
