//! Upstream connector: OpenAI-compatible chat completions over HTTP

mod client;
mod sse;
mod types;

pub use client::UpstreamConnector;
