//! HTTP API fronting the chat client

pub mod api;
