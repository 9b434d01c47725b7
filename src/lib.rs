//! Media info proxy for Instagram post links.
//!
//! `GET /info?url=...` validates the link, asks the extraction API about it
//! and answers with a stable JSON shape regardless of what the upstream sent.

pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod server;
pub mod state;
pub mod upstream;
pub mod validate;
