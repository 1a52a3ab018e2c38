//! Server-side client for the Meta Conversions API.
//!
//! Builds standardized marketing events ("Lead", "ViewContent", …), hashes
//! any PII before it leaves the process, derives deterministic event ids for
//! cross-source deduplication, and delivers with a linear-backoff retry.
//! Delivery is best-effort by contract: [`MetaClient::send`] never surfaces
//! an error to its caller — attribution must not be able to fail a
//! user-facing request.

mod client;
mod error;
mod hash;
mod retry;
mod types;

pub use client::MetaClient;
pub use error::MetaError;
pub use hash::{deterministic_event_id, hash_identifier, lead_event_id};
pub use types::{ConversionEvent, CustomData, UserData};
