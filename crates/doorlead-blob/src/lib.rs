//! Image upload service backed by the Vercel Blob REST API.
//!
//! Validates a whole batch up front (count, per-file size, combined size,
//! MIME type) so an invalid batch never touches storage, then uploads each
//! accepted file under a collision-resistant key. Files that were already
//! stored when a later upload in the same batch fails are not deleted —
//! the batch is best-effort, not atomic.

mod client;
mod error;
mod validate;

pub use client::BlobClient;
pub use error::UploadError;
pub use validate::{
    validate_batch, UploadFile, ALLOWED_CONTENT_TYPES, MAX_FILES, MAX_FILE_SIZE, MAX_TOTAL_SIZE,
};
