//! Git-notes receipt store: attach signed attestations to commits,
//! enumerate and query them, and age out old receipts.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod git;
mod store;
mod verify;

pub use error::ReceiptStoreError;
pub use git::NOTES_REF;
pub use store::{discover_root, CleanupOptions, ReceiptStore};
pub use verify::verify_receipt;
