// SPDX-License-Identifier: MIT OR Apache-2.0
//! RDF ingestion: parse Turtle sources into a deduplicated
//! [`engine_core::Graph`].
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod ingest;

pub use error::GraphError;
pub use ingest::{ingest, is_xsd_integer, local_name, Source};
