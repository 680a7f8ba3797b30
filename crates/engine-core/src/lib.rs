// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared data model, canonical JSON, and deterministic hashing for the
//! knowledge-graph artifact engine. Every other engine crate depends on
//! this one for its stable types.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod canon;
pub mod clock;
pub mod model;

pub use builder::{ArtifactBuilder, AttestationBuilder, BuildError, TrustPolicyBuilder};
pub use canon::{CanonError, Hash};
pub use clock::{Clock, FixedClock, SystemClock};
pub use model::*;
