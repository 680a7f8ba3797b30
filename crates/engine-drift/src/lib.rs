//! Content-type-aware drift detection between an expected and an actual
//! artifact: fingerprinting, difference detection with severity scoring,
//! and similarity/drift-score computation with follow-up recommendations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compare;
mod content_type;
mod error;
mod fingerprint;
mod input;

pub use compare::diff;
pub use content_type::{detect_content_type, ContentType};
pub use engine_core::{Difference, DriftResult, DriftTypes, Recommendation, Severity};
pub use error::DriftError;
pub use fingerprint::{Fingerprint, FingerprintCache};
pub use input::Comparable;
