//! Runtime prerequisite detection.
//!
//! # Modules
//!
//! - [`probe`] - Capability probes answering "is this feature available"
//! - [`status`] - Check results and the prerequisite matrix
//! - [`matrix`] - Building the prerequisite matrix for a deployment

pub mod matrix;
pub mod probe;
pub mod status;

pub use matrix::{PrerequisiteMatrixBuilder, MINIMUM_PLATFORM_VERSION};
pub use probe::{CapabilityProbe, FeatureId, FeatureKind, InterpreterProbe, StaticProbe};
pub use status::{CheckResult, PrerequisiteMatrix, RequirementLevel};
