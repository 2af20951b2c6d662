//! Environment probing for the parameter payload.
//!
//! Two providers sit behind [`CapabilityProvider`]: a high-entropy client
//! hints query and a User-Agent pattern classifier. [`EnvironmentProbe`]
//! picks between them by availability and never fails.

pub mod classifier;
pub mod client_hints;
pub mod probe;

pub use classifier::{classify, UserAgentClassifier};
pub use client_hints::{BrandVersion, ClientHintsProvider, HighEntropySource, HighEntropyValues};
pub use probe::{CapabilityProvider, EnvironmentProbe, ProbeError};
