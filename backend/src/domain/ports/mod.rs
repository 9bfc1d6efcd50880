//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod diagnosis_provider;

#[cfg(test)]
pub use diagnosis_provider::MockDiagnosisProvider;
pub use diagnosis_provider::{DiagnoseOptions, DiagnosisProvider, DiagnosisProviderError};
