//! Request and response types of the HTTP API

pub mod diagnosis;
pub mod error;

pub use diagnosis::{DiagnosisResponse, ReferenceImages, ServiceInfo};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
