//! Application services

mod diagnosis_service;

pub use diagnosis_service::DiagnosisService;

#[cfg(test)]
pub use diagnosis_service::fixtures;
