//! Employee attrition prediction service.
//!
//! Serves a small form that collects employee attributes, runs them
//! through a pre-trained classification artifact and reports whether the
//! employee is likely to leave the company.

pub mod inference;
pub mod models;
pub mod routes;

pub use inference::{AttritionArtifact, ModelInfo};
pub use models::{ApiResponse, EmployeeRecord, PredictionResult};
