//! # DeepTrust Common Library
//!
//! Shared code for the DeepTrust service and its clients:
//! - Analysis result data model (verdict, issues, forensic metadata)
//! - Wire types for the `/analyze-image` endpoint
//! - Configuration loading (TOML bootstrap + environment)
//! - Logging initialisation

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;

pub use analysis::{AnalysisResult, ForensicMetadata, IssueRecord, Severity, Verdict};
pub use error::{Error, Result};
