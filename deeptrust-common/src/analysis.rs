//! Forensic analysis result model
//!
//! The JSON field names here are the public output contract of `/analyze-image`;
//! the service builds these values only through its response validator and the
//! client deserializes them as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-way classification assigned to an analyzed image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AI Generated")]
    AiGenerated,
    #[serde(rename = "Likely AI Generated")]
    LikelyAiGenerated,
    #[serde(rename = "Uncertain")]
    Uncertain,
    #[serde(rename = "Likely Real")]
    LikelyReal,
    #[serde(rename = "Real")]
    Real,
}

impl Verdict {
    /// All verdicts, from most synthetic to most authentic
    pub const ALL: [Verdict; 5] = [
        Verdict::AiGenerated,
        Verdict::LikelyAiGenerated,
        Verdict::Uncertain,
        Verdict::LikelyReal,
        Verdict::Real,
    ];

    /// Wire literal used by the model and the HTTP API
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::AiGenerated => "AI Generated",
            Verdict::LikelyAiGenerated => "Likely AI Generated",
            Verdict::Uncertain => "Uncertain",
            Verdict::LikelyReal => "Likely Real",
            Verdict::Real => "Real",
        }
    }

    /// Parse an exact wire literal (case-sensitive)
    pub fn from_literal(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == value)
    }

    pub fn leans_ai(&self) -> bool {
        matches!(self, Verdict::AiGenerated | Verdict::LikelyAiGenerated)
    }

    pub fn leans_real(&self) -> bool {
        matches!(self, Verdict::LikelyReal | Verdict::Real)
    }

    pub fn is_uncertain(&self) -> bool {
        matches!(self, Verdict::Uncertain)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a detected forensic issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    pub fn from_literal(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A specific anomaly found in the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub name: String,
    pub description: String,
    pub severity: Severity,
}

/// Supplementary metadata/provenance findings
///
/// Every field is optional on the wire; absent values read as `false` / empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicMetadata {
    pub exif_present: bool,
    pub software_fingerprint: String,
    pub compression_analysis: String,
    pub provenance_signals: String,
    pub tampering_indicators: String,
    pub metadata_verdict: String,
}

/// Validated forensic verdict for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    /// Certainty in `verdict`, 1..=100
    pub confidence: u8,
    pub summary: String,
    /// Display order only
    pub issues: Vec<IssueRecord>,
    /// Names of checks that showed no anomaly, display order only
    pub clear: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ForensicMetadata>,
}

impl AnalysisResult {
    pub const MIN_CONFIDENCE: i64 = 1;
    pub const MAX_CONFIDENCE: i64 = 100;

    /// Issues of the given severity, in display order
    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &IssueRecord> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}
