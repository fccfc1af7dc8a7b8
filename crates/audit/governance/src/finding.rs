//! Audit findings.

use derive_more::Display;
use serde::Serialize;

/// The area of the deployment a finding concerns.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FindingCategory {
    /// How the rollup was deployed.
    Provenance,
    /// Ownership of the rollup and its `ProxyAdmin`.
    Ownership,
    /// Admins of the satellite proxies.
    ProxyAdmin,
    /// Role holders of the `UpgradeExecutor`.
    UpgradeExecutor,
    /// Native and stake tokens.
    Token,
    /// Data availability committee keysets.
    DataAvailability,
}

/// How serious a finding is. Ordered from least to most severe.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// A check could not run.
    Skipped,
    /// The deployment deviates from the expected governance pattern.
    Violation,
    /// The deployment can be taken over.
    Critical,
}

/// A single result of the audit.
#[derive(Debug, Display, Clone, PartialEq, Eq, Serialize)]
#[display("[{severity}] {category}: {message}")]
pub struct Finding {
    /// What the finding concerns.
    pub category: FindingCategory,
    /// How serious it is.
    pub severity: Severity,
    /// A human readable description.
    pub message: String,
}

impl Finding {
    /// A check that could not run.
    pub fn skipped(category: FindingCategory, message: impl Into<String>) -> Self {
        Self { category, severity: Severity::Skipped, message: message.into() }
    }

    /// A deviation from the expected pattern.
    pub fn violation(category: FindingCategory, message: impl Into<String>) -> Self {
        Self { category, severity: Severity::Violation, message: message.into() }
    }

    /// A critical weakness.
    pub fn critical(category: FindingCategory, message: impl Into<String>) -> Self {
        Self { category, severity: Severity::Critical, message: message.into() }
    }
}
