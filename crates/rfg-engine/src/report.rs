use std::fmt;

use rfg_core::GeneratedFile;
use rfg_core::ir::IrWarning;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks release of the artifact set.
    Fatal,
    /// Informational.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Fatal => "fatal",
            Severity::Warning => "warning",
        })
    }
}

/// One validation finding, attributed to an artifact path or a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub path: String,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.path, self.message)
    }
}

/// Findings of one generation run, in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fatal(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, Severity::Fatal, message);
    }

    pub fn warning(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(path, Severity::Warning, message);
    }

    fn push(&mut self, path: impl Into<String>, severity: Severity, message: impl Into<String>) {
        self.findings.push(Finding {
            path: path.into(),
            severity,
            message: message.into(),
        });
    }

    /// Record non-fatal parser or mapper warnings.
    pub fn extend_warnings<'a>(&mut self, warnings: impl IntoIterator<Item = &'a IrWarning>) {
        for w in warnings {
            self.warning(&w.location, &w.message);
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.findings.extend(other.findings);
    }

    pub fn fatals(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Fatal)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn has_fatal(&self) -> bool {
        self.fatals().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        Ok(())
    }
}

/// Artifacts of a run plus the report that decides whether they may be released.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub artifacts: Vec<GeneratedFile>,
    pub report: ValidationReport,
}

impl GenerationOutput {
    /// False as soon as any fatal finding exists.
    pub fn is_releasable(&self) -> bool {
        !self.report.has_fatal()
    }

    pub fn artifact(&self, path: &str) -> Option<&GeneratedFile> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}
