//! Failure accumulation and the manual follow-up report

use crate::api::ApiError;
use crate::{Codelist, RdsId};

use super::recovery::FailureKind;

/// RDS whose codelist listing failed after recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRds {
    /// RDS identifier
    pub id: RdsId,
    /// Classification of the last error
    pub kind: FailureKind,
    /// Last error message
    pub error: String,
}

/// Codelist whose export failed after recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedCodelist {
    /// The codelist
    pub codelist: Codelist,
    /// Classification of the last error
    pub kind: FailureKind,
    /// Last error message
    pub error: String,
}

/// Items that exhausted recovery, in the order they failed
#[derive(Debug, Clone, Default)]
pub struct FailureSet {
    rds: Vec<FailedRds>,
    codelists: Vec<FailedCodelist>,
}

impl FailureSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed RDS; a second record for the same id is ignored
    pub fn record_rds(&mut self, id: RdsId, err: &ApiError) {
        if self.rds.iter().any(|f| f.id == id) {
            return;
        }
        self.rds.push(FailedRds {
            id,
            kind: FailureKind::classify(err),
            error: err.to_string(),
        });
    }

    /// Record a failed codelist; a second record for the same id is ignored
    pub fn record_codelist(&mut self, codelist: Codelist, err: &ApiError) {
        if self.codelists.iter().any(|f| f.codelist.id == codelist.id) {
            return;
        }
        self.codelists.push(FailedCodelist {
            codelist,
            kind: FailureKind::classify(err),
            error: err.to_string(),
        });
    }

    /// Failed RDS, in failure order
    pub fn rds(&self) -> &[FailedRds] {
        &self.rds
    }

    /// Failed codelists, in failure order
    pub fn codelists(&self) -> &[FailedCodelist] {
        &self.codelists
    }

    /// True when nothing failed
    pub fn is_empty(&self) -> bool {
        self.rds.is_empty() && self.codelists.is_empty()
    }

    /// Total number of failed items
    pub fn len(&self) -> usize {
        self.rds.len() + self.codelists.len()
    }

    /// Operator-facing summary of everything that needs manual follow-up
    pub fn render_report(&self) -> String {
        if self.is_empty() {
            return "All reference data sets and codelists were exported. No manual follow-up needed."
                .to_string();
        }

        let mut lines = vec![format!(
            "[MANUAL FOLLOW-UP] {} item(s) failed after recovery and were not exported:",
            self.len()
        )];

        if !self.rds.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "Reference data sets ({}) - their codelists were never listed:",
                self.rds.len()
            ));
            for failed in &self.rds {
                lines.push(format!("  - RDS {}", failed.id));
                lines.push(format!("      Last error: {}", failed.error));
                lines.push(format!("      Suggestion: {}", failed.kind.suggestion()));
            }
        }

        if !self.codelists.is_empty() {
            lines.push(String::new());
            lines.push(format!("Codelists ({}):", self.codelists.len()));
            for failed in &self.codelists {
                lines.push(format!(
                    "  - {} (id: {})",
                    failed.codelist.name, failed.codelist.id
                ));
                lines.push(format!("      Last error: {}", failed.error));
                lines.push(format!("      Suggestion: {}", failed.kind.suggestion()));
            }
        }

        lines.join("\n")
    }
}
