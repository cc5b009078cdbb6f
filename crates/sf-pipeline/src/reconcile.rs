//! Flattening of row results into per-row outcomes and totals.

use crate::session::RowResult;

/// The flag value Salesforce uses for a rejected row.
pub const FAILURE_FLAG: &str = "false";

/// Outcome of one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResult {
    pub id: Option<String>,
    pub success: String,
    pub error: Option<String>,
}

impl ParsedResult {
    /// Only the exact `"false"` flag marks a failure.
    pub fn is_failure(&self) -> bool {
        self.success == FAILURE_FLAG
    }
}

/// Totals of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub success_count: usize,
    pub error_count: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.success_count + self.error_count
    }
}

/// Convert results and count successes and failures in one pass.
pub fn reconcile(results: Vec<RowResult>) -> (Vec<ParsedResult>, RunSummary) {
    let mut summary = RunSummary::default();
    let parsed = results
        .into_iter()
        .map(|result| {
            let parsed = ParsedResult {
                id: result.id,
                success: result.success,
                error: result.error,
            };
            if parsed.is_failure() {
                summary.error_count += 1;
            } else {
                summary.success_count += 1;
            }
            parsed
        })
        .collect();
    (parsed, summary)
}
