use std::fmt;

use crate::etl::upsert::UpsertOutcome;

/**
 * Outcome of processing a single source row.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Skipped(String),
    Failed(String),
}

impl From<UpsertOutcome> for RowOutcome {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => RowOutcome::Created,
            UpsertOutcome::Updated => RowOutcome::Updated,
        }
    }
}

/**
 * A row-level problem recorded for the run summary: the offending natural key
 * and a short reason.
 */
#[derive(Debug, Clone)]
pub struct RowIssue {
    pub key: String,
    pub reason: String,
}

/**
 * Accumulated audit trail of one batch run. Row-level problems are counted
 * and listed; they never abort the run.
 */
#[derive(Debug)]
pub struct BatchReport {
    /**
     * Human-readable label of the run, e.g. the importer name.
     */
    pub label: String,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    /**
     * Per-row problems, in processing order.
     */
    pub issues: Vec<RowIssue>,
}

impl BatchReport {
    /**
     * Creates an empty report for the given run label.
     */
    pub fn new(label: &str) -> Self {
        BatchReport { label: label.to_string(), created: 0, updated: 0, skipped: 0, errors: 0, issues: Vec::new() }
    }

    /**
     * Records the outcome of one row, keyed by its natural key.
     */
    pub fn record(&mut self, key: &str, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped(reason) => {
                tracing::warn!("Row skipped for {}: {}", key, reason);
                self.skipped += 1;
                self.issues.push(RowIssue { key: key.to_string(), reason });
            }
            RowOutcome::Failed(reason) => {
                tracing::warn!("Row failed for {}: {}", key, reason);
                self.errors += 1;
                self.issues.push(RowIssue { key: key.to_string(), reason });
            }
        }
    }

    /**
     * Records an ambiguous person-name resolution. The collision is surfaced
     * in the summary regardless of how the policy decided the row.
     */
    pub fn record_name_collision(&mut self, full_name: &str, candidates: usize, decision: &str) {
        tracing::warn!("Name collision for {}: {} candidates, {}", full_name, candidates, decision);
        self.issues.push(RowIssue { key: full_name.to_string(), reason: format!("ambiguous name ({candidates} candidates), {decision}") });
    }

    /**
     * Records the creation of a stub entity, e.g. an auto-vivified party.
     */
    pub fn record_stub_created(&mut self, key: &str) {
        tracing::info!("Created stub entity for {}", key);
        self.created += 1;
    }

    /**
     * Folds the counters and issues of another report into this one. Used by
     * runs that process several source files.
     */
    pub fn absorb(&mut self, other: BatchReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errors += other.errors;
        self.issues.extend(other.issues);
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Import {} complete: created={}, updated={}, skipped={}, errors={}", self.label, self.created, self.updated, self.skipped, self.errors)?;
        for issue in &self.issues {
            writeln!(f, "  {}: {}", issue.key, issue.reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_record_increments_counters() {
        let mut report = BatchReport::new("parties");
        report.record("PT", RowOutcome::Created);
        report.record("PT", RowOutcome::Updated);
        report.record("4109999", RowOutcome::Skipped("Municipality not found".to_string()));
        report.record("4108888", RowOutcome::Failed("Unhandled database error".to_string()));
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_display_lists_offending_keys() {
        let mut report = BatchReport::new("stats");
        report.record("4109999", RowOutcome::Skipped("Municipality not found".to_string()));
        let rendered = report.to_string();
        assert!(rendered.contains("created=0, updated=0, skipped=1, errors=0"));
        assert!(rendered.contains("4109999: Municipality not found"));
    }

    #[test]
    fn test_absorb_folds_counters() {
        let mut total = BatchReport::new("officers");
        let mut part = BatchReport::new("mayors");
        part.record("4104808", RowOutcome::Created);
        part.record_name_collision("JOÃO DA SILVA", 2, "kept oldest");
        total.absorb(part);
        assert_eq!(total.created, 1);
        assert_eq!(total.issues.len(), 1);
    }
}
