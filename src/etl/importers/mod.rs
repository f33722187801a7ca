use crate::etl::report::{BatchReport, RowOutcome};
use crate::model::apperror::ApplicationError;

pub mod council_seats;
pub mod elections;
pub mod meta;
pub mod officers;
pub mod parties;
pub mod stats;
pub mod territories;

/**
 * Converts a row-level error into a counted report outcome. Recoverable
 * errors (missing reference, invalid row) count as skips; storage failures
 * count as errors. Neither aborts the surrounding loop.
 */
pub(crate) fn record_row_error(report: &mut BatchReport, key: &str, error: ApplicationError) {
    if error.is_row_level() {
        report.record(key, RowOutcome::Skipped(error.message));
    } else {
        report.record(key, RowOutcome::Failed(error.message));
    }
}
