pub mod document;
pub mod job;
pub mod ledger_entry;
pub mod outcome;

pub use document::{DocumentKind, DocumentPolicy};
pub use job::{extract_job_id, JobPosting};
pub use ledger_entry::LedgerEntry;
pub use outcome::{ApplicationOutcome, JobState, RejectReason, RunSummary};
