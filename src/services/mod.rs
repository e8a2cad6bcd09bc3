pub mod application_ledger;
pub mod authenticator;
pub mod cover_letter;
pub mod document_attacher;
pub mod eligibility;
pub mod job_discovery;
pub mod outcome_writer;

pub use application_ledger::ApplicationLedger;
pub use authenticator::Authenticator;
pub use cover_letter::{CoverLetterGenerator, LlmCoverLetterGenerator};
pub use document_attacher::{AttachResult, DocumentAttacher, FieldAction};
pub use eligibility::{Eligibility, EligibilityValidator, PhraseDetector, RequirementDetector};
pub use job_discovery::JobDiscovery;
pub use outcome_writer::OutcomeWriter;
