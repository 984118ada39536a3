pub mod extractor;
pub mod metrics;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod retry;
pub mod session_store;

#[cfg(test)]
pub(crate) mod test_pdf;

pub use extractor::{ExtractedText, ExtractionError, TextExtractor};
pub use orchestrator::{Orchestrator, UploadOutcome};
pub use prompt::build_prompt;
pub use session_store::{SessionGuard, SessionHandle, SessionStore};
