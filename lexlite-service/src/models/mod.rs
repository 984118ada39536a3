//! Domain models for the LexLite service.

pub mod action;
pub mod session;
pub mod usage;

pub use action::{ActionError, ActionKind, ActionOutcome, ActionRequest, ActionResult};
pub use session::{
    DocumentInfo, ReuploadPolicy, Session, SessionDocument, SessionId, SessionSnapshot,
};
pub use usage::UsageSnapshot;
