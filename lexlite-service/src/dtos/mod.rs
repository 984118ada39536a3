pub mod actions;
pub mod sessions;

pub use actions::{ActionResponse, AskRequest, MAX_QUESTION_CHARS};
pub use sessions::{DocumentView, SessionResponse, UploadResponse};
