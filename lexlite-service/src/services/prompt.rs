//! Prompt construction for the two action kinds.
//!
//! Prompts are a pure function of the request and the document text. The text
//! is embedded verbatim; truncation already happened at extraction time.

use crate::models::{ActionError, ActionRequest};

/// Clause categories every summary must walk through.
pub const SUMMARY_CHECKLIST: [&str; 10] = [
    "parties",
    "scope",
    "term",
    "termination",
    "confidentiality",
    "liability",
    "intellectual property",
    "payment",
    "governing law",
    "unusual risks",
];

/// Build the instruction sent to the model.
///
/// `Answer` requests with an empty or whitespace-only question are rejected
/// with [`ActionError::InvalidRequest`].
pub fn build_prompt(request: &ActionRequest, document_text: &str) -> Result<String, ActionError> {
    match request {
        ActionRequest::Summarize => Ok(summary_prompt(document_text)),
        ActionRequest::Answer { question } => {
            let question = question.trim();
            if question.is_empty() {
                return Err(ActionError::InvalidRequest(
                    "question must not be empty".to_string(),
                ));
            }
            Ok(answer_prompt(document_text, question))
        }
    }
}

fn summary_prompt(document_text: &str) -> String {
    format!(
        "Summarize this legal document in clear plain English.\n\
         Highlight key sections: {}, and {}.\n\
         \n\
         Document:\n\
         {}\n",
        SUMMARY_CHECKLIST[..SUMMARY_CHECKLIST.len() - 1].join(", "),
        SUMMARY_CHECKLIST[SUMMARY_CHECKLIST.len() - 1],
        document_text
    )
}

fn answer_prompt(document_text: &str, question: &str) -> String {
    format!(
        "You are a legal assistant. Answer the user's question based strictly on the document below.\n\
         If the answer is not contained in the text, say so explicitly.\n\
         \n\
         Document:\n\
         {}\n\
         \n\
         Question: {}\n",
        document_text, question
    )
}
