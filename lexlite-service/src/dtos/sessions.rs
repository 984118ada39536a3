use crate::models::{DocumentInfo, SessionDocument, SessionId, SessionSnapshot, UsageSnapshot};
use crate::services::UploadOutcome;
use serde::{Deserialize, Serialize};

/// Document metadata. The extracted text itself is never sent back.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentView {
    pub file_name: Option<String>,
    pub page_count: usize,
    pub char_count: usize,
    pub truncated: bool,
}

impl From<DocumentInfo> for DocumentView {
    fn from(info: DocumentInfo) -> Self {
        Self {
            file_name: info.file_name,
            page_count: info.page_count,
            char_count: info.char_count,
            truncated: info.truncated,
        }
    }
}

impl From<&SessionDocument> for DocumentView {
    fn from(doc: &SessionDocument) -> Self {
        doc.info().into()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub has_document: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentView>,
    pub usage: UsageSnapshot,
    pub created_at: String,
}

impl SessionResponse {
    pub fn new(snapshot: SessionSnapshot, upgrade_url: &str) -> Self {
        Self {
            session_id: snapshot.id,
            has_document: snapshot.has_document(),
            usage: UsageSnapshot::from_snapshot(&snapshot, upgrade_url),
            created_at: snapshot.created_at.to_rfc3339(),
            document: snapshot.document.map(DocumentView::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: UploadOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentView>,
    pub usage: UsageSnapshot,
}
