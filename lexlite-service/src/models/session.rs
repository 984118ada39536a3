//! Per-user session state: the loaded document and the usage counter.
//!
//! A [`Session`] holds at most one document and a monotonically increasing
//! count of successful AI actions. The quota gate ([`Session::can_act`],
//! [`Session::remaining`], [`Session::record_use`]) is a pure function of
//! that counter and the quota the session was created with.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type SessionId = Uuid;

/// A user interaction context (one browser tab, one API client).
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,

    /// Extracted, already truncated document text.
    document: Option<SessionDocument>,

    /// Successful AI actions so far. Never decreases.
    usage_count: u32,

    /// Free actions allowed for this session.
    quota: u32,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Last time a request touched the session.
    pub last_active_at: DateTime<Utc>,
}

/// The document attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDocument {
    /// Text fed to the prompt builder, bounded by the truncation budget.
    pub text: String,

    /// Name of the uploaded file, if the client sent one.
    pub file_name: Option<String>,

    /// Pages in the source PDF.
    pub page_count: usize,

    /// Whether the extracted text was cut to fit the budget.
    pub truncated: bool,
}

impl SessionDocument {
    /// A document built from bare text, with no file metadata.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file_name: None,
            page_count: 0,
            truncated: false,
        }
    }

    /// Length of the document text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            file_name: self.file_name.clone(),
            page_count: self.page_count,
            char_count: self.char_count(),
            truncated: self.truncated,
        }
    }
}

/// Document metadata without the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub file_name: Option<String>,
    pub page_count: usize,
    pub char_count: usize,
    pub truncated: bool,
}

/// Read-only copy of a session's visible state.
///
/// Published by the session store whenever a request releases the session,
/// so readers never wait on an upload or action in flight.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub document: Option<DocumentInfo>,
    pub usage_count: u32,
    pub quota: u32,
    pub created_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.usage_count)
    }
}

/// What to do when a document is uploaded to a session that already has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReuploadPolicy {
    /// Keep the first document; the upload is not even extracted.
    #[default]
    Ignore,
    /// Extract the new upload and replace the current document. Usage is kept.
    Replace,
}

impl FromStr for ReuploadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(ReuploadPolicy::Ignore),
            "replace" => Ok(ReuploadPolicy::Replace),
            other => Err(format!("unknown re-upload policy '{}'", other)),
        }
    }
}

impl fmt::Display for ReuploadPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReuploadPolicy::Ignore => write!(f, "ignore"),
            ReuploadPolicy::Replace => write!(f, "replace"),
        }
    }
}

impl Session {
    /// Create an empty session with the given free-action quota.
    pub fn new(quota: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            document: None,
            usage_count: 0,
            quota,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&SessionDocument> {
        self.document.as_ref()
    }

    /// Attach a document if none is loaded yet.
    ///
    /// Returns `false` (and changes nothing) when a document is already present.
    pub fn set_document(&mut self, document: SessionDocument) -> bool {
        if self.document.is_some() {
            return false;
        }
        self.document = Some(document);
        true
    }

    /// Swap in a new document unconditionally, returning the previous one.
    /// The usage counter is left alone.
    pub fn replace_document(&mut self, document: SessionDocument) -> Option<SessionDocument> {
        self.document.replace(document)
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Free actions left: `max(0, quota - usage_count)`.
    pub fn remaining(&self) -> u32 {
        self.quota.saturating_sub(self.usage_count)
    }

    pub fn can_act(&self) -> bool {
        self.remaining() > 0
    }

    /// Charge one successful action.
    ///
    /// Only the success path of an action calls this, after the gate passed.
    pub fn record_use(&mut self) {
        debug_assert!(self.can_act(), "record_use called with no quota left");
        self.usage_count = self.usage_count.saturating_add(1);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            document: self.document.as_ref().map(SessionDocument::info),
            usage_count: self.usage_count,
            quota: self.quota,
            created_at: self.created_at,
        }
    }

    /// Mark the session as active now.
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }

    /// Whether the session has been idle for longer than `max_idle`.
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: std::time::Duration) -> bool {
        let max_idle = chrono::Duration::from_std(max_idle)
            .unwrap_or_else(|_| chrono::Duration::days(36_500));
        now.signed_duration_since(self.last_active_at) > max_idle
    }
}
