//! Staging of a single local file before it is sent as an attachment.

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};

use chatsim_proto::message::{Attachment, MessageType};

/// Errors that can occur while staging a file.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The path has no usable file name.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name without directories.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Reported MIME type.
    pub mime_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Wraps in-memory contents.
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] if the path has no file name or cannot be
    /// read.
    pub async fn read(path: &Path, mime_type: impl Into<String>) -> Result<Self, StagingError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StagingError::NoFileName(path.to_path_buf()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StagingError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self::new(name, mime_type, bytes))
    }
}

/// Attachment ready to be sent with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAttachment {
    /// Message type derived from the MIME type, `None` for other files.
    pub kind: Option<MessageType>,
    /// Caption typed alongside the file.
    pub caption: String,
    /// Attachment payload.
    pub data: Attachment,
}

impl PreparedAttachment {
    /// Message type to send with, defaulting to text for unclassified files.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.kind.unwrap_or_default()
    }
}

/// Classifies a MIME type into an attachment message type.
#[must_use]
pub fn classify(mime_type: &str) -> Option<MessageType> {
    if mime_type.starts_with("image/") {
        Some(MessageType::Image)
    } else if mime_type.starts_with("video/") {
        Some(MessageType::Video)
    } else if mime_type == "application/pdf" {
        Some(MessageType::Pdf)
    } else {
        None
    }
}

/// Builds a `data:` URL for the given contents.
#[must_use]
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime_type};base64,{}",
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Holds zero or one selected file and its preview.
#[derive(Debug, Clone, Default)]
pub struct FileStaging {
    selected: Option<LocalFile>,
    preview_url: Option<String>,
}

impl FileStaging {
    /// Creates an empty staging area.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The staged file, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&LocalFile> {
        self.selected.as_ref()
    }

    /// Preview of the staged file.
    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    /// Whether a preview is ready to show.
    #[must_use]
    pub const fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    /// Stages `file`, replacing any previous selection.
    pub fn stage(&mut self, file: LocalFile) {
        tracing::debug!(file = %file.name, mime = %file.mime_type, size = file.size, "file staged");
        self.preview_url = Some(data_url(&file.mime_type, &file.bytes));
        self.selected = Some(file);
    }

    /// Reads `path` and stages it.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError`] if the file cannot be read. The current
    /// selection is left untouched in that case.
    pub async fn stage_path(
        &mut self,
        path: &Path,
        mime_type: impl Into<String>,
    ) -> Result<(), StagingError> {
        let file = LocalFile::read(path, mime_type).await?;
        self.stage(file);
        Ok(())
    }

    /// Drops the selection and its preview.
    pub fn cancel(&mut self) {
        self.selected = None;
        self.preview_url = None;
    }

    /// Builds the attachment for the staged file without clearing it.
    #[must_use]
    pub fn prepare(&self, caption: &str) -> Option<PreparedAttachment> {
        let file = self.selected.as_ref()?;
        Some(PreparedAttachment {
            kind: classify(&file.mime_type),
            caption: caption.to_string(),
            data: Attachment {
                url: self.preview_url.clone().unwrap_or_default(),
                file_name: file.name.clone(),
                file_size: file.size,
                mime_type: file.mime_type.clone(),
            },
        })
    }

    /// Builds the attachment and clears the selection.
    pub fn take(&mut self, caption: &str) -> Option<PreparedAttachment> {
        let prepared = self.prepare(caption);
        self.cancel();
        prepared
    }

    /// Room-list text for a message carrying the staged file.
    #[must_use]
    pub fn display_text(&self, caption: &str) -> String {
        if !caption.is_empty() {
            return caption.to_string();
        }
        self.selected
            .as_ref()
            .map_or_else(|| "File".to_string(), |f| format!("📎 {}", f.name))
    }
}
