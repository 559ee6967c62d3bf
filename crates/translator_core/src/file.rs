use std::fmt;
use std::sync::Arc;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "docx", "md", "markdown", "txt"];
pub const MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("file has no name")]
    EmptyName,
    #[error("unsupported file type for {name}; allowed: pdf, docx, md, markdown, txt")]
    UnsupportedExtension { name: String },
    #[error("file is {size_bytes} bytes, above the {max_bytes} byte limit")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
}

/// A locally chosen document. Replaced wholesale, never edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    size_bytes: u64,
    content: Arc<[u8]>,
}

impl SelectedFile {
    /// Wraps picked bytes as a selection candidate; the size is the content length.
    pub fn new(name: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Candidate whose size was reported by the picker rather than measured,
    /// so an oversize file can be rejected without reading it.
    pub fn from_parts(name: impl Into<String>, size_bytes: u64, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_candidate(&self.name, self.size_bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content(&self) -> &Arc<[u8]> {
        &self.content
    }

    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

// Content is elided so logs never carry document bytes.
impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

/// Lowercased text after the last `.`; `None` when the name has no dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Checks a candidate against the extension allow-list and the size ceiling.
/// Size is checked first so an oversize file is rejected whatever its type.
pub fn validate_candidate(name: &str, size_bytes: u64) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if size_bytes > MAX_FILE_BYTES {
        return Err(ValidationError::TooLarge {
            size_bytes,
            max_bytes: MAX_FILE_BYTES,
        });
    }
    let allowed = extension_of(name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    if !allowed {
        return Err(ValidationError::UnsupportedExtension {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}
