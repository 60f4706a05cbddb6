use rand::Rng;

use crate::EntryError;

/// Upper bound for a single attachment.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const RECEIPT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];
const PHOTO_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What an attachment is used for. Decides the accepted content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentRole {
    Receipt,
    Photo,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn check(&self, role: AttachmentRole) -> Result<(), EntryError> {
        let too_large = self.bytes.len() > MAX_FILE_SIZE;
        match role {
            AttachmentRole::Receipt => {
                if too_large {
                    return Err(EntryError::Attachment("Receipt file too large (max 10MB).".into()));
                }
                if !RECEIPT_TYPES.contains(&self.content_type.as_str()) {
                    return Err(EntryError::Attachment(
                        "Receipt file type not allowed. Use JPEG/PNG/WebP/PDF.".into(),
                    ));
                }
            }
            AttachmentRole::Photo => {
                if too_large {
                    return Err(EntryError::Attachment(format!(
                        "Photo \"{}\" too large (max 10MB).",
                        self.file_name
                    )));
                }
                if !PHOTO_TYPES.contains(&self.content_type.as_str()) {
                    return Err(EntryError::Attachment(format!(
                        "Photo \"{}\" type not allowed.",
                        self.file_name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Six random base-36 characters.
pub fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..6)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// Bucket path for an upload: `{ts}-{suffix}-{safe name}`, where the safe
/// name replaces anything outside `[A-Za-z0-9._-]` with `_`.
pub fn storage_path(file_name: &str, ts_ms: i64, suffix: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    format!("{ts_ms}-{suffix}-{safe}")
}
