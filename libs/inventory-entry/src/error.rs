use tender_api::BackendError;

/// Errors from the entry flows. Messages are shown to the user as-is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EntryError {
    /// A form field failed validation.
    #[error("{0}")]
    Invalid(String),

    #[error("You must be signed in to add inventory. Please log in and try again.")]
    Unauthenticated,

    /// An attachment was rejected before upload (size or type).
    #[error("{0}")]
    Attachment(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    /// The movements table does not exist on the backend.
    #[error("Database table \"{table}\" not found. Run the SQL migration first.")]
    TableMissing { table: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EntryError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}
