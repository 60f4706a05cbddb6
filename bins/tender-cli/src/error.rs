use inventory_entry::EntryError;
use tender_api::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("script ({context}): {detail}")]
    Script { context: String, detail: String },

    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    #[error("{0}")]
    Entry(#[from] EntryError),

    /// The live view could not load or did not catch up with the feed.
    #[error("live view: {0}")]
    View(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
