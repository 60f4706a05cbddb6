//! Entry flows for inventory movements: the "new movement" form, its
//! attachments, and edit/delete from the history list.
//!
//! Validation is pure and runs before any network call. `EntryService`
//! talks to the backend only through `tender_api::BackendClient`.

pub mod attachment;
mod error;
pub mod form;
mod service;

pub use attachment::{Attachment, AttachmentRole, MAX_FILE_SIZE, random_suffix, storage_path};
pub use error::EntryError;
pub use form::{EditForm, InventoryForm, normalize_phone, parse_transaction_date};
pub use service::EntryService;
