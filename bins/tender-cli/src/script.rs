//! Replay scripts: a JSON array of steps run in order.
//!
//! ```json
//! [
//!   { "op": "add", "form": { "material_name": "Cement Bag", "quantity": "20", "unit": "bags" },
//!     "receipt": { "file_name": "bill.pdf", "content_type": "application/pdf", "text": "%PDF" } },
//!   { "op": "edit", "id": 1, "form": { "material_name": "Cement", "quantity": "18", "unit": "bags" } },
//!   { "op": "delete", "id": 1 },
//!   { "op": "sign_out" },
//!   { "op": "sign_in", "email": "ops@example.com", "password": "secret" }
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use inventory_entry::{Attachment, EditForm, InventoryForm};
use tender_api::RecordId;

use crate::error::CliError;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Add {
        form: InventoryForm,
        #[serde(default)]
        receipt: Option<ScriptFile>,
        #[serde(default)]
        photos: Vec<ScriptFile>,
    },
    Edit {
        id: RecordId,
        form: EditForm,
    },
    Delete {
        id: RecordId,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Add { .. } => "add",
            Step::Edit { .. } => "edit",
            Step::Delete { .. } => "delete",
            Step::SignIn { .. } => "sign_in",
            Step::SignOut => "sign_out",
        }
    }
}

/// An attachment in a script: contents come from `path` (relative to the
/// script) or inline `text`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptFile {
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub text: String,
}

impl ScriptFile {
    pub fn load(&self, base: &Path) -> Result<Attachment, CliError> {
        let bytes = match &self.path {
            Some(p) => std::fs::read(base.join(p)).map_err(|e| CliError::Script {
                context: format!("attachment '{}'", self.file_name),
                detail: e.to_string(),
            })?,
            None => self.text.clone().into_bytes(),
        };
        Ok(Attachment::new(&self.file_name, &self.content_type, bytes))
    }
}

pub fn load(path: &Path) -> Result<Vec<Step>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::Script {
        context: path.display().to_string(),
        detail: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| CliError::Script {
        context: path.display().to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tender_api::MovementType;

    #[test]
    fn parses_every_step_kind() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                {"op": "add", "form": {"material_name": "Sand", "quantity": "2", "unit": "t", "movement_type": "OUT"},
                 "photos": [{"file_name": "a.jpg", "content_type": "image/jpeg", "text": "jpg"}]},
                {"op": "edit", "id": 4, "form": {"material_name": "Sand", "quantity": "3"}},
                {"op": "delete", "id": 4},
                {"op": "sign_out"},
                {"op": "sign_in", "email": "a@example.com", "password": "pw"}
            ]"#,
        )
        .unwrap();

        let names: Vec<_> = steps.iter().map(Step::name).collect();
        assert_eq!(names, ["add", "edit", "delete", "sign_out", "sign_in"]);
        match &steps[0] {
            Step::Add { form, receipt, photos } => {
                assert_eq!(form.movement_type, MovementType::Out);
                assert!(form.size_spec.is_empty());
                assert!(receipt.is_none());
                let photo = photos[0].load(Path::new(".")).unwrap();
                assert_eq!(photo.bytes, b"jpg");
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert!(matches!(steps[2], Step::Delete { id: RecordId(4) }));
    }
}
