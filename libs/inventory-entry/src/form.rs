use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use tender_api::{MovementType, NewMovement, RecordPatch};

use crate::EntryError;

// ════════════════════════════════════════════════════════════════
//  Field helpers
// ════════════════════════════════════════════════════════════════

/// Keep digits only, at most 10.
pub fn normalize_phone(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).take(10).collect()
}

fn phone_ok(phone: &str) -> bool {
    phone.is_empty() || (phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()))
}

/// Trimmed value, or None when blank.
fn text(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

fn number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a transaction date. Blank means `now`; a picker value
/// (`YYYY-MM-DDTHH:MM[:SS]`, no offset) is taken as UTC.
pub fn parse_transaction_date(value: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, EntryError> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(now);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| EntryError::invalid(format!("Transaction date '{v}' is not a valid date and time.")))
}

// ════════════════════════════════════════════════════════════════
//  InventoryForm
// ════════════════════════════════════════════════════════════════

/// Raw state of the "new movement" form. Every field is the text the user
/// typed; `validate` turns it into an insert payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InventoryForm {
    pub movement_type: MovementType,
    pub transaction_date: String,
    pub material_name: String,
    pub size_spec: String,
    pub quantity: String,
    pub unit: String,
    pub issuer_dispatcher: String,
    pub vehicle_number: String,
    pub driver_name: String,
    pub source_location: String,
    pub destination_location: String,
    pub stock_location: String,
    pub contact_person: String,
    pub contact_phone: String,
    pub remarks: String,
    pub purchase_price: String,
}

impl InventoryForm {
    /// Set the phone field the way the input box does: digits only, max 10.
    pub fn set_contact_phone(&mut self, input: &str) {
        self.contact_phone = normalize_phone(input);
    }

    /// Check the form and build the insert payload.
    ///
    /// `created_by`, `receipt_url` and `photo_urls` are left empty; the
    /// service fills them once the session is known and uploads are done.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<NewMovement, EntryError> {
        let material_name =
            text(&self.material_name).ok_or_else(|| EntryError::invalid("Material name is required."))?;

        let quantity = number(&self.quantity)
            .filter(|q| *q > 0.0)
            .ok_or_else(|| EntryError::invalid("Quantity must be a positive number."))?;

        let unit = text(&self.unit).ok_or_else(|| EntryError::invalid("Unit is required."))?;

        let phone = self.contact_phone.trim();
        if !phone_ok(phone) {
            return Err(EntryError::invalid("Contact phone must be 10 digits when provided."));
        }

        let purchase_price = match text(&self.purchase_price) {
            None => None,
            Some(raw) => Some(
                number(&raw)
                    .filter(|p| *p >= 0.0)
                    .ok_or_else(|| EntryError::invalid("Purchase price must be a non-negative number."))?,
            ),
        };

        Ok(NewMovement {
            movement_type: self.movement_type,
            transaction_date: parse_transaction_date(&self.transaction_date, now)?,
            material_name,
            size_spec: text(&self.size_spec),
            quantity,
            unit: Some(unit),
            issuer_dispatcher: text(&self.issuer_dispatcher),
            vehicle_number: text(&self.vehicle_number),
            driver_name: text(&self.driver_name),
            source_location: text(&self.source_location),
            destination_location: text(&self.destination_location),
            stock_location: text(&self.stock_location),
            contact_person: text(&self.contact_person),
            contact_phone: text(phone),
            remarks: text(&self.remarks),
            purchase_price,
            receipt_url: None,
            photo_urls: None,
            created_by: String::new(),
        })
    }
}

// ════════════════════════════════════════════════════════════════
//  EditForm
// ════════════════════════════════════════════════════════════════

/// The five columns editable from the history list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditForm {
    pub material_name: String,
    pub quantity: String,
    pub unit: String,
    pub movement_type: MovementType,
    pub remarks: String,
}

impl EditForm {
    /// Blank fields clear their column. A quantity, when given, must parse.
    pub fn to_patch(&self) -> Result<RecordPatch, EntryError> {
        let quantity = match text(&self.quantity) {
            None => None,
            Some(raw) => Some(number(&raw).ok_or_else(|| EntryError::invalid("Quantity must be a number."))?),
        };
        Ok(RecordPatch {
            material_name: text(&self.material_name),
            quantity,
            unit: text(&self.unit),
            movement_type: Some(self.movement_type),
            remarks: text(&self.remarks),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn filled() -> InventoryForm {
        InventoryForm {
            material_name: "  Cement Bag ".into(),
            quantity: "20".into(),
            unit: "bags".into(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn rejection(form: &InventoryForm) -> String {
        form.validate(now()).unwrap_err().to_string()
    }

    #[test]
    fn phone_input_keeps_ten_digits() {
        assert_eq!(normalize_phone("(987) 654-3210 ext 9"), "9876543210");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn minimal_form_builds_payload() {
        let m = filled().validate(now()).unwrap();
        assert_eq!(m.material_name, "Cement Bag");
        assert_eq!(m.quantity, 20.0);
        assert_eq!(m.unit.as_deref(), Some("bags"));
        assert_eq!(m.movement_type, MovementType::In);
        assert_eq!(m.transaction_date, now());
        assert!(m.driver_name.is_none());
        assert!(m.purchase_price.is_none());
        assert!(m.contact_phone.is_none());
    }

    #[test]
    fn required_fields_are_checked_in_order() {
        let mut f = filled();
        f.material_name = "   ".into();
        assert_eq!(rejection(&f), "Material name is required.");

        for bad in ["", "0", "-3", "abc", "NaN"] {
            let mut f = filled();
            f.quantity = bad.into();
            assert_eq!(rejection(&f), "Quantity must be a positive number.", "quantity {bad:?}");
        }

        let mut f = filled();
        f.unit = String::new();
        assert_eq!(rejection(&f), "Unit is required.");
    }

    #[test]
    fn phone_must_be_empty_or_ten_digits() {
        let mut f = filled();
        f.contact_phone = "98765".into();
        assert_eq!(rejection(&f), "Contact phone must be 10 digits when provided.");

        f.set_contact_phone("98765-43210");
        assert_eq!(f.validate(now()).unwrap().contact_phone.as_deref(), Some("9876543210"));
    }

    #[test]
    fn purchase_price_optional_but_non_negative() {
        let mut f = filled();
        f.purchase_price = "-1".into();
        assert!(matches!(f.validate(now()), Err(EntryError::Invalid(_))));

        f.purchase_price = "0".into();
        assert_eq!(f.validate(now()).unwrap().purchase_price, Some(0.0));
    }

    #[test]
    fn transaction_date_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 14, 16, 45, 0).unwrap();
        assert_eq!(parse_transaction_date("2026-02-14T16:45", now()).unwrap(), expected);
        assert_eq!(parse_transaction_date("2026-02-14T16:45:00", now()).unwrap(), expected);
        assert_eq!(parse_transaction_date("2026-02-14T22:15:00+05:30", now()).unwrap(), expected);
        assert_eq!(parse_transaction_date(" ", now()).unwrap(), now());
        assert!(parse_transaction_date("14/02/2026", now()).is_err());
    }

    #[test]
    fn edit_form_clears_blank_columns() {
        let edit = EditForm {
            material_name: "Steel Rod".into(),
            quantity: "".into(),
            unit: "pcs".into(),
            movement_type: MovementType::Out,
            remarks: " ".into(),
        };
        let patch = edit.to_patch().unwrap();
        assert_eq!(patch.material_name.as_deref(), Some("Steel Rod"));
        assert!(patch.quantity.is_none());
        assert!(patch.remarks.is_none());
        assert_eq!(patch.movement_type, Some(MovementType::Out));

        let bad = EditForm { quantity: "lots".into(), ..edit };
        assert!(bad.to_patch().is_err());
    }
}
