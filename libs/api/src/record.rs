use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════
//  Record identity
// ════════════════════════════════════════════════════════════════

/// Row identifier assigned by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementType {
    /// Stock added.
    #[default]
    #[serde(rename = "IN")]
    In,
    /// Stock released.
    #[serde(rename = "OUT")]
    Out,
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementType::In => f.write_str("IN"),
            MovementType::Out => f.write_str("OUT"),
        }
    }
}

impl std::str::FromStr for MovementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            other => Err(format!("unknown movement type '{other}'")),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  InventoryRecord
// ════════════════════════════════════════════════════════════════

/// One inventory movement row.
///
/// Only `id` and `created_at` are guaranteed. Rows written by older
/// versions of the entry form lack most of the other columns, so every
/// mutable field is an explicit `Option`; a missing key and a JSON `null`
/// both decode to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub movement_type: Option<MovementType>,
    pub transaction_date: Option<DateTime<Utc>>,
    pub material_name: Option<String>,
    pub size_spec: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub issuer_dispatcher: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub source_location: Option<String>,
    pub destination_location: Option<String>,
    pub stock_location: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub remarks: Option<String>,
    pub purchase_price: Option<f64>,
    pub receipt_url: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub created_by: Option<String>,
}

impl InventoryRecord {
    /// Bare row with only the store-assigned columns set.
    pub fn new(id: RecordId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            movement_type: None,
            transaction_date: None,
            material_name: None,
            size_spec: None,
            quantity: None,
            unit: None,
            issuer_dispatcher: None,
            vehicle_number: None,
            driver_name: None,
            source_location: None,
            destination_location: None,
            stock_location: None,
            contact_person: None,
            contact_phone: None,
            remarks: None,
            purchase_price: None,
            receipt_url: None,
            photo_urls: None,
            created_by: None,
        }
    }

    /// Movement direction, treating a missing column as `IN`.
    pub fn movement(&self) -> MovementType {
        self.movement_type.unwrap_or_default()
    }
}

// ════════════════════════════════════════════════════════════════
//  Write payloads
// ════════════════════════════════════════════════════════════════

/// Insert payload: every column except the store-assigned ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMovement {
    pub movement_type: MovementType,
    pub transaction_date: DateTime<Utc>,
    pub material_name: String,
    pub size_spec: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub issuer_dispatcher: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub source_location: Option<String>,
    pub destination_location: Option<String>,
    pub stock_location: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub remarks: Option<String>,
    pub purchase_price: Option<f64>,
    pub receipt_url: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    /// Owner column; must match the session user under row-level security.
    pub created_by: String,
}

impl NewMovement {
    /// Materialize the row once the store has assigned identity columns.
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> InventoryRecord {
        InventoryRecord {
            id,
            created_at,
            movement_type: Some(self.movement_type),
            transaction_date: Some(self.transaction_date),
            material_name: Some(self.material_name),
            size_spec: self.size_spec,
            quantity: Some(self.quantity),
            unit: self.unit,
            issuer_dispatcher: self.issuer_dispatcher,
            vehicle_number: self.vehicle_number,
            driver_name: self.driver_name,
            source_location: self.source_location,
            destination_location: self.destination_location,
            stock_location: self.stock_location,
            contact_person: self.contact_person,
            contact_phone: self.contact_phone,
            remarks: self.remarks,
            purchase_price: self.purchase_price,
            receipt_url: self.receipt_url,
            photo_urls: self.photo_urls,
            created_by: Some(self.created_by),
        }
    }
}

/// Columns the history edit dialog writes back. All five are overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub material_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub movement_type: Option<MovementType>,
    pub remarks: Option<String>,
}

impl RecordPatch {
    pub fn apply_to(&self, record: &mut InventoryRecord) {
        record.material_name = self.material_name.clone();
        record.quantity = self.quantity;
        record.unit = self.unit.clone();
        record.movement_type = self.movement_type;
        record.remarks = self.remarks.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_row_decodes_with_none_fields() {
        let row: InventoryRecord = serde_json::from_value(json!({
            "id": 7,
            "created_at": "2026-03-01T10:00:00Z",
            "material_name": "Cement Bag",
            "photo_urls": null,
        }))
        .unwrap();

        assert_eq!(row.id, RecordId(7));
        assert_eq!(row.material_name.as_deref(), Some("Cement Bag"));
        assert!(row.photo_urls.is_none());
        assert!(row.quantity.is_none());
        assert_eq!(row.movement(), MovementType::In);
    }

    #[test]
    fn movement_type_uses_wire_names() {
        assert_eq!(serde_json::to_value(MovementType::Out).unwrap(), json!("OUT"));
        assert_eq!("out".parse::<MovementType>().unwrap(), MovementType::Out);
        assert!("sideways".parse::<MovementType>().is_err());
    }

    #[test]
    fn patch_overwrites_edited_columns_only() {
        let mut row = InventoryRecord::new(RecordId(1), Utc::now());
        row.driver_name = Some("Ravi".into());
        row.remarks = Some("old".into());

        let patch = RecordPatch {
            material_name: Some("Steel Rod".into()),
            quantity: Some(12.5),
            unit: Some("pcs".into()),
            movement_type: Some(MovementType::Out),
            remarks: None,
        };
        patch.apply_to(&mut row);

        assert_eq!(row.material_name.as_deref(), Some("Steel Rod"));
        assert_eq!(row.quantity, Some(12.5));
        assert_eq!(row.movement_type, Some(MovementType::Out));
        assert!(row.remarks.is_none());
        assert_eq!(row.driver_name.as_deref(), Some("Ravi"));
    }
}
