//! Presentation helpers for the dashboard history table and the full
//! history list.

use chrono::{DateTime, Utc};

use tender_api::{InventoryRecord, MovementType};

/// Movement filter of the history list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MovementFilter {
    #[default]
    All,
    In,
    Out,
}

impl MovementFilter {
    pub fn matches(self, movement: Option<MovementType>) -> bool {
        match self {
            MovementFilter::All => true,
            MovementFilter::In => movement == Some(MovementType::In),
            MovementFilter::Out => movement == Some(MovementType::Out),
        }
    }
}

impl std::str::FromStr for MovementFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MovementFilter::All),
            "in" => Ok(MovementFilter::In),
            "out" => Ok(MovementFilter::Out),
            other => Err(format!("unknown movement filter '{other}' (all|in|out)")),
        }
    }
}

/// Search box + movement tabs.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: String,
    pub movement: MovementFilter,
}

impl ListFilter {
    /// Case-insensitive substring match on material and issuer, plain
    /// substring match on the decimal id. An empty search matches all.
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        let needle = self.search.to_lowercase();
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
        };
        let search_hit = contains(&record.material_name)
            || contains(&record.issuer_dispatcher)
            || record.id.to_string().contains(&self.search);

        search_hit && self.movement.matches(record.movement_type)
    }

    pub fn apply<'a>(&self, records: &'a [InventoryRecord]) -> Vec<&'a InventoryRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// `"Added 100 kg of Cement Bag"` / `"Released 5 pcs of Steel Rod"`.
pub fn action_text(record: &InventoryRecord) -> String {
    let verb = match record.movement_type {
        Some(MovementType::Out) => "Released",
        _ => "Added",
    };
    let quantity = record.quantity.map(|q| q.to_string()).unwrap_or_default();
    format!(
        "{verb} {quantity} {} of {}",
        record.unit.as_deref().unwrap_or(""),
        record.material_name.as_deref().unwrap_or("")
    )
}

/// `"05 Mar 2026, 02:30 pm"` (UTC), `"-"` when absent.
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%d %b %Y, %I:%M %P").to_string(),
        None => "-".to_string(),
    }
}

/// One line of the recent-history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: String,
    pub action: String,
    pub issuer: String,
    pub when: String,
}

impl From<&InventoryRecord> for HistoryRow {
    fn from(record: &InventoryRecord) -> Self {
        Self {
            id: record.id.to_string(),
            action: action_text(record),
            issuer: record
                .issuer_dispatcher
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            when: format_timestamp(Some(record.created_at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tender_api::RecordId;

    fn record(id: i64, material: &str, issuer: Option<&str>, movement: MovementType) -> InventoryRecord {
        let mut r = InventoryRecord::new(RecordId(id), Utc.with_ymd_and_hms(2026, 3, 5, 14, 30, 0).unwrap());
        r.material_name = Some(material.to_string());
        r.issuer_dispatcher = issuer.map(str::to_string);
        r.movement_type = Some(movement);
        r.quantity = Some(100.0);
        r.unit = Some("kg".into());
        r
    }

    #[test]
    fn search_matches_material_issuer_or_id() {
        let rows = vec![
            record(101, "Cement Bag", Some("Suresh"), MovementType::In),
            record(102, "Steel Rod", Some("Meena"), MovementType::Out),
            record(7, "Sand", None, MovementType::In),
        ];

        let by_material = ListFilter { search: "cement".into(), ..Default::default() };
        assert_eq!(by_material.apply(&rows).len(), 1);

        let by_issuer = ListFilter { search: "MEENA".into(), ..Default::default() };
        assert_eq!(by_issuer.apply(&rows)[0].id, RecordId(102));

        let by_id = ListFilter { search: "10".into(), ..Default::default() };
        assert_eq!(by_id.apply(&rows).len(), 2);

        let everything = ListFilter::default();
        assert_eq!(everything.apply(&rows).len(), 3);
    }

    #[test]
    fn movement_tabs_filter_by_type() {
        let rows = vec![
            record(1, "Cement Bag", None, MovementType::In),
            record(2, "Cement Bag", None, MovementType::Out),
        ];
        let outs = ListFilter { search: "cement".into(), movement: MovementFilter::Out };
        let hits = outs.apply(&rows);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, RecordId(2));

        let mut untyped = record(3, "Cement Bag", None, MovementType::In);
        untyped.movement_type = None;
        assert!(!MovementFilter::In.matches(untyped.movement_type));
        assert!(MovementFilter::All.matches(untyped.movement_type));
    }

    #[test]
    fn action_text_and_row_rendering() {
        let row = HistoryRow::from(&record(5, "Cement Bag", None, MovementType::Out));
        assert_eq!(row.action, "Released 100 kg of Cement Bag");
        assert_eq!(row.issuer, "-");
        assert_eq!(row.when, "05 Mar 2026, 02:30 pm");

        let mut partial = record(6, "Sand", Some("Ravi"), MovementType::In);
        partial.quantity = Some(2.5);
        assert_eq!(action_text(&partial), "Added 2.5 kg of Sand");
        assert_eq!(format_timestamp(None), "-");
    }
}
