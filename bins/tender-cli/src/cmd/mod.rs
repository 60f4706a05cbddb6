pub mod history;
pub mod replay;

use std::sync::Arc;

use backend_memory::MemoryBackend;
use live_list::HistoryRow;
use tender_api::InventoryRecord;

use crate::config::TenderConfig;
use crate::error::CliError;

/// Memory backend with the configured users and seed rows in place.
pub async fn build_backend(config: &TenderConfig) -> Result<Arc<MemoryBackend>, CliError> {
    let backend = Arc::new(MemoryBackend::new(config.backend_config()));
    for user in &config.users {
        let registered = backend.register_user(user.clone()).await?;
        tracing::debug!(id = %registered.id, email = %user.email, "registered user");
    }
    let seed = config.load_seed()?;
    if !seed.is_empty() {
        let count = seed.len();
        backend.seed(&config.table, seed).await?;
        tracing::info!(table = %config.table, count, "seeded rows");
    }
    Ok(backend)
}

pub fn print_history<'a>(records: impl IntoIterator<Item = &'a InventoryRecord>) {
    println!("{:<6} {:<44} {:<16} {}", "ID", "ACTION", "ISSUER", "WHEN");
    let mut empty = true;
    for record in records {
        empty = false;
        let row = HistoryRow::from(record);
        println!("{:<6} {:<44} {:<16} {}", row.id, row.action, row.issuer, row.when);
    }
    if empty {
        println!("(no history)");
    }
}
