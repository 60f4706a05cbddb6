use tender_api::{RecordQuery, RecordReader};

use live_list::ListFilter;

use crate::config::{HistoryArgs, TenderConfig};
use crate::error::CliError;

pub async fn run(args: HistoryArgs) -> Result<(), CliError> {
    let config = TenderConfig::load(&args.config)?;
    let backend = super::build_backend(&config).await?;

    let query = RecordQuery {
        resource: config.table.clone(),
        limit: None,
    };
    let records = backend.fetch_recent(&query).await?;

    let filter = ListFilter {
        search: args.search,
        movement: args.movement,
    };
    let hits = filter.apply(&records);
    tracing::info!(table = %config.table, total = records.len(), shown = hits.len(), "history loaded");

    super::print_history(hits);
    Ok(())
}
