use std::path::Path;
use std::time::Duration;

use inventory_entry::EntryService;
use live_list::{LiveView, LiveViewConfig, ViewStatus};
use tender_api::{AuthProvider, BackendClient, UserProfile};

use crate::config::{ReplayArgs, TenderConfig};
use crate::error::CliError;
use crate::script::{self, Step};

pub async fn run(args: ReplayArgs) -> Result<(), CliError> {
    let config = TenderConfig::load(&args.config)?;
    let steps = script::load(&args.script)?;
    let script_dir = args.script.parent().unwrap_or(Path::new(".")).to_path_buf();
    tracing::info!(config = %args.config.display(), steps = steps.len(), "replay starting");

    let backend = super::build_backend(&config).await?;
    let client = BackendClient::from_backend(backend.clone());

    let (email, password) = match (args.email, args.password) {
        (Some(email), Some(password)) => (email, password),
        (Some(email), None) => {
            let user = config.users.iter().find(|u| u.email.eq_ignore_ascii_case(&email));
            let password = user.map(|u| u.password.clone()).ok_or_else(|| CliError::Config {
                context: "users",
                detail: format!("no password for '{email}'"),
            })?;
            (email, password)
        }
        _ => {
            let first = config.users.first().ok_or_else(|| CliError::Config {
                context: "users",
                detail: "no [[users]] configured".into(),
            })?;
            (first.email.clone(), first.password.clone())
        }
    };
    let session = client.auth.sign_in_with_password(&email, &password).await?;
    let profile = UserProfile::from(&session.user);
    println!("Welcome back, {} ({})", profile.first_name(), profile.role);

    let view_config = LiveViewConfig {
        buffer: config.feed_buffer,
        overflow: config.feed_overflow,
        ..LiveViewConfig::new(config.table.clone(), config.history_limit)
    };
    let view = LiveView::open(client.reader.clone(), client.feed.clone(), view_config).await;

    let wait = Duration::from_millis(args.wait_ms);
    let loaded = view.wait_until(|s| s.status != ViewStatus::Loading, wait).await;
    match loaded {
        Some(snapshot) => {
            if let ViewStatus::LoadFailed(reason) = &snapshot.status {
                tracing::warn!(%reason, "recent history failed to load, showing an empty list");
            }
        }
        None => {
            view.close().await;
            return Err(CliError::View(format!("initial load did not finish within {wait:?}")));
        }
    }

    let service = EntryService::new(client.clone(), config.table.clone(), config.bucket.clone());
    let mut failed = 0usize;
    for (i, step) in steps.iter().enumerate() {
        if let Err(e) = run_step(&client, &service, step, &script_dir).await {
            failed += 1;
            tracing::warn!(step = i + 1, op = step.name(), error = %e, "step failed");
            println!("step {} ({}) failed: {e}", i + 1, step.name());
        }
    }

    let target = backend.last_seq();
    let snapshot = view.wait_for_seq(target, wait).await;
    view.close().await;
    let snapshot =
        snapshot.ok_or_else(|| CliError::View(format!("view did not reach feed sequence {target}")))?;

    if snapshot.stale {
        println!("(live updates unavailable, history may be out of date)");
    }
    if snapshot.malformed > 0 {
        tracing::warn!(count = snapshot.malformed, "malformed feed events were dropped");
    }
    println!("Recent history ({} of at most {}):", snapshot.records.len(), config.history_limit);
    super::print_history(&snapshot.records);

    tracing::info!(steps = steps.len(), failed, last_seq = snapshot.last_seq, "replay finished");
    Ok(())
}

async fn run_step(
    client: &BackendClient,
    service: &EntryService,
    step: &Step,
    script_dir: &Path,
) -> Result<(), CliError> {
    match step {
        Step::Add { form, receipt, photos } => {
            let receipt = receipt.as_ref().map(|f| f.load(script_dir)).transpose()?;
            let photos = photos
                .iter()
                .map(|f| f.load(script_dir))
                .collect::<Result<Vec<_>, _>>()?;
            let record = service.submit(form, receipt.as_ref(), &photos).await?;
            println!("added #{}", record.id);
        }
        Step::Edit { id, form } => {
            service.edit(*id, form).await?;
            println!("edited #{id}");
        }
        Step::Delete { id } => {
            service.delete(*id).await?;
            println!("deleted #{id}");
        }
        Step::SignIn { email, password } => {
            let session = client.auth.sign_in_with_password(email, password).await?;
            println!("signed in as {}", UserProfile::from(&session.user).name);
        }
        Step::SignOut => {
            client.auth.sign_out().await?;
            println!("signed out");
        }
    }
    Ok(())
}
