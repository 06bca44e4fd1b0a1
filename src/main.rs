use chrono::Utc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use spot_console::api::{ApiClient, ClientRecord, SystemHealth};
use spot_console::config::Config;
use spot_console::helpers::format_relative_time;
use spot_console::refresh::RefreshableView;
use spot_console::shell::Shell;
use spot_console::ConsoleError;

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    let config = {
        let _startup = tracing::subscriber::set_default(tracing_subscriber::fmt().finish());
        Config::load().await
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let shell = Shell::new(ApiClient::new(&config)?);
    info!(api = %config.api_base_url, "Starting spot console");

    shell.health().refresh().await;
    log_health(&shell.health().snapshot());

    shell.attach();
    let mut clients = shell.clients().subscribe();
    let mut stats = shell.stats().subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(err) = result {
                    warn!(error = %err, "Failed to listen for Ctrl-C");
                }
                break;
            }
            Ok(()) = clients.changed() => {
                let view = clients.borrow().clone();
                log_clients(&view);
            }
            Ok(()) = stats.changed() => {
                if let Some(overview) = shell.overview() {
                    info!(
                        manual = overview.manual_today,
                        model = overview.model_today,
                        scheduled = overview.scheduled_24h,
                        monthly_projection = overview.monthly_projection,
                        "Switch overview"
                    );
                }
            }
        }
    }

    info!("Shutting down");
    shell.detach();
    Ok(())
}

fn log_clients(view: &RefreshableView<Vec<ClientRecord>>) {
    let Some(clients) = view.data() else {
        if let Some(err) = view.error() {
            warn!(error = %err, "Client list unavailable");
        }
        return;
    };
    info!(count = clients.len(), refreshing = view.is_refreshing(), "Client list");
    for client in clients {
        debug!(
            id = %client.id,
            name = %client.name,
            agents = %format!("{}/{}", client.agents_online, client.agents_total),
            savings = client.total_savings,
            "Client"
        );
    }
}

fn log_health(view: &RefreshableView<SystemHealth>) {
    let Some(health) = view.data() else {
        warn!(error = view.error().unwrap_or("no data"), "System health unavailable");
        return;
    };
    let now = Utc::now();
    info!(
        database = %health.database.status,
        backend = %health.backend.status,
        engine_active = health.decision_engine.is_active,
        engine_loaded = %health
            .decision_engine
            .loaded_at
            .as_deref()
            .map(|at| format_relative_time(at, now))
            .unwrap_or_default(),
        "System health"
    );
    for event in &health.recent_errors {
        warn!(
            event = %event.event_type,
            severity = event.severity.as_deref().unwrap_or("unknown"),
            when = %event
                .created_at
                .as_deref()
                .map(|at| format_relative_time(at, now))
                .unwrap_or_default(),
            message = event.message.as_deref().unwrap_or(""),
            "Recent backend error"
        );
    }
}
