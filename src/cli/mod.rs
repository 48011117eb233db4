pub mod calc;
pub mod quote;
pub mod setup;
pub mod ui;
pub mod watch;

use crate::core::config::AppConfig;
use crate::core::currency::USD;
use crate::core::{FxTable, TickerView};
use anyhow::{Result, anyhow};
use tracing::warn;

/// Runs a single bootstrap round and returns what it produced.
pub(crate) async fn fetch_view(config: &AppConfig) -> Result<TickerView> {
    let mut scheduler = crate::build_scheduler(config)?;

    let spinner = ui::new_spinner("Fetching gold price...");
    let view = scheduler.bootstrap().await;
    spinner.finish_and_clear();

    view.ok_or_else(|| {
        anyhow!(
            "Could not fetch gold price: {}",
            scheduler
                .backoff()
                .last_error
                .as_deref()
                .unwrap_or("unknown error")
        )
    })
}

/// Currency to display amounts in. Falls back to USD when `fx` cannot reach
/// the requested one, so labels always match the numbers.
pub fn resolve_currency(requested: &str, fx: &FxTable) -> String {
    let requested = requested.trim().to_uppercase();
    if fx.can_convert(&requested) {
        requested
    } else {
        warn!(currency = %requested, "No exchange rate available, showing USD");
        USD.to_string()
    }
}
