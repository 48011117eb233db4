use super::{resolve_currency, ui};
use crate::core::config::AppConfig;
use crate::core::currency::convert;
use crate::core::{Karat, PresentationAdapter, TickerView};
use anyhow::Result;
use tracing::{info, warn};

/// Karats shown on the one-line ticker.
const TICKER_KARATS: [Karat; 4] = [Karat::K24, Karat::K22, Karat::K18, Karat::K14];

/// Prints one line per publication.
pub struct ConsoleTicker {
    currency: String,
}

impl ConsoleTicker {
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_uppercase(),
        }
    }
}

impl PresentationAdapter for ConsoleTicker {
    fn publish(&mut self, view: &TickerView) {
        let currency = resolve_currency(&self.currency, &view.fx);
        println!(
            "{} {}",
            ui::style_text(
                &chrono::Local::now().format("%H:%M:%S").to_string(),
                ui::StyleType::Subtle
            ),
            ticker_line(view, &currency)
        );
    }
}

pub fn ticker_line(view: &TickerView, currency: &str) -> String {
    let snapshot = &view.snapshot;
    let money = |usd: f64| ui::format_money(convert(usd, currency, &view.fx), currency);

    let mut parts: Vec<String> = TICKER_KARATS
        .iter()
        .filter_map(|&karat| {
            snapshot
                .per_gram(karat)
                .map(|price| format!("{karat} {}/g", money(price)))
        })
        .collect();
    if let Some(spot) = snapshot.spot_price_usd_per_ounce {
        parts.push(format!("Spot {}/oz", money(spot)));
    }

    let mut line = format!(
        "{} {}",
        parts.join(" │ "),
        ui::styled_delta(snapshot.change_percent)
    );
    if view.fx.is_fallback && currency != view.fx.base_currency {
        line.push_str(&format!(" {}", ui::style_text("(approx FX)", ui::StyleType::Subtle)));
    }
    if view.is_stale() {
        line.push_str(&format!(
            " {}",
            ui::style_text(
                &format!("[stale, {} failed polls]", view.consecutive_failures),
                ui::StyleType::Error
            )
        ));
    }
    line
}

/// Streams ticker lines until Ctrl-C.
pub async fn run(config: &AppConfig, currency: Option<&str>) -> Result<()> {
    let currency = currency.unwrap_or(&config.currency);
    let scheduler = crate::build_scheduler(config)?.with_adapter(ConsoleTicker::new(currency));
    let handle = scheduler.handle();

    let poller = tokio::spawn(scheduler.run());

    let stopper = handle.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Ctrl-C received, stopping");
        stopper.stop();
    });

    poller.await?;
    Ok(())
}
