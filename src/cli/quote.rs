use super::{fetch_view, resolve_currency, ui};
use crate::core::config::AppConfig;
use crate::core::currency::convert;
use crate::core::{CanonicalPriceSnapshot, FxTable, Karat, TickerView};
use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

#[derive(Serialize)]
struct QuoteOutput<'a> {
    snapshot: &'a CanonicalPriceSnapshot,
    fx: &'a FxTable,
    stale: bool,
}

impl TickerView {
    pub fn display_as_table(&self, currency: &str, now_seconds: i64) -> String {
        let snapshot = &self.snapshot;
        let money = |usd: f64| ui::format_money(convert(usd, currency, &self.fx), currency);

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Karat"),
            ui::header_cell(&format!("Price / g ({currency})")),
            ui::header_cell("Change"),
        ]);
        for karat in Karat::ALL {
            table.add_row(vec![
                Cell::new(karat.to_string()),
                ui::format_optional_cell(snapshot.per_gram(karat), money),
                ui::change_cell(snapshot.change_percent),
            ]);
        }

        let mut output = format!(
            "{} {}\n\n",
            ui::style_text("Gold (XAU)", ui::StyleType::Title),
            ui::style_text(&snapshot.sentiment().to_string(), ui::StyleType::TotalLabel)
        );
        output.push_str(&table.to_string());

        let spot = snapshot
            .spot_price_usd_per_ounce
            .map_or("N/A".to_string(), |s| format!("{} / oz", money(s)));
        output.push_str(&format!(
            "\n\nSpot: {} {}",
            ui::style_text(&spot, ui::StyleType::TotalValue),
            ui::styled_delta(snapshot.change_percent)
        ));

        let ohl = |value: Option<f64>| value.map_or("N/A".to_string(), money);
        output.push_str(&format!(
            "\nOpen: {}  High: {}  Low: {}",
            ohl(snapshot.open_usd),
            ohl(snapshot.high_usd),
            ohl(snapshot.low_usd)
        ));

        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!(
                    "Updated {}. {}",
                    ui::last_update_text(snapshot.timestamp_seconds, now_seconds),
                    self.fx.provenance_note()
                ),
                ui::StyleType::Subtle
            )
        ));
        if self.is_stale() {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    "Price provider unavailable, showing last known price.",
                    ui::StyleType::Error
                )
            ));
        }

        output
    }
}

pub async fn run(config: &AppConfig, currency: Option<&str>, json: bool) -> Result<()> {
    let view = fetch_view(config).await?;

    if json {
        let output = QuoteOutput {
            snapshot: &view.snapshot,
            fx: &view.fx,
            stale: view.is_stale(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let currency = resolve_currency(currency.unwrap_or(&config.currency), &view.fx);
    println!(
        "{}",
        view.display_as_table(&currency, chrono::Utc::now().timestamp())
    );
    Ok(())
}
