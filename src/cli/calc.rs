use super::{fetch_view, resolve_currency, ui};
use crate::core::Karat;
use crate::core::calculator::{Calculation, compute_total, validate_weight};
use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::debug;

pub struct CalcArgs {
    pub karat: String,
    pub weight: f64,
    pub unit: String,
    pub currency: Option<String>,
}

pub fn format_calculation(calculation: &Calculation) -> String {
    format!(
        "{} {} ({:.3} g × {}/g)",
        ui::style_text("≈", ui::StyleType::TotalLabel),
        ui::style_text(
            &ui::format_money(calculation.total, &calculation.currency),
            ui::StyleType::TotalValue
        ),
        calculation.grams,
        ui::format_money(calculation.per_gram, &calculation.currency)
    )
}

/// Values a quantity of gold at the current price.
pub async fn run(config: &AppConfig, args: CalcArgs) -> Result<()> {
    let karat: Karat = args.karat.parse()?;
    validate_weight(args.weight)?;
    let view = fetch_view(config).await?;
    let currency = resolve_currency(
        args.currency.as_deref().unwrap_or(&config.currency),
        &view.fx,
    );

    let calculation = compute_total(
        karat,
        args.weight,
        &args.unit,
        &currency,
        &view.snapshot,
        &view.fx,
    )?;
    debug!(?calculation, "Computed value");

    println!("{}", format_calculation(&calculation));
    if view.is_stale() {
        println!(
            "{}",
            ui::style_text("Based on the last known price.", ui::StyleType::Error)
        );
    }
    println!(
        "{}",
        ui::style_text(&view.fx.provenance_note(), ui::StyleType::Subtle)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_calculation() {
        console::set_colors_enabled(false);
        let calculation = Calculation {
            karat: Karat::K22,
            grams: 10.0,
            per_gram_usd: 58.94,
            per_gram: 216.46,
            total: 2164.6,
            currency: "AED".to_string(),
        };
        assert_eq!(
            format_calculation(&calculation),
            "≈ AED 2,164.60 (10.000 g × AED 216.46/g)"
        );
    }
}
