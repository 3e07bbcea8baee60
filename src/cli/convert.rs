use super::ui;
use crate::core::exchange::format_fixed;
use crate::core::{ExchangeSource, RateType};
use anyhow::{Context, Result};
use rust_decimal::Decimal;

pub async fn run(
    source: &(dyn ExchangeSource + Send + Sync),
    value: Decimal,
    currency: &str,
    rate: RateType,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = source.fetch_exchange().await;
    pb.finish_and_clear();

    let exchange = result.context("Failed to fetch exchange rates")?;
    let converted = exchange.convert(value, currency, rate)?;

    println!(
        "{} {} = {} ({} rate, {})",
        value,
        currency.to_uppercase(),
        ui::style_text(
            &format!("{} HRK", format_fixed(converted)),
            ui::StyleType::TotalValue
        ),
        ui::style_text(&rate.to_string(), ui::StyleType::TotalLabel),
        exchange.date.format("%d.%m.%Y."),
    );
    Ok(())
}
