use super::ui;
use crate::core::{Exchange, ExchangeSource};
use anyhow::{Context, Result};
use comfy_table::Cell;

impl Exchange {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell("Buy"),
            ui::header_cell("Middle"),
            ui::header_cell("Sell"),
        ]);

        for (currency, rate) in &self.rates {
            table.add_row(vec![
                Cell::new(currency),
                ui::rate_cell(rate.buy),
                ui::rate_cell(rate.middle),
                ui::rate_cell(rate.sell),
            ]);
        }

        let mut output = format!(
            "Exchange rates for {}\n",
            ui::style_text(&self.date.format("%d.%m.%Y.").to_string(), ui::StyleType::Title)
        );
        output.push_str(&format!(
            "{}\n\n",
            ui::style_text("HRK per 1 unit of currency", ui::StyleType::Subtle)
        ));
        output.push_str(&table.to_string());
        output
    }
}

pub async fn run(source: &(dyn ExchangeSource + Send + Sync)) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = source.fetch_exchange().await;
    pb.finish_and_clear();

    let exchange = result.context("Failed to fetch exchange rates")?;
    println!("{}", exchange.display_as_table());
    Ok(())
}
