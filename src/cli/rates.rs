use super::ui;
use crate::core::currency::{CurrencyCode, ExchangeRateTable};
use crate::store::ConversionStore;
use anyhow::Result;
use comfy_table::Cell;

/// Renders the rate table, optionally restricted to `filter` codes.
pub fn render_rates(table: &ExchangeRateTable, filter: &[String]) -> String {
    let mut out = ui::new_styled_table();
    out.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (1 {})", table.base)),
    ]);

    for (code, rate) in table.sorted() {
        if !filter.is_empty() && !filter.iter().any(|f| f == code.as_str()) {
            continue;
        }
        out.add_row(vec![
            Cell::new(code.as_str()),
            ui::number_cell(format!("{rate:.4}")),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(
            &format!("Exchange rates for {} as of {}", table.base, table.date),
            ui::StyleType::Title
        ),
        out
    )
}

pub async fn run(store: &ConversionStore, base: &CurrencyCode, filter: &[String]) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let _ = store.fetch_exchange_rates(base).await;
    pb.finish_and_clear();

    let snapshot = store.snapshot();
    match &snapshot.exchange_rates {
        Some(table) => println!("{}", render_rates(table, filter)),
        None => println!(
            "{}",
            ui::style_text("No exchange rates available", ui::StyleType::Subtle)
        ),
    }
    print!("{}", ui::error_footer(snapshot.error_message.as_deref()));
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn table() -> ExchangeRateTable {
        ExchangeRateTable::new(
            CurrencyCode::new("USD").unwrap(),
            "2024-05-01".to_string(),
            HashMap::from([
                (CurrencyCode::new("EUR").unwrap(), 0.93),
                (CurrencyCode::new("JPY").unwrap(), 157.8),
            ]),
        )
    }

    #[test]
    fn test_render_rates() {
        let output = render_rates(&table(), &[]);
        assert!(output.contains("Exchange rates for USD as of 2024-05-01"));
        assert!(output.contains("0.9300"));
        assert!(output.contains("157.8000"));
    }

    #[test]
    fn test_render_rates_filtered() {
        let output = render_rates(&table(), &["JPY".to_string()]);
        assert!(output.contains("JPY"));
        assert!(!output.contains("EUR"));
    }
}
