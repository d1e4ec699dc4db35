use super::ui;
use crate::core::asset::Asset;
use crate::core::currency::CurrencyCode;
use crate::store::{ConversionStore, StoreState};
use anyhow::Result;
use comfy_table::Cell;

/// Renders every cached asset with its USD price and its last converted value.
pub fn render_prices(state: &StoreState, currency: &CurrencyCode, amount: f64) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Price (USD)"),
        ui::header_cell(&format!("Value of {} ({currency})", ui::format_amount(amount))),
    ]);

    let prices = state.crypto_prices.iter().flat_map(|p| p.iter());
    for (asset, usd) in prices {
        let converted = state.converted_prices.get(&asset).copied();
        table.add_row(vec![
            Cell::new(format!("{} ({})", asset.id(), asset.ticker())),
            ui::number_cell(ui::format_amount(usd)),
            ui::format_optional_cell(converted, ui::format_amount),
        ]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Crypto prices", ui::StyleType::Title)
    );
    if state.crypto_prices.is_none() {
        output.push_str(&ui::style_text("No prices available", ui::StyleType::Subtle));
    } else {
        output.push_str(&table.to_string());
    }
    if let Some(rates) = &state.exchange_rates {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("Rates base {} as of {}", rates.base, rates.date),
                ui::StyleType::Subtle
            )
        ));
    }
    output.push_str(&ui::error_footer(state.error_message.as_deref()));
    output
}

pub async fn run(store: &ConversionStore, currency: &CurrencyCode, amount: f64) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices and exchange rates...");
    store.initialize().wait().await;
    pb.finish_and_clear();

    let cached: Vec<Asset> = store
        .snapshot()
        .crypto_prices
        .map(|p| p.iter().map(|(asset, _)| asset).collect())
        .unwrap_or_default();
    for asset in cached {
        // Failures land in the store's error message
        let _ = store.convert_crypto_price(asset, amount, currency).await;
    }

    println!("{}", render_prices(&store.snapshot(), currency, amount));
    Ok(())
}
