use super::ui;
use crate::core::asset::Asset;
use crate::core::currency::CurrencyCode;
use crate::store::ConversionStore;
use anyhow::Result;

pub fn format_conversion(asset: Asset, amount: f64, currency: &CurrencyCode, value: f64) -> String {
    format!(
        "{} {} = {} {currency}",
        ui::format_amount(amount),
        asset.ticker(),
        ui::format_amount(value)
    )
}

pub async fn run(
    store: &ConversionStore,
    asset: Asset,
    amount: f64,
    currency: &CurrencyCode,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching prices and exchange rates...");
    store.initialize().wait().await;
    pb.finish_and_clear();

    if let Ok(value) = store.convert_crypto_price(asset, amount, currency).await {
        println!("{}", format_conversion(asset, amount, currency, value));
    }
    // Shows a fetch failure even when the conversion itself succeeded
    let message = store.snapshot().error_message;
    if let Some(message) = message {
        println!("{}", ui::style_text(&message, ui::StyleType::Error));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_conversion() {
        let eur = CurrencyCode::new("EUR").unwrap();
        assert_eq!(
            format_conversion(Asset::Bitcoin, 2.0, &eur, 90000.0),
            "2.00 BTC = 90000.00 EUR"
        );
    }
}
