pub mod convert;
pub mod prices;
pub mod rates;
pub mod setup;
pub mod ui;
