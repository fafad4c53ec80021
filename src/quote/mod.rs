pub mod coinmarketcap;
pub mod decoder;
pub mod model;
pub mod provider;

pub use model::{PriceSnapshot, Quote};
