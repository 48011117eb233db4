pub mod exchange_rate;
pub mod goldapi;
pub mod util;
