pub mod rng;
pub mod validation;

pub use rng::GameRng;
pub use validation::{percent_of, validate_wager};
