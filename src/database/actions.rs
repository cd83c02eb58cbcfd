//! Store-backed actions. Each returns `Result<_, potion::Error>` so callers
//! can hand the outcome straight to [`crate::response::respond`].

pub mod favorites;
pub mod follows;
pub mod ingredients;
pub mod recipes;
pub mod shopping_cart;
pub mod tags;
pub mod users;

pub use favorites::*;
pub use follows::*;
pub use ingredients::*;
pub use recipes::*;
pub use shopping_cart::*;
pub use tags::*;
pub use users::*;
