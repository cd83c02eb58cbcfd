mod database {
    pub mod actions;
    pub mod connection;
    pub mod error;
    pub mod import;
    pub mod schema;
    pub mod shopping_list;
    pub mod validation;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;
pub mod response;

pub use actions::*;
pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
