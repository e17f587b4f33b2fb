mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod settings;
mod constants;

pub use authentication::*;
pub use settings::*;
pub use constants::*;
pub use database::*;
pub use actions::*;
