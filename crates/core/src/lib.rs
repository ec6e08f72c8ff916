pub mod config;
pub mod context;
pub mod entity;
pub mod error;

pub use config::Config;
pub use context::*;
pub use entity::*;
pub use error::*;
