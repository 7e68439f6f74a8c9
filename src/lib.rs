pub mod config;
pub mod database_ops;
pub mod error;
pub mod normalization;
pub mod pipeline;
pub mod swapi;
pub mod tracing;

pub mod util {
    pub mod db;
    pub mod env;
}

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ErrorKind, SyncError, SyncResult};
