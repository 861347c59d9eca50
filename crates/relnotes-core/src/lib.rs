pub mod classify;
pub mod config;
pub mod error;
pub mod github;
pub mod io;
pub mod paths;
pub mod release;
pub mod render;
pub mod repo;
pub mod sync;
pub mod tag;

pub use error::{RelnotesError, Result};
