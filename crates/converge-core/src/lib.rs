pub mod action;
pub mod activator;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod installer;
pub mod io;
pub mod paths;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod steps;
pub mod types;

pub use error::{ConvergeError, Result};
