//! Website monitor / grader.
//!
//! The performance breakdown and the page scores are estimates derived from
//! a single wall-clock measurement and keyword matches; see `checker` and
//! `lighthouse`.

pub mod checker;
pub mod lighthouse;
pub mod metadata;
pub mod security;
pub mod types;

pub use checker::{check_website, evaluate, DEFAULT_TIMEOUT_MS};
pub use types::*;
