//! Command handlers.

pub(crate) mod run;
pub(crate) mod upload;
