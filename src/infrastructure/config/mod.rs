//! Infrastructure configuration modules.

pub mod endpoints;
pub mod limits;
pub mod logging;
pub mod settings;
