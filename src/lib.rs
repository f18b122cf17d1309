#![doc(test(attr(deny(warnings))))]

//! Clearing Core provides the vehicle-intake wizard, historical cost estimate
//! lookup, and submission primitives behind the clearing-workflow CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod time;
pub mod utils;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Clearing Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
