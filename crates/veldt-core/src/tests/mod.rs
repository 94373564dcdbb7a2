//! Crate-level tests exercising the map engine end to end.

pub mod helpers;

mod integration;
