// src/display/mod.rs
//! Display modules

pub mod terminal;

pub use terminal::{Action, TerminalDisplay};
