//! Pokedash - sprite collection dashboard
//!
//! The library exposes every module so integration tests can drive the store,
//! components and parsers without a terminal.

pub mod action;
pub mod api;
pub mod catalog;
pub mod components;
pub mod config;
pub mod effect;
pub mod logging;
pub mod modal;
pub mod reducer;
pub mod state;
pub mod ui;
