//! FoodHub ordering backend and the app-side ordering flow that talks to it.

pub mod app;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod orders;
pub mod state;
pub mod storage;
