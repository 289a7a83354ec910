//! Core of the waymark tracker: workout records, the append-only log, the
//! storage slot behind it, and the controller that ties the surfaces
//! together. The binary in `main.rs` is a thin terminal shell over this.

pub mod app;
pub mod cli;
pub mod session;
pub mod storage;
pub mod store;
pub mod utils;
pub mod workout;
