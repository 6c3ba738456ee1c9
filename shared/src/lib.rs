#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod auth;
pub mod cache;
pub mod capabilities;
pub mod config;
pub mod demo;
pub mod error;
pub mod event;
pub mod focus;
pub mod grid;
pub mod model;
pub mod remote;
pub mod view;

pub use app::{App, Model};
pub use capabilities::{Capabilities, Effect};
pub use crux_core::App as CruxApp;
pub use error::{AppError, ErrorKind};
pub use event::{Event, Secret};
pub use view::ViewModel;

/// Wall-clock milliseconds since the Unix epoch. The browser has no
/// `SystemTime`, so wasm reads `Date.now()`.
#[cfg(target_arch = "wasm32")]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn get_current_time_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
#[allow(clippy::cast_possible_truncation)]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
