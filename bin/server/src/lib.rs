//! Ignitus admin console server and UI.
//!
//! Leptos front end plus the axum routes that sign administrators in. Every
//! protected view asks the server for an access decision; the browser never
//! decides on its own.

#![allow(non_snake_case)]

pub mod access;
pub mod app;
pub mod pages;
pub mod types;

#[cfg(feature = "ssr")]
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod error;
#[cfg(feature = "ssr")]
pub mod server_helpers;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
