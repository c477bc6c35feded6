#![forbid(unsafe_code)]

//! WASM runner for the lzviz visualizer.
//!
//! This crate provides [`VisualizerRunner`], a `wasm-bindgen`-exported struct
//! that wraps a `lzviz_runtime::Controller` and exposes it to JavaScript for
//! host-driven execution. The page owns the animation loop: it calls
//! `advanceTime` from `requestAnimationFrame`, redraws when `takeDirty`
//! reports a change, and plays whatever `takeCues` returns.
//!
//! Compression can run inside the module (`submit`) or on a server the page
//! `fetch`es (`beginSubmit` / `completeSubmit` / `failSubmit`). Responses
//! for superseded submissions are dropped.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::VisualizerRunner;

// Runner core is used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod runner_core;
