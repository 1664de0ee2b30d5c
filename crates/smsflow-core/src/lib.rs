//! Core types and the step-state-machine for the smsflow responder.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Rendering and persistence are reached through the [`render::Renderer`]
//! and [`store::UserStore`] traits.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod message;
pub mod render;
pub mod state;
pub mod step;
pub mod store;
pub mod user;

pub use error::{Error, Result};
