//! Console gate — per-navigation session bootstrap for a cluster-management
//! console.
//!
//! ARCHITECTURE
//! ============
//! `routes` resolves each page request to a `route::Route` and hands it to
//! `gate::Gate` with the visitor's `state::ConsoleState`. The gate talks to
//! the upstream through `api::ConsoleApi` and answers with a redirect or a
//! ready state.

pub mod api;
pub mod config;
pub mod gate;
pub mod product;
pub mod route;
pub mod routes;
pub mod settings;
pub mod state;
