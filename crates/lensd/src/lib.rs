//! Lens Daemon - HTTP API for the Lens persona platform.
//!
//! Serves the interview, persona, chat/panel, and admin surfaces over the
//! orchestrators in `lens_common`.

pub mod demo;
pub mod routes;
pub mod server;
