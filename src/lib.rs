//! docdesk: backend for a browser documentation editor
//!
//! Serves a docs directory over HTTP (tree listing, CRUD, full-text search),
//! imports files from GitLab with a provenance header, and relays chat
//! requests to an AI backend.

pub mod commands;
pub mod config;
pub mod docs;
pub mod error;
pub mod import;
pub mod protocol;
pub mod relay;
pub mod server;
pub mod tree;
pub mod workspace;
