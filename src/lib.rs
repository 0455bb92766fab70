// SPDX-License-Identifier: MIT

//! ChitChat: one-to-one messaging backend.
//!
//! This crate provides the chat-thread synchronization and
//! membership-resolution engine: phone-number discovery, deduplicated
//! thread creation, and per-user live thread views.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::{DirectoryStore, ThreadStore};
use services::{MembershipResolver, SessionManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub directory: Arc<dyn DirectoryStore>,
    pub threads: Arc<dyn ThreadStore>,
    pub resolver: MembershipResolver,
    pub sessions: SessionManager,
}
