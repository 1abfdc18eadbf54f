//! # TaskDeck API Server Library
//!
//! Core functionality for the TaskDeck API server.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: environment configuration
//! - `cookies`: token cookie construction and parsing
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: authentication and security headers
//! - `pagination`: page/per_page query handling
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod cookies;
pub mod error;
pub mod middleware;
pub mod pagination;
pub mod routes;
