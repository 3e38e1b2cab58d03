//! Sitecraft Bot Library
//!
//! A conversational builder for project landing pages.
//!
//! This crate provides the core functionality for:
//! - Walking a user through a multi-step form with edit and resume
//! - Validating and collecting the fields of a site
//! - Rendering the collected fields into an HTML template
//! - Publishing the page locally or to GitHub Pages
//! - Handling chat commands and per-user sessions

pub mod commands;
pub mod config;
pub mod content;
pub mod dialogue;
pub mod intent;
pub mod publish;
pub mod sessions;
