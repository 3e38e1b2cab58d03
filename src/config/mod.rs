//! Configuration module for the site builder bot.
//!
//! Handles environment settings, hosting credentials, and the catalog of
//! templates and themes offered during the dialogue.

mod catalog;
mod settings;

pub use catalog::{Catalog, CatalogError, Palette, TemplateInfo, TemplateKind, ThemeInfo};
pub use settings::{BotSettings, ConfigError, GitHubConfig, TransitionPolicy};
