//! Template and theme catalog with validation.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialogue::{DEFAULT_SECTIONS, is_hex_color};

/// Errors that can occur while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Template at index {index} has unknown id '{id}' (expected memecoin, nft or defi)")]
    UnknownTemplate { index: usize, id: String },

    #[error("{kind} at index {index} (id: {id}) has an empty name")]
    EmptyName {
        kind: &'static str,
        index: usize,
        id: String,
    },

    #[error("Duplicate {kind} ID found: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{kind} '{id}' has invalid {slot} color '{value}'")]
    InvalidColor {
        kind: &'static str,
        id: String,
        slot: &'static str,
        value: String,
    },

    #[error("Template '{id}' lists unknown section '{section}'")]
    UnknownSection { id: String, section: String },

    #[error("No templates configured")]
    NoTemplates,

    #[error("No themes configured")]
    NoThemes,

    #[error("Failed to read catalog file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// The page layouts the renderer knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Memecoin,
    Nft,
    Defi,
}

impl TemplateKind {
    pub const ALL: [Self; 3] = [Self::Memecoin, Self::Nft, Self::Defi];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memecoin => "memecoin",
            Self::Nft => "nft",
            Self::Defi => "defi",
        }
    }

    /// Theme picked when the user names no color or mood.
    #[must_use]
    pub const fn default_theme(self) -> &'static str {
        match self {
            Self::Memecoin => "neon",
            Self::Nft => "royal",
            Self::Defi => "dark",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memecoin" | "meme" => Ok(Self::Memecoin),
            "nft" => Ok(Self::Nft),
            "defi" => Ok(Self::Defi),
            other => Err(format!("unknown template '{other}'")),
        }
    }
}

/// Three-slot color palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Palette {
    #[must_use]
    pub fn new(primary: &str, secondary: &str, accent: &str) -> Self {
        Self {
            primary: primary.to_owned(),
            secondary: secondary.to_owned(),
            accent: accent.to_owned(),
        }
    }

    fn slots(&self) -> [(&'static str, &str); 3] {
        [
            ("primary", self.primary.as_str()),
            ("secondary", self.secondary.as_str()),
            ("accent", self.accent.as_str()),
        ]
    }
}

/// A selectable page template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub default_colors: Palette,
    #[serde(default = "default_sections")]
    pub default_sections: Vec<String>,
}

fn default_sections() -> Vec<String> {
    DEFAULT_SECTIONS.iter().map(|s| (*s).to_owned()).collect()
}

impl TemplateInfo {
    /// The renderer layout this entry maps to, if its id is recognized.
    #[must_use]
    pub fn kind(&self) -> Option<TemplateKind> {
        self.id.parse().ok()
    }
}

/// A selectable color theme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeInfo {
    pub id: String,
    pub name: String,
    pub colors: Palette,
}

/// All templates and themes offered to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Catalog {
    pub templates: Vec<TemplateInfo>,
    pub themes: Vec<ThemeInfo>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The catalog shipped with the bot.
    #[must_use]
    pub fn builtin() -> Self {
        let template = |id: &str, name: &str, description: &str, colors: Palette| TemplateInfo {
            id: id.to_owned(),
            name: name.to_owned(),
            description: description.to_owned(),
            default_colors: colors,
            default_sections: default_sections(),
        };
        let theme = |id: &str, name: &str, colors: Palette| ThemeInfo {
            id: id.to_owned(),
            name: name.to_owned(),
            colors,
        };

        Self {
            templates: vec![
                template(
                    "memecoin",
                    "MemeCoin Landing Page",
                    "A modern, animated landing page for meme coins with tokenomics and roadmap",
                    Palette::new("#FF6B6B", "#4ECDC4", "#FFE66D"),
                ),
                template(
                    "nft",
                    "NFT Collection",
                    "Showcase your NFT collection with gallery and minting interface",
                    Palette::new("#6B5B95", "#FFA500", "#88B04B"),
                ),
                template(
                    "defi",
                    "DeFi Dashboard",
                    "Professional DeFi platform with staking and yield farming information",
                    Palette::new("#00A4CC", "#F95700", "#ADEFD1"),
                ),
            ],
            themes: vec![
                theme("dark", "Dark Theme", Palette::new("#2C3E50", "#1ABC9C", "#E74C3C")),
                theme("light", "Light Theme", Palette::new("#ECF0F1", "#3498DB", "#F1C40F")),
                theme("neon", "Neon Theme", Palette::new("#0F0F29", "#00FFFF", "#FF00FF")),
                theme("nature", "Nature Theme", Palette::new("#2C5F2D", "#97BC62", "#FED766")),
                theme("royal", "Royal Theme", Palette::new("#2C3E50", "#8E44AD", "#F1C40F")),
            ],
        }
    }

    /// Creates an example catalog for users to reference.
    #[must_use]
    pub fn example() -> Self {
        let mut catalog = Self::builtin();
        catalog.themes.push(ThemeInfo {
            id: "sunset".to_owned(),
            name: "Sunset Theme".to_owned(),
            colors: Palette::new("#FF5E5B", "#FFED66", "#00CECB"),
        });
        catalog
    }

    /// Loads a catalog from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog: Self = serde_json::from_str(&content)?;
        Ok(catalog)
    }

    /// Loads the file at `path` when it exists, else the built-in catalog.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Saves the catalog to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates every entry, stopping at the first problem.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_all().into_iter().collect()
    }

    /// Returns one result per template and theme, in file order.
    #[must_use]
    pub fn validate_all(&self) -> Vec<Result<(), CatalogError>> {
        let mut results = Vec::new();

        if self.templates.is_empty() {
            results.push(Err(CatalogError::NoTemplates));
        }
        if self.themes.is_empty() {
            results.push(Err(CatalogError::NoThemes));
        }

        let mut seen_ids = HashSet::new();
        for (index, template) in self.templates.iter().enumerate() {
            results.push(Self::check_template(index, template, &mut seen_ids));
        }

        let mut seen_ids = HashSet::new();
        for (index, theme) in self.themes.iter().enumerate() {
            results.push(Self::check_theme(index, theme, &mut seen_ids));
        }

        results
    }

    fn check_template<'a>(
        index: usize,
        template: &'a TemplateInfo,
        seen_ids: &mut HashSet<&'a str>,
    ) -> Result<(), CatalogError> {
        if !seen_ids.insert(&template.id) {
            return Err(CatalogError::DuplicateId {
                kind: "template",
                id: template.id.clone(),
            });
        }
        if template.kind().is_none() {
            return Err(CatalogError::UnknownTemplate {
                index,
                id: template.id.clone(),
            });
        }
        if template.name.trim().is_empty() {
            return Err(CatalogError::EmptyName {
                kind: "Template",
                index,
                id: template.id.clone(),
            });
        }
        check_palette("Template", &template.id, &template.default_colors)?;
        if let Some(section) = template
            .default_sections
            .iter()
            .find(|s| !DEFAULT_SECTIONS.contains(&s.as_str()))
        {
            return Err(CatalogError::UnknownSection {
                id: template.id.clone(),
                section: section.clone(),
            });
        }
        Ok(())
    }

    fn check_theme<'a>(
        index: usize,
        theme: &'a ThemeInfo,
        seen_ids: &mut HashSet<&'a str>,
    ) -> Result<(), CatalogError> {
        if !seen_ids.insert(&theme.id) {
            return Err(CatalogError::DuplicateId {
                kind: "theme",
                id: theme.id.clone(),
            });
        }
        if theme.name.trim().is_empty() {
            return Err(CatalogError::EmptyName {
                kind: "Theme",
                index,
                id: theme.id.clone(),
            });
        }
        check_palette("Theme", &theme.id, &theme.colors)
    }

    /// Looks up a template by id, case-insensitively.
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&TemplateInfo> {
        let id = id.trim();
        self.templates.iter().find(|t| t.id.eq_ignore_ascii_case(id))
    }

    /// Looks up a theme by id, case-insensitively.
    #[must_use]
    pub fn theme(&self, id: &str) -> Option<&ThemeInfo> {
        let id = id.trim();
        self.themes.iter().find(|t| t.id.eq_ignore_ascii_case(id))
    }

    /// Comma separated template ids, for prompts and error hints.
    #[must_use]
    pub fn template_ids(&self) -> String {
        self.templates
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Comma separated theme ids, for prompts and error hints.
    #[must_use]
    pub fn theme_ids(&self) -> String {
        self.themes
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn check_palette(kind: &'static str, id: &str, palette: &Palette) -> Result<(), CatalogError> {
    match palette.slots().into_iter().find(|(_, value)| !is_hex_color(value)) {
        Some((slot, value)) => Err(CatalogError::InvalidColor {
            kind,
            id: id.to_owned(),
            slot,
            value: value.to_owned(),
        }),
        None => Ok(()),
    }
}
