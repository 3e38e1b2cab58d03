//! Free-text request analysis for the one-shot quick flow.
//!
//! A matcher turns a sentence such as "make a meme coin site for DogeX with a
//! neon theme" into a [`SiteIntent`]. Only the keyword matcher ships today;
//! the trait keeps the quick flow independent of how intents are produced.

mod keyword;

pub use keyword::KeywordMatcher;

use crate::config::TemplateKind;

/// What a free-text request asked for. Fields the text did not mention are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIntent {
    pub template: TemplateKind,
    pub name: Option<String>,
    pub theme: Option<String>,
    pub telegram: bool,
    pub twitter: bool,
    pub discord: bool,
    pub show_tokenomics: bool,
}

impl SiteIntent {
    /// An intent that asks for nothing beyond the default template.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            template: TemplateKind::Memecoin,
            name: None,
            theme: None,
            telegram: false,
            twitter: false,
            discord: false,
            show_tokenomics: true,
        }
    }
}

impl Default for SiteIntent {
    fn default() -> Self {
        Self::empty()
    }
}

/// Extracts a [`SiteIntent`] from free text.
pub trait IntentMatcher: Send + Sync {
    fn analyze(&self, text: &str) -> SiteIntent;
}

/// Builds a social link from a project name, e.g. `https://t.me/moonelondoge`.
#[must_use]
pub fn derive_social_link(base: &str, name: &str) -> String {
    let slug: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{base}{slug}")
}
