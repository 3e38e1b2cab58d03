//! Keyword and pattern based intent matcher.

use regex::{Regex, RegexBuilder};

use super::{IntentMatcher, SiteIntent};
use crate::config::TemplateKind;

/// Template keywords, most specific kinds first so "nft ... crypto" stays an NFT site.
const TEMPLATE_KEYWORDS: [(TemplateKind, &str); 3] = [
    (TemplateKind::Nft, r"nfts?|collection|collectibles?|art"),
    (TemplateKind::Defi, r"defi|finance|staking|stake|yield|farming"),
    (TemplateKind::Memecoin, r"memecoin|meme|token|coin|crypto"),
];

/// Color and mood words mapped to catalog themes.
const THEME_KEYWORDS: [(&str, &str); 18] = [
    ("blue", "dark"),
    ("red", "royal"),
    ("green", "nature"),
    ("purple", "royal"),
    ("pink", "royal"),
    ("yellow", "nature"),
    ("orange", "neon"),
    ("black", "dark"),
    ("white", "light"),
    ("dark", "dark"),
    ("light", "light"),
    ("neon", "neon"),
    ("bright", "neon"),
    ("modern", "dark"),
    ("elegant", "royal"),
    ("professional", "royal"),
    ("fun", "neon"),
    ("serious", "dark"),
];

/// Words that end a captured project name.
const NAME_STOP_WORDS: [&str; 14] = [
    "with", "and", "using", "in", "that", "no", "without", "theme", "plus", "including", "on",
    "featuring", "please", "to",
];

const LEADING_ARTICLES: [&str; 5] = ["a", "an", "the", "my", "our"];

const MAX_NAME_WORDS: usize = 4;

/// Word-boundary regex matcher over fixed vocabularies.
#[derive(Debug)]
pub struct KeywordMatcher {
    templates: Vec<(TemplateKind, Regex)>,
    names: Vec<Regex>,
    theme: Regex,
    telegram: Regex,
    twitter: Regex,
    discord: Regex,
    hide_tokenomics: Regex,
}

fn word_regex(alternatives: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b(?:{alternatives})\b"))
        .case_insensitive(true)
        .build()
}

impl KeywordMatcher {
    /// Compiles the keyword patterns.
    pub fn new() -> Result<Self, regex::Error> {
        let templates = TEMPLATE_KEYWORDS
            .iter()
            .map(|(kind, words)| Ok((*kind, word_regex(words)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let names = ["called", "named", "for"]
            .iter()
            .map(|lead| {
                RegexBuilder::new(&format!(r"\b{lead}\s+([A-Za-z0-9][A-Za-z0-9 ]*)"))
                    .case_insensitive(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let theme_words = THEME_KEYWORDS
            .iter()
            .map(|(word, _)| *word)
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            templates,
            names,
            theme: word_regex(&theme_words)?,
            telegram: word_regex("telegram|tg")?,
            twitter: word_regex("twitter|x")?,
            discord: word_regex("discord")?,
            hide_tokenomics: word_regex(r"(?:no|without|remove)\s+tokenomics")?,
        })
    }

    fn template(&self, text: &str) -> TemplateKind {
        self.templates
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map_or(TemplateKind::Memecoin, |(kind, _)| *kind)
    }

    fn name(&self, text: &str) -> Option<String> {
        self.names.iter().find_map(|re| {
            let captured = re.captures(text)?.get(1)?.as_str();
            clean_name(captured)
        })
    }

    fn theme(&self, text: &str) -> Option<String> {
        let word = self.theme.find(text)?.as_str().to_ascii_lowercase();
        THEME_KEYWORDS
            .iter()
            .find(|(keyword, _)| *keyword == word)
            .map(|(_, theme)| (*theme).to_owned())
    }
}

fn clean_name(captured: &str) -> Option<String> {
    let mut words = captured.split_whitespace().peekable();
    while words
        .peek()
        .is_some_and(|w| LEADING_ARTICLES.iter().any(|a| w.eq_ignore_ascii_case(a)))
    {
        words.next();
    }
    let kept: Vec<&str> = words
        .take_while(|w| !NAME_STOP_WORDS.iter().any(|s| w.eq_ignore_ascii_case(s)))
        .take(MAX_NAME_WORDS)
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

impl IntentMatcher for KeywordMatcher {
    fn analyze(&self, text: &str) -> SiteIntent {
        let template = self.template(text);
        SiteIntent {
            template,
            name: self.name(text),
            theme: self.theme(text),
            telegram: self.telegram.is_match(text),
            twitter: self.twitter.is_match(text),
            discord: self.discord.is_match(text),
            show_tokenomics: !self.hide_tokenomics.is_match(text),
        }
    }
}
