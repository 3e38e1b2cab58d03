//! Normalization and validation of single user inputs.
//!
//! Every parser here is pure. A rejected input comes back as an
//! [`InputError`] carrying a hint the handler can show next to the re-prompt.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use super::fields::DEFAULT_SECTIONS;

/// Brand words split out of names typed in a single case.
const BRAND_WORDS: [&str; 10] = [
    "inu", "moon", "elon", "doge", "shib", "floki", "coin", "token", "baby", "safe",
];

/// Keys accepted by the tax shorthand.
pub const TAX_KEYS: [&str; 6] = ["buy", "sell", "burn", "redistribution", "liquidity", "marketing"];

/// Keys accepted by the color shorthand.
pub const COLOR_KEYS: [&str; 3] = ["primary", "secondary", "accent"];

/// A rejected user input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("Please enter a value")]
    Empty,

    #[error("Couldn't read {field} from '{input}'. Expected format: {hint}")]
    Malformed {
        field: &'static str,
        input: String,
        hint: &'static str,
    },

    #[error("Unknown {field} '{input}'. Options: {options}")]
    UnknownOption {
        field: &'static str,
        input: String,
        options: String,
    },

    #[error("Token distribution adds up to {total}%, which is more than 100%")]
    DistributionOverflow { total: f64 },

    #[error("Missing required sections: {}", .missing.join(", "))]
    MissingSections { missing: Vec<String> },
}

/// Whether the user asked to skip this prompt.
#[must_use]
pub fn is_skip(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("skip")
}

fn malformed(field: &'static str, input: &str, hint: &'static str) -> InputError {
    InputError::Malformed {
        field,
        input: input.trim().to_owned(),
        hint,
    }
}

/// Normalizes a link. `skip` yields `None`; a missing scheme becomes `https://`.
pub fn normalize_url(input: &str) -> Result<Option<String>, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if is_skip(trimmed) {
        return Ok(None);
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate)
        .map_err(|_| malformed("link", trimmed, "t.me/yourgroup or https://..."))?;
    if parsed.host_str().is_none_or(|h| !h.contains('.')) || trimmed.contains(char::is_whitespace) {
        return Err(malformed("link", trimmed, "t.me/yourgroup or https://..."));
    }
    Ok(Some(candidate))
}

/// Normalizes one percentage to `N%`, accepting an optional `%` on input.
pub fn normalize_percentage(input: &str) -> Option<String> {
    let number = input.trim().trim_end_matches('%').trim();
    let value: f64 = number.parse().ok()?;
    if !(0.0..=100.0).contains(&value) {
        return None;
    }
    Some(format!("{}%", format_number(value)))
}

fn percentage_value(normalized: &str) -> f64 {
    normalized.trim_end_matches('%').parse().unwrap_or(0.0)
}

fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}

/// Parses `buy:5%,sell:7%` into tax key → normalized percentage.
pub fn parse_tax(input: &str) -> Result<BTreeMap<&'static str, String>, InputError> {
    const HINT: &str = "buy:5%,sell:7% (keys: buy, sell, burn, redistribution, liquidity, marketing)";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let mut taxes = BTreeMap::new();
    for pair in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| malformed("taxes", trimmed, HINT))?;
        let key = key.trim().to_ascii_lowercase();
        let key = TAX_KEYS
            .iter()
            .copied()
            .find(|k| *k == key)
            .ok_or_else(|| InputError::UnknownOption {
                field: "tax",
                input: key.clone(),
                options: TAX_KEYS.join(", "),
            })?;
        let value = normalize_percentage(value).ok_or_else(|| malformed("taxes", trimmed, HINT))?;
        taxes.insert(key, value);
    }

    if taxes.is_empty() {
        return Err(malformed("taxes", trimmed, HINT));
    }
    Ok(taxes)
}

/// Maps a tax shorthand key to its accumulator path.
#[must_use]
pub fn tax_field_path(key: &str) -> String {
    match key {
        "buy" => "tokenomics.buy_tax".to_owned(),
        "sell" => "tokenomics.sell_tax".to_owned(),
        other => format!("tokenomics.{other}"),
    }
}

/// Parses `Team:10%,Marketing:20%` into `[{name, percentage}]`.
pub fn parse_distribution(input: &str) -> Result<Vec<Value>, InputError> {
    const HINT: &str = "Team:10%,Marketing:20%";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let mut entries = Vec::new();
    let mut total = 0.0;
    for pair in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .rsplit_once(':')
            .ok_or_else(|| malformed("distribution", trimmed, HINT))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed("distribution", trimmed, HINT));
        }
        let percentage =
            normalize_percentage(value).ok_or_else(|| malformed("distribution", trimmed, HINT))?;
        total += percentage_value(&percentage);
        entries.push(json!({ "name": name, "percentage": percentage }));
    }

    if entries.is_empty() {
        return Err(malformed("distribution", trimmed, HINT));
    }
    if total > 100.0 + f64::EPSILON {
        return Err(InputError::DistributionOverflow { total });
    }
    Ok(entries)
}

/// Parses `a, b; c, d` into roadmap phases.
pub fn parse_roadmap(input: &str) -> Result<Vec<Vec<String>>, InputError> {
    const HINT: &str = "Launch, Listing; Partnerships, Staking";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    trimmed
        .split(';')
        .map(|phase| {
            let items: Vec<String> = phase
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect();
            if items.is_empty() {
                Err(malformed("roadmap", trimmed, HINT))
            } else {
                Ok(items)
            }
        })
        .collect()
}

/// Parses a comma separated section order that must be a permutation of the defaults.
pub fn parse_sections(input: &str) -> Result<Vec<String>, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for section in trimmed.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        if section.is_empty() {
            continue;
        }
        if !DEFAULT_SECTIONS.contains(&section.as_str()) {
            return Err(InputError::UnknownOption {
                field: "section",
                input: section,
                options: DEFAULT_SECTIONS.join(", "),
            });
        }
        if !seen.insert(section.clone()) {
            return Err(malformed(
                "sections",
                trimmed,
                "each section listed once, e.g. header, about, tokenomics, roadmap, community",
            ));
        }
        order.push(section);
    }

    let missing: Vec<String> = DEFAULT_SECTIONS
        .iter()
        .filter(|s| !seen.contains(**s))
        .map(|s| (*s).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(InputError::MissingSections { missing });
    }
    Ok(order)
}

/// Whether `value` is a `#RGB`, `#RRGGBB` or `#RRGGBBAA` color.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|digits| {
        matches!(digits.len(), 3 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Parses `primary:#hex,accent:#hex` into color key → uppercase hex.
pub fn parse_colors(input: &str) -> Result<BTreeMap<&'static str, String>, InputError> {
    const HINT: &str = "primary:#0F0F29,secondary:#00FFFF,accent:#FF00FF";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let mut colors = BTreeMap::new();
    for pair in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once(':')
            .ok_or_else(|| malformed("colors", trimmed, HINT))?;
        let key = key.trim().to_ascii_lowercase();
        let key = COLOR_KEYS
            .iter()
            .copied()
            .find(|k| *k == key)
            .ok_or_else(|| InputError::UnknownOption {
                field: "color",
                input: key.clone(),
                options: COLOR_KEYS.join(", "),
            })?;
        let value = value.trim();
        if !is_hex_color(value) {
            return Err(malformed("colors", trimmed, HINT));
        }
        colors.insert(key, value.to_ascii_uppercase());
    }

    if colors.is_empty() {
        return Err(malformed("colors", trimmed, HINT));
    }
    Ok(colors)
}

/// Parses a custom social link `name:url`.
pub fn parse_custom_social(input: &str) -> Result<(String, String), InputError> {
    const HINT: &str = "blog:medium.com/@yourproject";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let (name, url) = trimmed
        .split_once(':')
        .ok_or_else(|| malformed("custom link", trimmed, HINT))?;
    let name = name.trim();
    if name.is_empty()
        || name.contains('/')
        || name.eq_ignore_ascii_case("http")
        || name.eq_ignore_ascii_case("https")
    {
        return Err(malformed("custom link", trimmed, HINT));
    }
    match normalize_url(url)? {
        Some(url) => Ok((name.to_owned(), url)),
        None => Err(malformed("custom link", trimmed, HINT)),
    }
}

/// Checks that a supply string mentions at least one digit.
pub fn validate_supply(input: &str) -> Result<String, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err(malformed("total supply", trimmed, "1,000,000,000 or 1B tokens"));
    }
    Ok(trimmed.to_owned())
}

/// Normalizes a custom domain to a bare lowercase host name.
pub fn normalize_domain(input: &str) -> Result<String, InputError> {
    const HINT: &str = "mycoin.com";

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let lower = trimmed.to_ascii_lowercase();
    let host = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower)
        .trim_end_matches('/');

    let valid_chars = host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    let valid_labels = host.split('.').all(|label| {
        !label.is_empty() && !label.starts_with('-') && !label.ends_with('-')
    });
    if host.contains('.') && valid_chars && valid_labels {
        Ok(host.to_owned())
    } else {
        Err(malformed("domain", trimmed, HINT))
    }
}

/// Turns a raw coin name into a display name.
///
/// `MoonElonDoge` becomes `Moon Elon Doge`, `cosmotoken` becomes `Cosmo Token`.
#[must_use]
pub fn format_name(raw: &str) -> String {
    let camel = split_camel_case(raw.trim());
    let single_case = camel == camel.to_uppercase() || camel == camel.to_lowercase();
    let split = if single_case {
        split_brand_words(&camel)
    } else {
        camel
    };
    split
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives a ticker symbol from a raw coin name.
#[must_use]
pub fn derive_symbol(raw: &str) -> String {
    let raw = raw.trim();
    let capitals: String = raw.chars().filter(|c| c.is_uppercase()).collect();
    if capitals.is_empty() {
        raw.chars()
            .filter(|c| !c.is_whitespace())
            .take(4)
            .collect::<String>()
            .to_uppercase()
    } else {
        capitals
    }
}

fn split_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut previous: Option<char> = None;
    for c in name.chars() {
        if previous.is_some_and(char::is_lowercase) && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

fn split_brand_words(name: &str) -> String {
    if !name.is_ascii() {
        return name.to_owned();
    }
    let lower = name.to_ascii_lowercase();
    let mut out = String::with_capacity(name.len() + 8);
    let mut i = 0;
    while i < name.len() {
        if let Some(word) = BRAND_WORDS.iter().find(|w| lower[i..].starts_with(**w)) {
            out.push(' ');
            out.push_str(&name[i..i + word.len()]);
            out.push(' ');
            i += word.len();
        } else {
            out.push_str(&name[i..=i]);
            i += 1;
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}
