//! HTML rendering of collected fields with minijinja.
//!
//! Every field the user skipped is filled here, so rendering never fails
//! because of missing data:
//!
//! | field       | fallback                                   |
//! |-------------|--------------------------------------------|
//! | name        | random name for the template kind          |
//! | symbol      | derived from the name                      |
//! | slogan      | random slogan                              |
//! | description | per-template text                          |
//! | colors      | the template's default palette             |
//! | tokenomics  | [`Tokenomics::standard`], key by key       |
//! | roadmap     | [`STANDARD_ROADMAP`]                       |
//! | sections    | the template's default order               |

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Utc};
use minijinja::Environment;
use rand::Rng;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::{Catalog, Palette, TemplateKind};
use crate::content::{STANDARD_ROADMAP, Tokenomics, emoji_set, random_name, random_slogan};
use crate::dialogue::{DEFAULT_SECTIONS, derive_symbol, format_name};

const SOCIAL_LABELS: [(&str, &str); 5] = [
    ("telegram", "Telegram"),
    ("twitter", "Twitter"),
    ("discord", "Discord"),
    ("medium", "Medium"),
    ("github", "GitHub"),
];

/// A page rendered from a set of fields.
#[derive(Debug, Clone)]
pub struct RenderedSite {
    /// Display name the page was rendered for.
    pub title: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct SocialLink {
    label: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct Stat {
    label: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct TokenomicsView {
    total_supply: String,
    stats: Vec<Stat>,
    distribution: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct Phase {
    title: String,
    items: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SiteContext {
    kind: &'static str,
    name: String,
    symbol: String,
    slogan: String,
    description: String,
    logo_url: Option<String>,
    colors: Palette,
    socials: Vec<SocialLink>,
    tokenomics: TokenomicsView,
    roadmap: Vec<Phase>,
    sections: Vec<String>,
    emoji: [&'static str; 5],
    extras: Value,
    year: i32,
}

/// Renders pages from the bundled templates.
pub struct SiteRenderer {
    env: Environment<'static>,
    palettes: HashMap<TemplateKind, Palette>,
    sections: HashMap<TemplateKind, Vec<String>>,
}

impl SiteRenderer {
    /// Loads the bundled templates. Catalog entries supply per-template defaults.
    pub fn new(catalog: &Catalog) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../../templates/base.html"))?;
        env.add_template("memecoin.html", include_str!("../../templates/memecoin.html"))?;
        env.add_template("nft.html", include_str!("../../templates/nft.html"))?;
        env.add_template("defi.html", include_str!("../../templates/defi.html"))?;

        let mut palettes = HashMap::new();
        let mut sections = HashMap::new();
        for template in Catalog::builtin().templates.iter().chain(&catalog.templates) {
            if let Some(kind) = template.kind() {
                palettes.insert(kind, template.default_colors.clone());
                sections.insert(kind, template.default_sections.clone());
            }
        }

        Ok(Self {
            env,
            palettes,
            sections,
        })
    }

    /// Renders `fields` (flattened dotted keys) with the template for `kind`.
    pub fn render<R: Rng + ?Sized>(
        &self,
        kind: TemplateKind,
        fields: &BTreeMap<String, Value>,
        rng: &mut R,
    ) -> Result<RenderedSite, minijinja::Error> {
        let context = self.context(kind, fields, rng);
        let template = self.env.get_template(&format!("{}.html", kind.as_str()))?;
        let html = template.render(&context)?;
        Ok(RenderedSite {
            title: context.name,
            html,
        })
    }

    fn context<R: Rng + ?Sized>(
        &self,
        kind: TemplateKind,
        fields: &BTreeMap<String, Value>,
        rng: &mut R,
    ) -> SiteContext {
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let raw_name = text("coin_name").unwrap_or_else(|| random_name(kind, rng));
        let name = text("formatted_name").unwrap_or_else(|| format_name(&raw_name));
        let symbol = text("symbol").unwrap_or_else(|| derive_symbol(&raw_name));

        let palette = self.palettes.get(&kind).cloned().unwrap_or_else(|| {
            Palette::new("#FF6B6B", "#4ECDC4", "#FFE66D")
        });
        let colors = Palette {
            primary: text("colors.primary").unwrap_or(palette.primary),
            secondary: text("colors.secondary").unwrap_or(palette.secondary),
            accent: text("colors.accent").unwrap_or(palette.accent),
        };

        let show_tokenomics = fields
            .get("show_tokenomics")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let mut sections = fields
            .get("sections_order")
            .and_then(string_list)
            .filter(|list| !list.is_empty())
            .or_else(|| self.sections.get(&kind).cloned())
            .unwrap_or_else(|| DEFAULT_SECTIONS.iter().map(|s| (*s).to_owned()).collect());
        if !show_tokenomics {
            sections.retain(|s| s != "tokenomics");
        }

        SiteContext {
            kind: kind.as_str(),
            slogan: text("slogan").unwrap_or_else(|| random_slogan(rng)),
            description: text("description")
                .unwrap_or_else(|| default_description(kind).to_owned()),
            logo_url: text("logo_url"),
            colors,
            socials: socials(fields),
            tokenomics: tokenomics(fields),
            roadmap: roadmap(fields),
            sections,
            emoji: emoji_set(rng),
            extras: extras(kind, &symbol),
            year: Utc::now().year(),
            name,
            symbol,
        }
    }
}

impl std::fmt::Debug for SiteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRenderer")
            .field("palettes", &self.palettes)
            .finish_non_exhaustive()
    }
}

fn default_description(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Memecoin => {
            "The next generation of meme coins with revolutionary tokenomics."
        }
        TemplateKind::Nft => "A unique collection of digital art living on the blockchain.",
        TemplateKind::Defi => "A decentralized finance platform for staking and yield farming.",
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect()
}

fn socials(fields: &BTreeMap<String, Value>) -> Vec<SocialLink> {
    let mut links: Vec<SocialLink> = SOCIAL_LABELS
        .iter()
        .filter_map(|(key, label)| {
            let url = fields.get(&format!("social_links.{key}"))?.as_str()?;
            Some(SocialLink {
                label: (*label).to_owned(),
                url: url.to_owned(),
            })
        })
        .collect();

    if let Some(custom) = fields.get("social_links.custom").and_then(Value::as_array) {
        links.extend(custom.iter().filter_map(|entry| {
            Some(SocialLink {
                label: entry.get("name")?.as_str()?.to_owned(),
                url: entry.get("url")?.as_str()?.to_owned(),
            })
        }));
    }
    links
}

fn tokenomics(fields: &BTreeMap<String, Value>) -> TokenomicsView {
    let standard = Tokenomics::standard();
    let value = |key: &str| {
        fields
            .get(&format!("tokenomics.{key}"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    };

    let mut stats = Vec::new();
    if let Some(buy) = value("buy_tax") {
        stats.push(Stat { label: "Buy Tax", value: buy });
    }
    if let Some(sell) = value("sell_tax") {
        stats.push(Stat { label: "Sell Tax", value: sell });
    }
    stats.push(Stat {
        label: "Burn",
        value: value("burn").unwrap_or(standard.burn),
    });
    stats.push(Stat {
        label: "Redistribution",
        value: value("redistribution").unwrap_or(standard.redistribution),
    });
    stats.push(Stat {
        label: "Liquidity",
        value: value("liquidity").unwrap_or(standard.liquidity),
    });
    if let Some(marketing) = value("marketing").or(standard.marketing) {
        stats.push(Stat {
            label: "Marketing",
            value: marketing,
        });
    }

    TokenomicsView {
        total_supply: value("total_supply").unwrap_or(standard.total_supply),
        stats,
        distribution: fields
            .get("tokenomics.distribution")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

fn roadmap(fields: &BTreeMap<String, Value>) -> Vec<Phase> {
    let entries = fields
        .get("roadmap")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let phases: Vec<Vec<String>> = if entries.iter().all(Value::is_array) {
        entries.iter().filter_map(string_list).collect()
    } else {
        string_list(&Value::Array(entries)).into_iter().collect()
    };

    let phases: Vec<Vec<String>> = phases.into_iter().filter(|p| !p.is_empty()).collect();
    if phases.is_empty() {
        return vec![Phase {
            title: "Phase 1".to_owned(),
            items: STANDARD_ROADMAP.iter().map(|s| (*s).to_owned()).collect(),
        }];
    }

    phases
        .into_iter()
        .enumerate()
        .map(|(i, items)| Phase {
            title: format!("Phase {}", i + 1),
            items,
        })
        .collect()
}

fn extras(kind: TemplateKind, symbol: &str) -> Value {
    match kind {
        TemplateKind::Memecoin => Value::Null,
        TemplateKind::Nft => json!({
            "nft_count": 10000,
            "mint_price": "0.08 ETH",
            "max_mint": 10
        }),
        TemplateKind::Defi => json!({
            "tvl": "$10,000,000",
            "annual_yield": "Up to 120% APY",
            "pools": [
                { "name": format!("{symbol} Flexible"), "apy": "40%", "lockup": "None" },
                { "name": format!("{symbol} 3-Month"), "apy": "80%", "lockup": "3 months" },
                { "name": format!("{symbol} 6-Month"), "apy": "120%", "lockup": "6 months" }
            ]
        }),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::dialogue::FieldMap;

    fn renderer() -> SiteRenderer {
        SiteRenderer::new(&Catalog::builtin()).unwrap()
    }

    #[test]
    fn test_renders_from_empty_defaults() {
        let mut rng = StdRng::seed_from_u64(11);
        for kind in TemplateKind::ALL {
            let site = renderer()
                .render(kind, &FieldMap::defaults().flatten(), &mut rng)
                .unwrap();
            assert!(!site.title.is_empty());
            assert!(site.html.contains("<h2>Roadmap</h2>"));
            assert!(site.html.contains("Launch Website"));
            assert!(site.html.contains("1,000,000,000,000"));
        }
    }

    #[test]
    fn test_renders_collected_fields() {
        let mut fields = FieldMap::defaults();
        fields.set("coin_name", "MoonElonDoge").unwrap();
        fields.set("formatted_name", "Moon Elon Doge").unwrap();
        fields.set("symbol", "MED").unwrap();
        fields.set("colors.primary", "#0F0F29").unwrap();
        fields.set("social_links.telegram", "https://t.me/med").unwrap();
        fields.set("tokenomics.buy_tax", "5%").unwrap();
        fields
            .set("roadmap", json!([["Launch", "Website"], ["Listing"]]))
            .unwrap();

        let site = renderer()
            .render(TemplateKind::Memecoin, &fields.flatten(), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(site.title, "Moon Elon Doge");
        assert!(site.html.contains("--primary: #0F0F29"));
        assert!(site.html.contains("t.me"));
        assert!(site.html.contains(">Telegram</a>"));
        assert!(site.html.contains("Buy Tax"));
        assert!(site.html.contains("Phase 2"));
    }

    #[test]
    fn test_hidden_tokenomics_section() {
        let mut fields = FieldMap::defaults();
        fields.set("show_tokenomics", false).unwrap();
        let site = renderer()
            .render(TemplateKind::Defi, &fields.flatten(), &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert!(!site.html.contains("id=\"tokenomics\""));
        assert!(site.html.contains("Staking Pools"));
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut fields = FieldMap::defaults();
        fields.set("slogan", "<script>alert(1)</script>").unwrap();
        let site = renderer()
            .render(TemplateKind::Nft, &fields.flatten(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert!(!site.html.contains("<script>alert(1)</script>"));
    }
}
