//! Random fallback content drawn from fixed vocabularies.
//!
//! Every generator takes the RNG as a parameter so callers (and tests) decide
//! where the randomness comes from.

use chrono::{Datelike, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::TemplateKind;

const SLOGAN_TEMPLATES: &[&str] = &[
    "To The Moon! 🚀",
    "The Next 1000x Gem 💎",
    "Community-Driven Revolution 🔥",
    "The Future of Decentralized Memes 🌐",
    "Join The Movement! 💪",
    "Bark at The Moon 🐕",
    "Better Than Bitcoin? Maybe! 👀",
    "Much Wow. Very Token. 🐕",
    "Not Just a Meme, a Movement 🚀",
    "The King of Meme Coins 👑",
    "Powered by Memes, Backed by Community 🤝",
    "From Zero to Moon in Record Time 🚀",
    "The Fastest Growing Token of {YEAR} 🏆",
    "Stealth Launch, Rocket Growth 🚀",
    "Built By The Community, For The Community 🤝",
    "Join {NUMBER}+ Holders Worldwide 🌍",
    "We're All Going to Make It 🚀",
    "Diamond Hands Only 💎🙌",
    "The Future of Finance is Fun 🎮",
    "Tomorrow's Currency, Today 📱",
    "Limited Supply, Unlimited Potential 🚀",
    "Early Birds Get The Gains 🐦",
    "The Hottest Token of {YEAR} 🔥",
];

const HOLDER_COUNTS: &[&str] = &[
    "10,000", "25,000", "50,000", "100,000", "250,000", "500,000", "1,000,000",
];

const SUPPLY_OPTIONS: &[&str] = &[
    "1,000,000,000",
    "10,000,000,000",
    "100,000,000,000",
    "1,000,000,000,000",
    "10,000,000,000,000",
    "100,000,000,000,000",
];

const MEME_SUPPLIES: &[&str] = &["420,690,000,000", "69,420,000,000,000", "1,337,000,000,000"];

const ROADMAP_PHASES: [&[&str]; 4] = [
    &[
        "Website Launch",
        "Social Media Creation",
        "Community Building",
        "Token Launch",
        "Initial Marketing Push",
        "CoinGecko Listing",
        "Whitepaper Release",
        "Smart Contract Audit",
    ],
    &[
        "1,000 Holders Milestone",
        "10,000 Holders Milestone",
        "Community Contests",
        "Influencer Marketing",
        "Merchandise Store",
        "Dashboard Launch",
        "Trending on Twitter",
    ],
    &[
        "50,000 Holders Milestone",
        "Major Exchange Listings",
        "Mobile App Development",
        "Global Marketing Campaign",
        "Staking Platform Launch",
        "Cross-Chain Expansion",
        "DAO Implementation",
    ],
    &[
        "1 Million Holders Milestone",
        "NFT Marketplace Integration",
        "Developer Grants Program",
        "Enterprise Partnerships",
        "Charitable Foundation",
        "Governance System",
    ],
];

const EMOJI_SETS: &[[&str; 5]] = &[
    ["🚀", "💎", "🔥", "💰", "🌙"],
    ["🐕", "🐶", "🦴", "🌭", "🐾"],
    ["🐱", "😺", "🐟", "🧶", "🐭"],
    ["🐸", "☕", "🍵", "🧠", "👑"],
    ["🦍", "🍌", "🦧", "🌴", "🥥"],
    ["👽", "🛸", "✨", "🌌", "🪐"],
    ["🤖", "⚙️", "🔋", "💻", "🔌"],
    ["🧙", "✨", "🔮", "📜", "⚡"],
];

const fn name_parts(kind: TemplateKind) -> (&'static [&'static str], &'static [&'static str]) {
    match kind {
        TemplateKind::Memecoin => (
            &["Moon", "Doge", "Shib", "Elon", "Pepe", "Floki", "Rocket", "Star", "Coin", "Token"],
            &["Moon", "Doge", "Coin", "Token", "Rocket", "Inu", "Star", "Cash", "Finance", "X"],
        ),
        TemplateKind::Nft => (
            &["Bored", "Crypto", "Pixel", "Punk", "Ape", "Dragon", "Cat", "Alien", "Robot", "Ghost"],
            &["Club", "Collection", "Gallery", "Art", "Space", "World", "Verse", "Labs", "Studio", "NFT"],
        ),
        TemplateKind::Defi => (
            &["Yield", "Stake", "Swap", "Farm", "Lend", "Pool", "Dao", "Safe", "Earn", "Vault"],
            &["Finance", "Protocol", "Network", "Exchange", "Hub", "DAO", "Capital", "Money", "Bank", "DeFi"],
        ),
    }
}

/// Token parameters shown in the tokenomics section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenomics {
    pub total_supply: String,
    pub burn: String,
    pub redistribution: String,
    pub liquidity: String,
    pub marketing: Option<String>,
}

impl Tokenomics {
    /// The fixed set used when the user skipped every tokenomics prompt.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            total_supply: "1,000,000,000,000".to_owned(),
            burn: "2%".to_owned(),
            redistribution: "2%".to_owned(),
            liquidity: "1%".to_owned(),
            marketing: Some("1%".to_owned()),
        }
    }
}

/// The launch plan used when no roadmap was entered.
pub const STANDARD_ROADMAP: [&str; 4] = [
    "Launch Website",
    "Create Social Media",
    "Token Launch",
    "CoinGecko Listing",
];

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Picks a slogan and fills its `{YEAR}` and `{NUMBER}` placeholders.
pub fn random_slogan<R: Rng + ?Sized>(rng: &mut R) -> String {
    let template = pick(SLOGAN_TEMPLATES, rng);
    template
        .replace("{YEAR}", &Utc::now().year().to_string())
        .replace("{NUMBER}", pick(HOLDER_COUNTS, rng))
}

/// Joins a kind-specific prefix and suffix, never repeating the same word.
pub fn random_name<R: Rng + ?Sized>(kind: TemplateKind, rng: &mut R) -> String {
    let (prefixes, suffixes) = name_parts(kind);
    let prefix = pick(prefixes, rng);
    let candidates: Vec<&str> = suffixes.iter().copied().filter(|s| *s != prefix).collect();
    format!("{prefix}{}", pick(&candidates, rng))
}

fn random_percent<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> String {
    format!("{:.1}%", rng.gen_range(low..high))
}

/// Random but plausible tokenomics. One draw in ten uses a meme supply.
pub fn random_tokenomics<R: Rng + ?Sized>(rng: &mut R) -> Tokenomics {
    let total_supply = if rng.gen_bool(0.1) {
        pick(MEME_SUPPLIES, rng)
    } else {
        pick(SUPPLY_OPTIONS, rng)
    };
    let burn = random_percent(rng, 1.0, 10.0);
    let redistribution = random_percent(rng, 1.0, 7.0);
    let liquidity = random_percent(rng, 2.0, 10.0);
    let marketing = rng.gen_bool(0.7).then(|| random_percent(rng, 1.0, 8.0));

    Tokenomics {
        total_supply: total_supply.to_owned(),
        burn,
        redistribution,
        liquidity,
        marketing,
    }
}

/// Four phases of three to five distinct items each.
pub fn random_roadmap<R: Rng + ?Sized>(rng: &mut R) -> Vec<Vec<String>> {
    ROADMAP_PHASES
        .iter()
        .map(|items| {
            let count = rng.gen_range(3..=5).min(items.len());
            items
                .choose_multiple(rng, count)
                .map(|item| (*item).to_owned())
                .collect()
        })
        .collect()
}

/// A themed set of five emoji for decoration.
pub fn emoji_set<R: Rng + ?Sized>(rng: &mut R) -> [&'static str; 5] {
    EMOJI_SETS.choose(rng).copied().unwrap_or(EMOJI_SETS[0])
}
