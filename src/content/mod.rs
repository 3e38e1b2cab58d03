//! Fallback content for fields the user left empty.

mod generators;

pub use generators::{
    STANDARD_ROADMAP, Tokenomics, emoji_set, random_name, random_roadmap, random_slogan,
    random_tokenomics,
};
