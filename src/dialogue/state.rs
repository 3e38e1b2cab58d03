//! Dialogue states, the transition table, and per-state prompts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the customization dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Idle,
    AwaitingTemplate,
    AwaitingName,
    AwaitingSlogan,
    AwaitingDescription,
    AwaitingLogo,
    AwaitingTheme,
    AwaitingColorScheme,
    AwaitingTelegram,
    AwaitingTwitter,
    AwaitingDiscord,
    AwaitingMedium,
    AwaitingGithub,
    AwaitingCustomSocial,
    AwaitingSupply,
    AwaitingTaxInfo,
    AwaitingDistribution,
    AwaitingRoadmap,
    AwaitingSectionsOrder,
    AwaitingConfirmation,
    AwaitingEditChoice,
    AwaitingHostingChoice,
    AwaitingDomain,
    Ready,
    Generating,
    Completed,
    Error,
    Timeout,
}

use State::{
    AwaitingColorScheme, AwaitingConfirmation, AwaitingCustomSocial, AwaitingDescription,
    AwaitingDiscord, AwaitingDistribution, AwaitingDomain, AwaitingEditChoice, AwaitingGithub,
    AwaitingHostingChoice, AwaitingLogo, AwaitingMedium, AwaitingName, AwaitingRoadmap,
    AwaitingSectionsOrder, AwaitingSlogan, AwaitingSupply, AwaitingTaxInfo, AwaitingTelegram,
    AwaitingTemplate, AwaitingTheme, AwaitingTwitter, Completed, Error, Generating, Idle, Ready,
    Timeout,
};

/// States that may be entered from any other state.
///
/// The quick flow fills fields in bulk and then jumps straight to generation,
/// skipping every intermediate prompt.
pub const FORCE_STATES: [State; 3] = [AwaitingTemplate, Ready, Generating];

impl State {
    /// Every state, in dialogue order.
    pub const ALL: [Self; 28] = [
        Idle,
        AwaitingTemplate,
        AwaitingName,
        AwaitingSlogan,
        AwaitingDescription,
        AwaitingLogo,
        AwaitingTheme,
        AwaitingColorScheme,
        AwaitingTelegram,
        AwaitingTwitter,
        AwaitingDiscord,
        AwaitingMedium,
        AwaitingGithub,
        AwaitingCustomSocial,
        AwaitingSupply,
        AwaitingTaxInfo,
        AwaitingDistribution,
        AwaitingRoadmap,
        AwaitingSectionsOrder,
        AwaitingConfirmation,
        AwaitingEditChoice,
        AwaitingHostingChoice,
        AwaitingDomain,
        Ready,
        Generating,
        Completed,
        Error,
        Timeout,
    ];

    /// Returns the snake_case name used in logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Idle => "idle",
            AwaitingTemplate => "awaiting_template",
            AwaitingName => "awaiting_name",
            AwaitingSlogan => "awaiting_slogan",
            AwaitingDescription => "awaiting_description",
            AwaitingLogo => "awaiting_logo",
            AwaitingTheme => "awaiting_theme",
            AwaitingColorScheme => "awaiting_color_scheme",
            AwaitingTelegram => "awaiting_telegram",
            AwaitingTwitter => "awaiting_twitter",
            AwaitingDiscord => "awaiting_discord",
            AwaitingMedium => "awaiting_medium",
            AwaitingGithub => "awaiting_github",
            AwaitingCustomSocial => "awaiting_custom_social",
            AwaitingSupply => "awaiting_supply",
            AwaitingTaxInfo => "awaiting_tax_info",
            AwaitingDistribution => "awaiting_distribution",
            AwaitingRoadmap => "awaiting_roadmap",
            AwaitingSectionsOrder => "awaiting_sections_order",
            AwaitingConfirmation => "awaiting_confirmation",
            AwaitingEditChoice => "awaiting_edit_choice",
            AwaitingHostingChoice => "awaiting_hosting_choice",
            AwaitingDomain => "awaiting_domain",
            Ready => "ready",
            Generating => "generating",
            Completed => "completed",
            Error => "error",
            Timeout => "timeout",
        }
    }

    /// Returns the ordered set of states this state may move to.
    #[must_use]
    pub const fn allowed_next(self) -> &'static [Self] {
        match self {
            Idle => &[AwaitingTemplate],
            AwaitingTemplate => &[AwaitingName],
            AwaitingName => &[
                AwaitingSlogan,
                AwaitingDescription,
                AwaitingLogo,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingSlogan => &[
                AwaitingDescription,
                AwaitingLogo,
                AwaitingTheme,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingDescription => &[
                AwaitingLogo,
                AwaitingTheme,
                AwaitingTelegram,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingLogo => &[
                AwaitingTheme,
                AwaitingColorScheme,
                AwaitingTelegram,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingTheme => &[
                AwaitingColorScheme,
                AwaitingTelegram,
                AwaitingTwitter,
                AwaitingDiscord,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingColorScheme => &[
                AwaitingTelegram,
                AwaitingTwitter,
                AwaitingDiscord,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingTelegram => &[
                AwaitingTwitter,
                AwaitingDiscord,
                AwaitingMedium,
                AwaitingSupply,
                Error,
            ],
            AwaitingTwitter => &[
                AwaitingDiscord,
                AwaitingMedium,
                AwaitingGithub,
                AwaitingSupply,
                Error,
            ],
            AwaitingDiscord => &[
                AwaitingMedium,
                AwaitingGithub,
                AwaitingCustomSocial,
                AwaitingSupply,
                Error,
            ],
            AwaitingMedium => &[AwaitingGithub, AwaitingCustomSocial, AwaitingSupply, Error],
            AwaitingGithub => &[AwaitingCustomSocial, AwaitingSupply, Error],
            AwaitingCustomSocial => &[AwaitingSupply, AwaitingTaxInfo, AwaitingConfirmation, Error],
            AwaitingSupply => &[AwaitingTaxInfo, AwaitingDistribution, AwaitingRoadmap, Error],
            AwaitingTaxInfo => &[AwaitingDistribution, AwaitingRoadmap, Error],
            AwaitingDistribution => &[
                AwaitingRoadmap,
                AwaitingSectionsOrder,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingRoadmap => &[AwaitingSectionsOrder, AwaitingConfirmation, Error],
            AwaitingSectionsOrder => &[AwaitingConfirmation, Error],
            AwaitingConfirmation => &[AwaitingEditChoice, Ready, Error],
            AwaitingEditChoice => &[
                AwaitingName,
                AwaitingSlogan,
                AwaitingDescription,
                AwaitingLogo,
                AwaitingTheme,
                AwaitingColorScheme,
                AwaitingTelegram,
                AwaitingTwitter,
                AwaitingDiscord,
                AwaitingMedium,
                AwaitingGithub,
                AwaitingCustomSocial,
                AwaitingSupply,
                AwaitingTaxInfo,
                AwaitingDistribution,
                AwaitingRoadmap,
                AwaitingSectionsOrder,
                AwaitingHostingChoice,
                AwaitingConfirmation,
                Error,
            ],
            AwaitingHostingChoice => &[AwaitingDomain, AwaitingConfirmation, Completed, Error],
            AwaitingDomain => &[AwaitingConfirmation, Completed, Error],
            Ready => &[Generating, AwaitingConfirmation, Error],
            Generating => &[AwaitingHostingChoice, Completed, Error],
            Completed | Error | Timeout => &[Idle],
        }
    }

    /// Whether this state may be entered from anywhere.
    #[must_use]
    pub fn is_forced(self) -> bool {
        FORCE_STATES.contains(&self)
    }

    /// Whether the dialogue has ended and only a restart leads on.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Completed | Error | Timeout)
    }

    /// Accumulator paths that must hold a value before leaving this state.
    ///
    /// Skippable prompts declare nothing; skipping stores null on purpose.
    #[must_use]
    pub const fn required_fields(self) -> &'static [&'static str] {
        match self {
            AwaitingTemplate => &["template_id"],
            AwaitingName => &["coin_name", "formatted_name", "symbol"],
            AwaitingTheme => &["theme", "colors.primary", "colors.secondary", "colors.accent"],
            AwaitingColorScheme => &["colors.primary", "colors.secondary", "colors.accent"],
            AwaitingHostingChoice => &["hosting.method"],
            _ => &[],
        }
    }

    /// The prompt shown to the user while in this state.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Idle => "Welcome to Sitecraft! Let's build your project website. Send /start to begin.",
            AwaitingTemplate => "Please select a template for your website:",
            AwaitingName => "What's the name of your coin or project?",
            AwaitingSlogan => {
                "Enter a catchy slogan for your project (or type 'skip' to use a random one):"
            }
            AwaitingDescription => {
                "Please provide a brief description of your project (or type 'skip'):"
            }
            AwaitingLogo => {
                "Please upload a logo image (or type 'skip' to use a generated symbol):"
            }
            AwaitingTheme => "Select a theme for your website:",
            AwaitingColorScheme => {
                "Enter custom colors as 'primary:#0F0F29,accent:#FF00FF' (or type 'skip' to keep the theme colors):"
            }
            AwaitingTelegram => "Enter your Telegram group link (or type 'skip'):",
            AwaitingTwitter => "Enter your Twitter profile link (or type 'skip'):",
            AwaitingDiscord => "Enter your Discord server link (or type 'skip'):",
            AwaitingMedium => "Enter your Medium profile link (or type 'skip'):",
            AwaitingGithub => "Enter your GitHub repository link (or type 'skip'):",
            AwaitingCustomSocial => {
                "Enter a custom social link as 'name:url' (or type 'skip'):"
            }
            AwaitingSupply => {
                "Enter the total supply for your token (or type 'skip' for a default value):"
            }
            AwaitingTaxInfo => {
                "Enter taxes as 'buy:5%,sell:7%' (or type 'skip' for default values):"
            }
            AwaitingDistribution => {
                "Enter token distribution as 'Team:10%,Marketing:20%' (or type 'skip' for default values):"
            }
            AwaitingRoadmap => {
                "Enter roadmap phases as 'Item1, Item2; Item3, Item4' (or type 'skip' for a generated roadmap):"
            }
            AwaitingSectionsOrder => {
                "Arrange the sections, separated by commas, e.g. 'header, about, tokenomics, roadmap, community' (or type 'skip'):"
            }
            AwaitingConfirmation => {
                "Please review your website information. Reply 'confirm' to continue or 'edit' to change something."
            }
            AwaitingEditChoice => {
                "Which field would you like to edit? (name, slogan, description, logo, theme, colors, socials, tokenomics, roadmap, sections, hosting)"
            }
            AwaitingHostingChoice => "How would you like to host your website? (local, github)",
            AwaitingDomain => "Enter a custom domain for your website (or type 'skip'):",
            Ready => "Ready to generate your website. Send any message to continue.",
            Generating => "Generating your website. Please wait...",
            Completed => {
                "Your website has been generated and is ready to view! Send /start to create another one."
            }
            Error => "An error occurred. Send /retry to try again or /reset to start over.",
            Timeout => "Your session has timed out. Please start over with /start.",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a move against the transition table.
///
/// Force states are always reachable.
#[must_use]
pub fn is_valid_transition(from: State, to: State) -> bool {
    to.is_forced() || from.allowed_next().contains(&to)
}

/// Pure prompt lookup for a state.
#[must_use]
pub const fn prompt_for_state(state: State) -> &'static str {
    state.prompt()
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;

    fn reachable_from_idle() -> HashSet<State> {
        let mut seen = HashSet::from([Idle]);
        let mut queue = VecDeque::from([Idle]);
        while let Some(state) = queue.pop_front() {
            for &next in state.allowed_next() {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    #[test]
    fn test_no_stranded_states() {
        for state in reachable_from_idle() {
            assert!(
                !state.allowed_next().is_empty(),
                "{state} has no outgoing transition"
            );
        }
    }

    #[test]
    fn test_terminal_states_route_to_idle() {
        for state in State::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(state.allowed_next().contains(&Idle), "{state} cannot return to idle");
        }
    }

    #[test]
    fn test_every_state_except_timeout_reachable() {
        let reachable = reachable_from_idle();
        for state in State::ALL {
            if state != Timeout {
                assert!(reachable.contains(&state), "{state} is unreachable");
            }
        }
    }

    #[test]
    fn test_table_only_names_known_states() {
        let all: HashSet<State> = State::ALL.into_iter().collect();
        for state in State::ALL {
            for next in state.allowed_next() {
                assert!(all.contains(next));
            }
        }
    }

    #[test]
    fn test_valid_transition_follows_table() {
        assert!(is_valid_transition(Idle, AwaitingTemplate));
        assert!(is_valid_transition(AwaitingName, AwaitingSlogan));
        assert!(!is_valid_transition(Idle, AwaitingName));
        assert!(!is_valid_transition(Completed, AwaitingName));
    }

    #[test]
    fn test_force_states_enterable_from_anywhere() {
        for from in State::ALL {
            for to in FORCE_STATES {
                assert!(is_valid_transition(from, to));
            }
        }
    }

    #[test]
    fn test_every_state_has_prompt() {
        for state in State::ALL {
            assert!(!prompt_for_state(state).is_empty());
        }
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for state in State::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }
}
