//! Chat command types and definitions.

use std::fmt;

/// Available chat commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Begin building a new site.
    Start,

    /// Show help information.
    Help,

    /// Drop the current dialogue and return to idle.
    Reset,

    /// Show the collected fields and the current step.
    Status,

    /// List the available templates.
    Templates,

    /// List the available themes.
    Themes,

    /// Open the edit menu, or jump straight to one field group.
    Edit(Option<String>),

    /// Run generation again after a failure.
    Retry,

    /// Show the links of the last generated site.
    Share,

    /// Build a site in one go from a free-text request.
    Quick(String),
}

impl ChatCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the message is not a valid command.
    #[must_use]
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let text = text.trim();

        let after_prefix = text.strip_prefix(prefix)?.trim_start();

        let (cmd, args) = match after_prefix.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd.to_lowercase(), Some(args.trim())),
            None => (after_prefix.to_lowercase(), None),
        };
        let args = args.filter(|a| !a.is_empty());

        match cmd.as_str() {
            "start" | "new" => Some(Self::Start),
            "help" | "h" | "?" => Some(Self::Help),
            "reset" | "restart" | "cancel" => Some(Self::Reset),
            "status" | "summary" => Some(Self::Status),
            "templates" => Some(Self::Templates),
            "themes" => Some(Self::Themes),
            "edit" => Some(Self::Edit(args.map(str::to_owned))),
            "retry" => Some(Self::Retry),
            "share" | "link" => Some(Self::Share),
            "quick" | "ai" | "auto" => args.map(|a| Self::Quick(a.to_owned())),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Reset => "reset",
            Self::Status => "status",
            Self::Templates => "templates",
            Self::Themes => "themes",
            Self::Edit(_) => "edit",
            Self::Retry => "retry",
            Self::Share => "share",
            Self::Quick(_) => "quick",
        }
    }

    /// Returns all available commands with their aliases and descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("start", "(new)", "Start building a new website"),
            ("quick <request>", "(ai, auto)", "Build a site from a description, e.g. 'meme coin called DogeX'"),
            ("status", "(summary)", "Show what has been collected so far"),
            ("edit [field]", "", "Change a field before generating"),
            ("templates", "", "List available templates"),
            ("themes", "", "List available themes"),
            ("retry", "", "Try generating again after an error"),
            ("share", "(link)", "Show the links of your generated site"),
            ("reset", "(restart, cancel)", "Start over"),
            ("help", "(h, ?)", "Show this help message"),
        ]
    }
}

impl fmt::Display for ChatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit(Some(field)) => write!(f, "edit {field}"),
            Self::Quick(text) => write!(f, "quick {text}"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// A response to one incoming message.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Whether the input was accepted.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,

    /// Public link worth sharing, set after a site is published.
    pub link: Option<String>,
}

impl Reply {
    /// Creates a successful reply.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            link: None,
        }
    }

    /// Creates a successful reply carrying a shareable link.
    #[must_use]
    pub fn with_link(message: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            link: Some(link.into()),
        }
    }

    /// Creates an error reply.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/";

    #[test]
    fn test_parse_start_aliases() {
        assert_eq!(ChatCommand::parse("/start", PREFIX), Some(ChatCommand::Start));
        assert_eq!(ChatCommand::parse("/new", PREFIX), Some(ChatCommand::Start));
    }

    #[test]
    fn test_parse_reset_aliases() {
        for text in ["/reset", "/restart", "/cancel"] {
            assert_eq!(ChatCommand::parse(text, PREFIX), Some(ChatCommand::Reset));
        }
    }

    #[test]
    fn test_parse_edit_with_and_without_field() {
        assert_eq!(ChatCommand::parse("/edit", PREFIX), Some(ChatCommand::Edit(None)));
        assert_eq!(
            ChatCommand::parse("/edit  colors ", PREFIX),
            Some(ChatCommand::Edit(Some("colors".to_owned())))
        );
    }

    #[test]
    fn test_parse_quick_requires_text() {
        assert_eq!(ChatCommand::parse("/quick", PREFIX), None);
        assert_eq!(
            ChatCommand::parse("/ai meme coin called DogeX", PREFIX),
            Some(ChatCommand::Quick("meme coin called DogeX".to_owned()))
        );
    }

    #[test]
    fn test_parse_wrong_prefix() {
        assert_eq!(ChatCommand::parse("start", PREFIX), None);
        assert_eq!(ChatCommand::parse("!start", PREFIX), None);
        assert_eq!(ChatCommand::parse("!start", "!"), Some(ChatCommand::Start));
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(ChatCommand::parse("/SHARE", PREFIX), Some(ChatCommand::Share));
        assert_eq!(ChatCommand::parse("/Status", PREFIX), Some(ChatCommand::Status));
    }

    #[test]
    fn test_parse_with_extra_whitespace() {
        assert_eq!(ChatCommand::parse("  /  help  ", PREFIX), Some(ChatCommand::Help));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(ChatCommand::parse("/launch", PREFIX), None);
    }
}
