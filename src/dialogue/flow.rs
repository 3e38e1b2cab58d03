//! Input handling for every dialogue state.
//!
//! The guided form, the edit menu and the quick flow all funnel through here,
//! so each field is validated and stored in exactly one place.

use std::fmt::Write as _;

use rand::Rng;
use serde_json::{Value, json};
use tracing::debug;

use super::controller::edit_group_names;
use super::validators::{
    COLOR_KEYS, derive_symbol, format_name, is_skip, normalize_domain, normalize_url,
    parse_colors, parse_custom_social, parse_distribution, parse_roadmap, parse_sections,
    parse_tax, tax_field_path, validate_supply,
};
use super::{DialogueController, DialogueError, InputError, State};
use crate::config::{Catalog, Palette};
use crate::content::{random_name, random_roadmap, random_slogan, random_tokenomics};
use crate::intent::{SiteIntent, derive_social_link};
use crate::publish::HostingMethod;

/// The result of one accepted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State after the input was applied.
    pub state: State,
    /// Acknowledgement shown before the next prompt.
    pub note: Option<String>,
}

impl Step {
    fn new(state: State, note: impl Into<String>) -> Self {
        Self {
            state,
            note: Some(note.into()),
        }
    }

    const fn silent(state: State) -> Self {
        Self { state, note: None }
    }
}

/// URL prompts, each with its accumulator path, label and successor.
const SOCIAL_STATES: [(State, &str, &str, State); 5] = [
    (State::AwaitingTelegram, "social_links.telegram", "Telegram", State::AwaitingTwitter),
    (State::AwaitingTwitter, "social_links.twitter", "Twitter", State::AwaitingDiscord),
    (State::AwaitingDiscord, "social_links.discord", "Discord", State::AwaitingMedium),
    (State::AwaitingMedium, "social_links.medium", "Medium", State::AwaitingGithub),
    (State::AwaitingGithub, "social_links.github", "GitHub", State::AwaitingCustomSocial),
];

const CONFIRM_WORDS: [&str; 6] = ["confirm", "yes", "y", "ok", "generate", "done"];

impl DialogueController {
    /// Applies one line of user input to the current state.
    ///
    /// Validation failures leave the state and fields untouched.
    pub fn handle_text(&mut self, text: &str, catalog: &Catalog) -> Result<Step, DialogueError> {
        let input = text.trim();
        let state = self.current_state();
        debug!("Handling input in {}", state);

        if let Some(&(_, path, label, next)) =
            SOCIAL_STATES.iter().find(|(s, ..)| *s == state)
        {
            return self.store_url(input, path, label, next);
        }

        match state {
            State::AwaitingTemplate => self.choose_template(input, catalog),
            State::AwaitingName => self.set_name(input),
            State::AwaitingSlogan => {
                self.store_text(input, "slogan", "Slogan", State::AwaitingDescription)
            }
            State::AwaitingDescription => {
                self.store_text(input, "description", "Description", State::AwaitingLogo)
            }
            State::AwaitingLogo => {
                if is_skip(input) {
                    self.update_field("logo_url", Value::Null)?;
                    self.advance(State::AwaitingTheme)?;
                    return Ok(self.step("Logo skipped, a symbol badge will be used."));
                }
                match normalize_url(input)? {
                    Some(url) => self.accept_logo(&url),
                    None => Err(InputError::Empty.into()),
                }
            }
            State::AwaitingTheme => self.choose_theme(input, catalog),
            State::AwaitingColorScheme => self.set_colors(input),
            State::AwaitingCustomSocial => self.add_custom_social(input),
            State::AwaitingSupply => self.set_supply(input),
            State::AwaitingTaxInfo => self.set_taxes(input),
            State::AwaitingDistribution => self.set_distribution(input),
            State::AwaitingRoadmap => self.set_roadmap(input),
            State::AwaitingSectionsOrder => self.set_sections(input),
            State::AwaitingConfirmation => self.confirm(input),
            State::AwaitingEditChoice => {
                if matches!(input.to_ascii_lowercase().as_str(), "back" | "cancel") {
                    self.transition_to(State::AwaitingConfirmation)?;
                    return Ok(Step::silent(self.current_state()));
                }
                self.begin_edit(input)?;
                Ok(Step::silent(self.current_state()))
            }
            State::AwaitingHostingChoice => self.choose_hosting(input),
            State::AwaitingDomain => self.set_domain(input),
            _ => Err(DialogueError::InvalidState {
                state,
                action: "text input",
            }),
        }
    }

    /// Stores an uploaded or linked logo and moves on to the theme.
    pub fn accept_logo(&mut self, url: &str) -> Result<Step, DialogueError> {
        let state = self.current_state();
        if state != State::AwaitingLogo {
            return Err(DialogueError::InvalidState {
                state,
                action: "logo upload",
            });
        }
        self.update_field("logo_url", url)?;
        self.advance(State::AwaitingTheme)?;
        Ok(self.step("Logo saved."))
    }

    /// Fills every field from a free-text intent and jumps to `Ready`.
    pub fn apply_intent<R: Rng + ?Sized>(
        &mut self,
        intent: &SiteIntent,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Result<Step, DialogueError> {
        self.reset();
        self.transition_to(State::AwaitingTemplate)?;

        let kind = intent.template;
        self.update_field("template_id", kind.as_str())?;

        let raw_name = intent
            .name
            .clone()
            .unwrap_or_else(|| random_name(kind, rng));
        let name = format_name(&raw_name);
        self.update_field("coin_name", raw_name.as_str())?;
        self.update_field("formatted_name", name.as_str())?;
        self.update_field("symbol", derive_symbol(&raw_name))?;
        self.update_field("slogan", random_slogan(rng))?;

        let theme_id = intent.theme.as_deref().unwrap_or_else(|| kind.default_theme());
        let (theme_id, colors) = match catalog.theme(theme_id) {
            Some(theme) => (theme.id.clone(), theme.colors.clone()),
            None => (
                "custom".to_owned(),
                template_palette(catalog, kind.as_str()),
            ),
        };
        self.update_field("theme", theme_id.as_str())?;
        self.set_palette(&colors)?;

        let wanted = [
            (intent.telegram, "social_links.telegram", "https://t.me/"),
            (intent.twitter, "social_links.twitter", "https://twitter.com/"),
            (intent.discord, "social_links.discord", "https://discord.gg/"),
        ];
        for (_, path, base) in wanted.into_iter().filter(|(on, ..)| *on) {
            self.update_field(path, derive_social_link(base, &name))?;
        }

        self.update_field("show_tokenomics", intent.show_tokenomics)?;
        let tokenomics = random_tokenomics(rng);
        self.update_field("tokenomics.total_supply", tokenomics.total_supply)?;
        self.update_field("tokenomics.burn", tokenomics.burn)?;
        self.update_field("tokenomics.redistribution", tokenomics.redistribution)?;
        self.update_field("tokenomics.liquidity", tokenomics.liquidity)?;
        self.update_field("tokenomics.marketing", tokenomics.marketing)?;
        self.update_field("roadmap", json!(random_roadmap(rng)))?;

        self.transition_to(State::Ready)?;
        Ok(Step::new(
            State::Ready,
            format!("Building a {kind} site for {name} with the {theme_id} theme."),
        ))
    }

    /// Human readable overview of the collected fields.
    #[must_use]
    pub fn summary(&self) -> String {
        let fields = self.fields();
        let show = |path: &str| fields.get_str(path).unwrap_or("(default)").to_owned();

        let mut out = String::from("Website summary\n");
        let _ = writeln!(out, "State: {}", self.current_state());
        let _ = writeln!(out, "Template: {}", show("template_id"));
        let _ = writeln!(out, "Name: {} ({})", show("formatted_name"), show("symbol"));
        let _ = writeln!(out, "Slogan: {}", show("slogan"));
        let _ = writeln!(out, "Description: {}", show("description"));
        let _ = writeln!(out, "Logo: {}", show("logo_url"));
        let _ = writeln!(
            out,
            "Theme: {} ({}, {}, {})",
            show("theme"),
            show("colors.primary"),
            show("colors.secondary"),
            show("colors.accent")
        );

        for (_, path, label, _) in SOCIAL_STATES {
            if let Some(url) = fields.get_str(path) {
                let _ = writeln!(out, "{label}: {url}");
            }
        }
        if let Some(custom) = fields.get("social_links.custom").and_then(Value::as_array) {
            for entry in custom {
                let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
                let url = entry.get("url").and_then(Value::as_str).unwrap_or_default();
                let _ = writeln!(out, "{name}: {url}");
            }
        }

        let _ = writeln!(out, "Supply: {}", show("tokenomics.total_supply"));
        let taxes: Vec<String> = super::validators::TAX_KEYS
            .iter()
            .filter_map(|key| {
                fields
                    .get_str(&tax_field_path(key))
                    .map(|value| format!("{key} {value}"))
            })
            .collect();
        if !taxes.is_empty() {
            let _ = writeln!(out, "Taxes: {}", taxes.join(", "));
        }
        if let Some(phases) = fields
            .get("roadmap")
            .and_then(Value::as_array)
            .filter(|phases| !phases.is_empty())
        {
            let _ = writeln!(out, "Roadmap: {} phase(s)", phases.len());
        }
        if let Some(order) = fields.get("sections_order").and_then(Value::as_array) {
            let names: Vec<&str> = order.iter().filter_map(Value::as_str).collect();
            let _ = writeln!(out, "Sections: {}", names.join(", "));
        }
        let _ = write!(out, "Hosting: {}", show("hosting.method"));
        if let Some(domain) = fields.get_str("hosting.custom_domain") {
            let _ = write!(out, " ({domain})");
        }
        out
    }

    fn step(&self, note: impl Into<String>) -> Step {
        Step::new(self.current_state(), note)
    }

    fn store_text(
        &mut self,
        input: &str,
        path: &str,
        label: &str,
        next: State,
    ) -> Result<Step, DialogueError> {
        if input.is_empty() {
            return Err(InputError::Empty.into());
        }
        if is_skip(input) {
            self.update_field(path, Value::Null)?;
            self.advance(next)?;
            return Ok(self.step(format!("{label} skipped.")));
        }
        self.update_field(path, input)?;
        self.advance(next)?;
        Ok(self.step(format!("{label} saved.")))
    }

    fn store_url(
        &mut self,
        input: &str,
        path: &str,
        label: &str,
        next: State,
    ) -> Result<Step, DialogueError> {
        let url = normalize_url(input)?;
        let note = match &url {
            Some(url) => format!("{label} link set to {url}"),
            None => format!("{label} skipped."),
        };
        self.update_field(path, url)?;
        self.advance(next)?;
        Ok(self.step(note))
    }

    fn choose_template(&mut self, input: &str, catalog: &Catalog) -> Result<Step, DialogueError> {
        let template = pick_by_id_or_number(input, &catalog.templates, |t| &t.id)
            .ok_or_else(|| InputError::UnknownOption {
                field: "template",
                input: input.to_owned(),
                options: catalog.template_ids(),
            })?;
        let note = format!("Template selected: {}", template.name);
        self.update_field("template_id", template.id.as_str())?;
        self.advance(State::AwaitingName)?;
        Ok(self.step(note))
    }

    fn set_name(&mut self, input: &str) -> Result<Step, DialogueError> {
        if input.is_empty() || is_skip(input) {
            return Err(InputError::Empty.into());
        }
        let name = format_name(input);
        let symbol = derive_symbol(input);
        self.update_field("coin_name", input)?;
        self.update_field("formatted_name", name.as_str())?;
        self.update_field("symbol", symbol.as_str())?;
        self.advance(State::AwaitingSlogan)?;
        Ok(self.step(format!("Name set to {name} (${symbol})")))
    }

    fn choose_theme(&mut self, input: &str, catalog: &Catalog) -> Result<Step, DialogueError> {
        if input.eq_ignore_ascii_case("custom") {
            let template_id = self.fields().get_str("template_id").unwrap_or("memecoin").to_owned();
            let palette = template_palette(catalog, &template_id);
            self.update_field("theme", "custom")?;
            self.set_palette(&palette)?;
            self.extend_edit(State::AwaitingColorScheme);
            self.advance(State::AwaitingColorScheme)?;
            return Ok(self.step("Custom theme: starting from the template colors."));
        }

        let theme = pick_by_id_or_number(input, &catalog.themes, |t| &t.id).ok_or_else(|| {
            InputError::UnknownOption {
                field: "theme",
                input: input.to_owned(),
                options: format!("{}, custom", catalog.theme_ids()),
            }
        })?;
        let (id, name, colors) = (theme.id.clone(), theme.name.clone(), theme.colors.clone());
        self.update_field("theme", id.as_str())?;
        self.set_palette(&colors)?;
        self.advance(State::AwaitingTelegram)?;
        Ok(self.step(format!("Theme selected: {name}")))
    }

    fn set_palette(&mut self, palette: &Palette) -> Result<(), DialogueError> {
        self.update_field("colors.primary", palette.primary.as_str())?;
        self.update_field("colors.secondary", palette.secondary.as_str())?;
        self.update_field("colors.accent", palette.accent.as_str())?;
        Ok(())
    }

    fn set_colors(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingTelegram)?;
            return Ok(self.step("Keeping the theme colors."));
        }
        let colors = parse_colors(input)?;
        for key in COLOR_KEYS {
            if let Some(value) = colors.get(key) {
                self.update_field(&format!("colors.{key}"), value.as_str())?;
            }
        }
        self.advance(State::AwaitingTelegram)?;
        Ok(self.step("Colors updated."))
    }

    fn add_custom_social(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingSupply)?;
            return Ok(self.step("No custom link added."));
        }
        let (name, url) = parse_custom_social(input)?;
        let note = format!("Added {name}: {url}");
        self.push_field("social_links.custom", json!({ "name": name, "url": url }))?;
        self.advance(State::AwaitingSupply)?;
        Ok(self.step(note))
    }

    fn set_supply(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingTaxInfo)?;
            return Ok(self.step("Using the default supply."));
        }
        let supply = validate_supply(input)?;
        let note = format!("Total supply set to {supply}");
        self.update_field("tokenomics.total_supply", supply)?;
        self.advance(State::AwaitingTaxInfo)?;
        Ok(self.step(note))
    }

    fn set_taxes(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingDistribution)?;
            return Ok(self.step("Using the default taxes."));
        }
        let taxes = parse_tax(input)?;
        for (key, value) in &taxes {
            self.update_field(&tax_field_path(key), value.as_str())?;
        }
        self.advance(State::AwaitingDistribution)?;
        Ok(self.step(format!("Saved {} tax value(s).", taxes.len())))
    }

    fn set_distribution(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingRoadmap)?;
            return Ok(self.step("Using the default distribution."));
        }
        let shares = parse_distribution(input)?;
        let note = format!("Saved {} distribution share(s).", shares.len());
        self.update_field("tokenomics.distribution", Value::Array(shares))?;
        self.advance(State::AwaitingRoadmap)?;
        Ok(self.step(note))
    }

    fn set_roadmap(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingSectionsOrder)?;
            return Ok(self.step("Using the standard roadmap."));
        }
        let phases = parse_roadmap(input)?;
        let note = format!("Saved a roadmap with {} phase(s).", phases.len());
        self.update_field("roadmap", json!(phases))?;
        self.advance(State::AwaitingSectionsOrder)?;
        Ok(self.step(note))
    }

    fn set_sections(&mut self, input: &str) -> Result<Step, DialogueError> {
        if is_skip(input) {
            self.advance(State::AwaitingConfirmation)?;
            return Ok(self.step(self.summary()));
        }
        let sections = parse_sections(input)?;
        self.update_field("sections_order", json!(sections))?;
        self.advance(State::AwaitingConfirmation)?;
        Ok(self.step(self.summary()))
    }

    fn confirm(&mut self, input: &str) -> Result<Step, DialogueError> {
        let lower = input.to_ascii_lowercase();
        if CONFIRM_WORDS.contains(&lower.as_str()) {
            self.advance(State::Ready)?;
            return Ok(Step::silent(self.current_state()));
        }
        if lower == "edit" {
            self.transition_to(State::AwaitingEditChoice)?;
            return Ok(Step::silent(self.current_state()));
        }
        if let Some(field) = lower.strip_prefix("edit ") {
            self.begin_edit(field)?;
            return Ok(Step::silent(self.current_state()));
        }
        Err(InputError::UnknownOption {
            field: "reply",
            input: input.to_owned(),
            options: format!("confirm, edit, edit <{}>", edit_group_names().replace(", ", "|")),
        }
        .into())
    }

    fn choose_hosting(&mut self, input: &str) -> Result<Step, DialogueError> {
        let method: HostingMethod = input.parse().map_err(|_| InputError::UnknownOption {
            field: "hosting method",
            input: input.to_owned(),
            options: "local, github".to_owned(),
        })?;
        self.update_field("hosting.method", method.as_str())?;
        let note = format!("Hosting set to {method}.");
        match method {
            HostingMethod::Github => self.advance(State::AwaitingDomain)?,
            HostingMethod::Local => {
                self.update_field("hosting.custom_domain", Value::Null)?;
                self.advance(State::AwaitingConfirmation)?
            }
        };
        Ok(self.step(note))
    }

    fn set_domain(&mut self, input: &str) -> Result<Step, DialogueError> {
        let domain = if is_skip(input) {
            None
        } else {
            Some(normalize_domain(input)?)
        };
        let note = domain
            .as_ref()
            .map_or_else(|| "No custom domain.".to_owned(), |d| format!("Custom domain set to {d}"));
        self.update_field("hosting.custom_domain", domain)?;
        self.advance(State::AwaitingConfirmation)?;
        Ok(self.step(note))
    }
}

/// Finds an entry by case-insensitive id or by its 1-based position.
fn pick_by_id_or_number<'a, T>(
    input: &str,
    items: &'a [T],
    id: impl Fn(&T) -> &String,
) -> Option<&'a T> {
    let input = input.trim();
    items
        .iter()
        .find(|item| id(*item).eq_ignore_ascii_case(input))
        .or_else(|| {
            input
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| items.get(i))
        })
}

fn template_palette(catalog: &Catalog, template_id: &str) -> Palette {
    catalog
        .template(template_id)
        .or_else(|| catalog.templates.first())
        .map_or_else(
            || Palette::new("#FF6B6B", "#4ECDC4", "#FFE66D"),
            |t| t.default_colors.clone(),
        )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::{TemplateKind, TransitionPolicy};
    use crate::publish::HostingUrls;

    fn controller() -> DialogueController {
        DialogueController::new(TransitionPolicy::Strict)
    }

    fn feed(controller: &mut DialogueController, inputs: &[&str]) {
        let catalog = Catalog::builtin();
        for input in inputs {
            controller
                .handle_text(input, &catalog)
                .unwrap_or_else(|e| panic!("input {input:?} failed: {e}"));
        }
    }

    fn started() -> DialogueController {
        let mut controller = controller();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        controller
    }

    #[test]
    fn test_full_form_to_generation() {
        let mut controller = started();
        feed(
            &mut controller,
            &[
                "memecoin", "MoonElonDoge", "skip", "skip", "skip", "neon", "skip", "skip",
                "skip", "skip", "skip", "skip", "skip", "skip", "skip", "skip", "skip",
            ],
        );
        assert_eq!(controller.current_state(), State::AwaitingConfirmation);
        assert_eq!(controller.fields().get_str("formatted_name"), Some("Moon Elon Doge"));
        assert_eq!(controller.fields().get_str("symbol"), Some("MED"));
        assert_eq!(controller.fields().get_str("colors.primary"), Some("#0F0F29"));

        feed(&mut controller, &["confirm"]);
        assert_eq!(controller.current_state(), State::Ready);

        let request = controller.begin_generation("ab12cd34ef").unwrap();
        assert_eq!(request.kind, TemplateKind::Memecoin);
        controller
            .complete_generation(&HostingUrls {
                download_url: "http://localhost:5000/sites/ab12cd34ef.html".to_owned(),
                preview_url: "http://localhost:5000/sites/ab12cd34ef.html".to_owned(),
                repo_url: None,
            })
            .unwrap();
        assert_eq!(controller.current_state(), State::Completed);
        assert_eq!(controller.fields().get_str("site_hash"), Some("ab12cd34ef"));
    }

    #[test]
    fn test_url_inputs_normalized() {
        let mut controller = started();
        feed(&mut controller, &["nft", "Apes", "skip", "skip", "skip", "dark"]);
        assert_eq!(controller.current_state(), State::AwaitingTelegram);
        feed(&mut controller, &["t.me/foo", "https://twitter.com/foo"]);
        assert_eq!(
            controller.fields().get_str("social_links.telegram"),
            Some("https://t.me/foo")
        );
        assert_eq!(
            controller.fields().get_str("social_links.twitter"),
            Some("https://twitter.com/foo")
        );
    }

    #[test]
    fn test_bad_tax_keeps_state() {
        let mut controller = controller();
        controller.transition_to(State::AwaitingTemplate).unwrap();
        controller.transition_to(State::Ready).unwrap();
        controller.transition_to(State::AwaitingConfirmation).unwrap();
        controller.begin_edit("tokenomics").unwrap();
        feed(&mut controller, &["1,000,000"]);
        assert_eq!(controller.current_state(), State::AwaitingTaxInfo);

        let err = controller.handle_text("buy-5", &Catalog::builtin()).unwrap_err();
        assert!(matches!(err, DialogueError::Input(InputError::Malformed { .. })));
        assert_eq!(controller.current_state(), State::AwaitingTaxInfo);

        feed(&mut controller, &["buy:5%,sell:7"]);
        assert_eq!(controller.fields().get_str("tokenomics.buy_tax"), Some("5%"));
        assert_eq!(controller.fields().get_str("tokenomics.sell_tax"), Some("7%"));
        assert_eq!(controller.current_state(), State::AwaitingDistribution);

        feed(&mut controller, &["skip"]);
        assert_eq!(controller.current_state(), State::AwaitingConfirmation);
    }

    #[test]
    fn test_unknown_template_rejected() {
        let mut controller = started();
        let err = controller.handle_text("casino", &Catalog::builtin()).unwrap_err();
        assert!(err.to_string().contains("memecoin, nft, defi"));
        assert_eq!(controller.current_state(), State::AwaitingTemplate);

        feed(&mut controller, &["3"]);
        assert_eq!(controller.fields().get_str("template_id"), Some("defi"));
    }

    #[test]
    fn test_custom_theme_goes_through_colors() {
        let mut controller = started();
        feed(
            &mut controller,
            &["memecoin", "Pepe", "skip", "skip", "skip", "custom"],
        );
        assert_eq!(controller.current_state(), State::AwaitingColorScheme);
        feed(&mut controller, &["accent:#abc"]);
        assert_eq!(controller.current_state(), State::AwaitingTelegram);
        assert_eq!(controller.fields().get_str("colors.accent"), Some("#ABC"));
        assert_eq!(controller.fields().get_str("colors.primary"), Some("#FF6B6B"));
    }

    #[test]
    fn test_edit_hosting_with_domain() {
        let mut controller = started();
        controller.transition_to(State::Ready).unwrap();
        controller.transition_to(State::AwaitingConfirmation).unwrap();
        feed(&mut controller, &["edit", "hosting", "github", "https://MyCoin.com/"]);
        assert_eq!(controller.current_state(), State::AwaitingConfirmation);
        assert_eq!(controller.fields().get_str("hosting.method"), Some("github"));
        assert_eq!(controller.fields().get_str("hosting.custom_domain"), Some("mycoin.com"));
    }

    #[test]
    fn test_edit_theme_to_custom_asks_for_colors() {
        let mut controller = started();
        feed(&mut controller, &["memecoin", "Pepe", "skip", "skip", "skip", "neon"]);
        controller.transition_to(State::Ready).unwrap();
        controller.transition_to(State::AwaitingConfirmation).unwrap();

        feed(&mut controller, &["edit theme", "custom"]);
        assert_eq!(controller.current_state(), State::AwaitingColorScheme);
        feed(&mut controller, &["primary:#000000"]);
        assert_eq!(controller.current_state(), State::AwaitingConfirmation);
        assert_eq!(controller.fields().get_str("colors.primary"), Some("#000000"));
        assert!(!controller.is_editing());
    }

    #[test]
    fn test_text_rejected_outside_input_states() {
        let mut controller = controller();
        assert!(matches!(
            controller.handle_text("hello", &Catalog::builtin()),
            Err(DialogueError::InvalidState {
                state: State::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_accept_logo_only_when_asked() {
        let mut controller = started();
        assert!(controller.accept_logo("http://x/logo.png").is_err());
        feed(&mut controller, &["memecoin", "Pepe", "skip", "skip"]);
        controller.accept_logo("http://x/logo.png").unwrap();
        assert_eq!(controller.current_state(), State::AwaitingTheme);
        assert_eq!(controller.fields().get_str("logo_url"), Some("http://x/logo.png"));
    }

    #[test]
    fn test_apply_intent_fills_fields() {
        let mut controller = controller();
        let intent = SiteIntent {
            template: TemplateKind::Defi,
            name: Some("YieldMax".to_owned()),
            theme: None,
            telegram: true,
            twitter: false,
            discord: false,
            show_tokenomics: false,
        };
        let step = controller
            .apply_intent(&intent, &Catalog::builtin(), &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(step.state, State::Ready);
        let fields = controller.fields();
        assert_eq!(fields.get_str("template_id"), Some("defi"));
        assert_eq!(fields.get_str("formatted_name"), Some("Yield Max"));
        assert_eq!(fields.get_str("theme"), Some("dark"));
        assert_eq!(fields.get_str("social_links.telegram"), Some("https://t.me/yieldmax"));
        assert!(fields.get("social_links.twitter").is_none());
        assert_eq!(fields.get("show_tokenomics"), Some(&Value::Bool(false)));
        assert!(fields.is_present("tokenomics.total_supply"));
    }

    #[test]
    fn test_summary_lists_fields() {
        let mut controller = started();
        feed(&mut controller, &["memecoin", "MoonElonDoge"]);
        let summary = controller.summary();
        assert!(summary.contains("Name: Moon Elon Doge (MED)"));
        assert!(summary.contains("Hosting: local"));
    }
}
