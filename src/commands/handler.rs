//! Conversation handler: routes each message to a command or the dialogue.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::types::{ChatCommand, Reply};
use crate::config::Catalog;
use crate::dialogue::{DialogueError, State, Step, edit_group_names};
use crate::intent::IntentMatcher;
use crate::publish::{LogoStore, SiteGenerator, new_artifact_id};
use crate::sessions::{SessionRegistry, UserId};

/// Ties sessions, the dialogue, logo uploads and generation together.
pub struct ConversationHandler {
    /// Command prefix (e.g., "/").
    prefix: String,

    catalog: Arc<Catalog>,
    sessions: Arc<SessionRegistry>,
    generator: Arc<SiteGenerator>,
    logos: LogoStore,
    matcher: Box<dyn IntentMatcher>,
}

impl ConversationHandler {
    #[must_use]
    pub fn new(
        prefix: String,
        catalog: Arc<Catalog>,
        sessions: Arc<SessionRegistry>,
        generator: Arc<SiteGenerator>,
        logos: LogoStore,
        matcher: Box<dyn IntentMatcher>,
    ) -> Self {
        Self {
            prefix,
            catalog,
            sessions,
            generator,
            logos,
            matcher,
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handles one text message from `user`.
    pub async fn handle_text(&self, user: UserId, text: &str) -> Reply {
        debug!("User {} sent: {}", user, truncate(text, 40));

        if let Some(command) = ChatCommand::parse(text, &self.prefix) {
            debug!("Handling command: {}", command);
            let reply = self.execute(user, command).await;
            info!("Command result: success={}", reply.success);
            return reply;
        }
        if text.trim_start().starts_with(&self.prefix) {
            return Reply::error(format!(
                "Unknown command. Send {}help to see what I can do.",
                self.prefix
            ));
        }

        let catalog = Arc::clone(&self.catalog);
        let outcome = self
            .sessions
            .with_session(user, |session| {
                let controller = &mut session.controller;
                if controller.current_state() == State::Ready {
                    return Ok(Step {
                        state: State::Ready,
                        note: None,
                    });
                }
                controller
                    .handle_text(text, &catalog)
                    .map_err(|e| (e, controller.current_state()))
            })
            .await;

        match outcome {
            Ok(step) if step.state == State::Ready => self.generate(user, step.note).await,
            Ok(step) => Reply::success(self.compose(step.note.as_deref(), step.state)),
            Err((e, state)) => self.reject(&e, state),
        }
    }

    /// Handles an uploaded logo image from `user`.
    pub async fn handle_logo(&self, user: UserId, bytes: &[u8]) -> Reply {
        let state = self
            .sessions
            .with_session(user, |session| session.controller.current_state())
            .await;
        if state != State::AwaitingLogo {
            return Reply::error(format!(
                "I'm not expecting a logo right now. {}",
                self.prompt_for(state)
            ));
        }

        let url = match self.logos.ingest(user, bytes).await {
            Ok(url) => url,
            Err(e) => {
                warn!("Rejected logo from user {}: {}", user, e);
                return Reply::error(format!("❌ {e}\n\n{}", self.prompt_for(state)));
            }
        };

        let outcome = self
            .sessions
            .with_session(user, |session| {
                session
                    .controller
                    .accept_logo(&url)
                    .map_err(|e| (e, session.controller.current_state()))
            })
            .await;
        match outcome {
            Ok(step) => Reply::success(self.compose(step.note.as_deref(), step.state)),
            Err((e, state)) => self.reject(&e, state),
        }
    }

    async fn execute(&self, user: UserId, command: ChatCommand) -> Reply {
        match command {
            ChatCommand::Start => self.handle_start(user).await,
            ChatCommand::Help => self.handle_help(),
            ChatCommand::Reset => self.handle_reset(user).await,
            ChatCommand::Status => self.handle_status(user).await,
            ChatCommand::Templates => Reply::success(self.template_list()),
            ChatCommand::Themes => Reply::success(self.theme_list()),
            ChatCommand::Edit(field) => self.handle_edit(user, field.as_deref()).await,
            ChatCommand::Retry => self.handle_retry(user).await,
            ChatCommand::Share => self.handle_share(user).await,
            ChatCommand::Quick(text) => self.handle_quick(user, &text).await,
        }
    }

    async fn handle_start(&self, user: UserId) -> Reply {
        let outcome = self
            .sessions
            .with_session(user, |session| {
                let controller = &mut session.controller;
                if controller.current_state() == State::Generating {
                    return Err(generation_busy());
                }
                controller.reset();
                controller.transition_to(State::AwaitingTemplate)?;
                Ok(controller.current_state())
            })
            .await;

        match outcome {
            Ok(state) => Reply::success(self.prompt_for(state)),
            Err(e) => Reply::error(e.to_string()),
        }
    }

    fn handle_help(&self) -> Reply {
        let mut lines = vec!["Available commands:".to_owned()];
        for (usage, aliases, description) in ChatCommand::all_commands() {
            let aliases = if aliases.is_empty() {
                String::new()
            } else {
                format!(" {aliases}")
            };
            lines.push(format!("  {}{usage}{aliases} - {description}", self.prefix));
        }
        lines.push(String::new());
        lines.push("While building, type 'skip' to leave an optional field empty.".to_owned());
        Reply::success(lines.join("\n"))
    }

    async fn handle_reset(&self, user: UserId) -> Reply {
        let outcome = self
            .sessions
            .with_session(user, |session| {
                if session.controller.current_state() == State::Generating {
                    return Err(generation_busy());
                }
                session.controller.reset();
                Ok(())
            })
            .await;

        match outcome {
            Ok(()) => Reply::success(format!("Session reset. {}", State::Idle.prompt())),
            Err(e) => Reply::error(e.to_string()),
        }
    }

    async fn handle_status(&self, user: UserId) -> Reply {
        let Some(controller) = self.sessions.snapshot(user).await else {
            return Reply::success(State::Idle.prompt());
        };
        let mut message = controller.summary();
        if let Some(last_error) = controller.last_error() {
            let _ = write!(message, "\nLast error: {last_error}");
        }
        let _ = write!(message, "\n\n{}", self.prompt_for(controller.current_state()));
        Reply::success(message)
    }

    async fn handle_edit(&self, user: UserId, field: Option<&str>) -> Reply {
        let outcome = self
            .sessions
            .with_session(user, |session| {
                let controller = &mut session.controller;
                match field {
                    Some(field) => controller.begin_edit(field),
                    None if controller.current_state() == State::AwaitingConfirmation => controller
                        .transition_to(State::AwaitingEditChoice)
                        .map(|_| State::AwaitingEditChoice),
                    None if controller.current_state() == State::AwaitingEditChoice => {
                        Ok(State::AwaitingEditChoice)
                    }
                    None => Err(DialogueError::InvalidState {
                        state: controller.current_state(),
                        action: "edit",
                    }),
                }
                .map_err(|e| (e, controller.current_state()))
            })
            .await;

        match outcome {
            Ok(state) => Reply::success(self.prompt_for(state)),
            Err((DialogueError::InvalidState { .. }, _)) => Reply::error(
                "You can edit fields once the form is filled in. Reply 'edit' on the summary screen.",
            ),
            Err((e, state)) => self.reject(&e, state),
        }
    }

    async fn handle_retry(&self, user: UserId) -> Reply {
        let outcome = self
            .sessions
            .with_session(user, |session| session.controller.retry())
            .await;
        match outcome {
            Ok(_) => self.generate(user, Some("Retrying generation...".to_owned())).await,
            Err(e) => Reply::error(format!("Nothing to retry: {e}")),
        }
    }

    async fn handle_share(&self, user: UserId) -> Reply {
        let Some(controller) = self.sessions.snapshot(user).await else {
            return Reply::error("You haven't generated a site yet. Send /start to begin.");
        };
        let fields = controller.fields();

        let record = match fields.get_str("site_hash") {
            Some(id) => self.generator.artifacts().get(id).await,
            None => None,
        };
        if let Some(record) = record {
            let urls = &record.hosting_urls;
            let mut message = format!(
                "Share your {} site:\nPreview: {}\nDownload: {}",
                record.template_kind, urls.preview_url, urls.download_url
            );
            if let Some(repo) = &urls.repo_url {
                let _ = write!(message, "\nRepository: {repo}");
            }
            return Reply::with_link(message, urls.preview_url.clone());
        }

        match fields.get_str("urls.preview_url") {
            Some(preview) => Reply::with_link(format!("Share your site: {preview}"), preview),
            None => Reply::error("You haven't generated a site yet. Send /start to begin."),
        }
    }

    async fn handle_quick(&self, user: UserId, text: &str) -> Reply {
        let intent = self.matcher.analyze(text);
        debug!("Quick request from user {} parsed as {:?}", user, intent);

        let catalog = Arc::clone(&self.catalog);
        let outcome = self
            .sessions
            .with_session(user, |session| {
                if session.controller.current_state() == State::Generating {
                    return Err(generation_busy());
                }
                session
                    .controller
                    .apply_intent(&intent, &catalog, &mut rand::thread_rng())
            })
            .await;

        match outcome {
            Ok(step) => self.generate(user, step.note).await,
            Err(e) => Reply::error(e.to_string()),
        }
    }

    /// Renders and publishes the site of `user`, outside the session lock.
    async fn generate(&self, user: UserId, note: Option<String>) -> Reply {
        let begun = self
            .sessions
            .with_session(user, |session| {
                let fields = session.controller.fields();
                // A retry keeps the id of the failed run so hosts can reuse its resources.
                let id = fields.get_str("site_hash").map_or_else(
                    || {
                        let seed = fields.get_str("coin_name").unwrap_or("site");
                        new_artifact_id(seed, &mut rand::thread_rng())
                    },
                    str::to_owned,
                );
                session.controller.begin_generation(&id)
            })
            .await;
        let request = match begun {
            Ok(request) => request,
            Err(e) => return Reply::error(e.to_string()),
        };

        info!("Generating site {} for user {}", request.artifact_id, user);
        let outcome = self.generator.generate(&request).await;

        let recorded = self
            .sessions
            .with_session(user, |session| match &outcome {
                Ok(record) => session.controller.complete_generation(&record.hosting_urls),
                Err(e) => session.controller.fail_generation(&e.to_string()),
            })
            .await;
        if let Err(e) = recorded {
            error!("Failed to record generation result for user {}: {}", user, e);
        }

        let mut message = note.map(|n| format!("{n}\n\n")).unwrap_or_default();
        match outcome {
            Ok(record) => {
                let urls = &record.hosting_urls;
                let _ = write!(
                    message,
                    "✅ Your website is live!\nPreview: {}\nDownload: {}",
                    urls.preview_url, urls.download_url
                );
                if let Some(repo) = &urls.repo_url {
                    let _ = write!(message, "\nRepository: {repo}");
                }
                let _ = write!(message, "\n\n{}", State::Completed.prompt());
                Reply::with_link(message, urls.preview_url.clone())
            }
            Err(e) => {
                let _ = write!(message, "❌ Generation failed: {e}\n\n{}", State::Error.prompt());
                Reply::error(message)
            }
        }
    }

    fn reject(&self, error: &DialogueError, state: State) -> Reply {
        let message = match error {
            DialogueError::Input(e) => format!("❌ {e}\n\n{}", self.prompt_for(state)),
            DialogueError::UnknownEditField(_) => {
                format!("❌ {error}. Choose one of: {}", edit_group_names())
            }
            _ => format!("{error}. {}", self.prompt_for(state)),
        };
        Reply::error(message)
    }

    fn compose(&self, note: Option<&str>, state: State) -> String {
        match note {
            Some(note) => format!("{note}\n\n{}", self.prompt_for(state)),
            None => self.prompt_for(state),
        }
    }

    /// The prompt for `state`, with the available options where there are any.
    fn prompt_for(&self, state: State) -> String {
        match state {
            State::AwaitingTemplate => format!("{}\n{}", state.prompt(), self.template_list()),
            State::AwaitingTheme => format!(
                "{}\n{}\n  custom - pick your own colors",
                state.prompt(),
                self.theme_list()
            ),
            _ => state.prompt().to_owned(),
        }
    }

    fn template_list(&self) -> String {
        let mut lines = vec!["Templates:".to_owned()];
        for (i, template) in self.catalog.templates.iter().enumerate() {
            lines.push(format!(
                "  {}. {} - {} ({})",
                i + 1,
                template.id,
                template.name,
                truncate(&template.description, 60)
            ));
        }
        lines.join("\n")
    }

    fn theme_list(&self) -> String {
        let mut lines = vec!["Themes:".to_owned()];
        for (i, theme) in self.catalog.themes.iter().enumerate() {
            lines.push(format!("  {}. {} - {}", i + 1, theme.id, theme.name));
        }
        lines.join("\n")
    }
}

impl std::fmt::Debug for ConversationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationHandler")
            .field("prefix", &self.prefix)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

const fn generation_busy() -> DialogueError {
    DialogueError::InvalidState {
        state: State::Generating,
        action: "this command",
    }
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::TransitionPolicy;
    use crate::intent::KeywordMatcher;
    use crate::publish::{ArtifactStore, LocalPublisher, RetryPolicy, SiteRenderer};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct Fixture {
        handler: ConversationHandler,
        sessions: Arc<SessionRegistry>,
        dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::builtin());
        let sessions = Arc::new(SessionRegistry::new(
            Duration::from_secs(60),
            TransitionPolicy::Strict,
        ));
        let generator = Arc::new(SiteGenerator::new(
            SiteRenderer::new(&catalog).unwrap(),
            LocalPublisher::new(dir.path().join("sites"), "http://localhost:5000"),
            None,
            RetryPolicy::none(),
            Arc::new(ArtifactStore::new(Duration::from_secs(60))),
        ));
        let logos = LogoStore::new(dir.path().join("uploads"), "http://localhost:5000", 1024);
        let handler = ConversationHandler::new(
            "/".to_owned(),
            catalog,
            Arc::clone(&sessions),
            generator,
            logos,
            Box::new(KeywordMatcher::new().unwrap()),
        );
        Fixture {
            handler,
            sessions,
            dir,
        }
    }

    async fn send_all(handler: &ConversationHandler, inputs: &[&str]) -> Reply {
        let mut last = Reply::error("no input");
        for input in inputs {
            last = handler.handle_text(1, input).await;
            assert!(last.success, "input {input:?} was rejected: {}", last.message);
        }
        last
    }

    async fn state_of(fixture: &Fixture) -> State {
        fixture.sessions.snapshot(1).await.unwrap().current_state()
    }

    #[tokio::test]
    async fn test_full_conversation_publishes_site() {
        let fixture = fixture();
        let handler = &fixture.handler;

        let reply = send_all(handler, &["/start"]).await;
        assert!(reply.message.contains("memecoin"));

        send_all(handler, &["memecoin", "MoonElonDoge", "skip", "skip", "skip"]).await;
        let reply = send_all(handler, &["neon"]).await;
        assert!(reply.message.contains("Telegram"));

        let reply = send_all(handler, &["skip"; 11]).await;
        assert!(reply.message.contains("Name: Moon Elon Doge (MED)"));
        assert_eq!(state_of(&fixture).await, State::AwaitingConfirmation);

        let reply = send_all(handler, &["confirm"]).await;
        let link = reply.link.unwrap();
        assert!(link.starts_with("http://localhost:5000/sites/"));

        let controller = fixture.sessions.snapshot(1).await.unwrap();
        assert_eq!(controller.current_state(), State::Completed);
        let hash = controller.fields().get_str("site_hash").unwrap();
        assert!(fixture.dir.path().join("sites").join(format!("{hash}.html")).exists());

        let share = handler.handle_text(1, "/share").await;
        assert_eq!(share.link.as_deref(), Some(link.as_str()));
    }

    #[tokio::test]
    async fn test_invalid_input_keeps_state() {
        let fixture = fixture();
        send_all(&fixture.handler, &["/start"]).await;

        let reply = fixture.handler.handle_text(1, "casino").await;
        assert!(!reply.success);
        assert!(reply.message.contains("Unknown template"));
        assert_eq!(state_of(&fixture).await, State::AwaitingTemplate);
    }

    #[tokio::test]
    async fn test_text_before_start_is_rejected() {
        let fixture = fixture();
        let reply = fixture.handler.handle_text(1, "hello").await;
        assert!(!reply.success);
        assert!(reply.message.contains("/start"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let fixture = fixture();
        let reply = fixture.handler.handle_text(1, "/launch").await;
        assert!(!reply.success);
        assert!(reply.message.contains("/help"));
    }

    #[tokio::test]
    async fn test_quick_request_generates_site() {
        let fixture = fixture();
        let reply = fixture
            .handler
            .handle_text(1, "/quick nft collection called Pixel Apes with telegram")
            .await;
        assert!(reply.success, "{}", reply.message);
        assert!(reply.link.is_some());

        let controller = fixture.sessions.snapshot(1).await.unwrap();
        assert_eq!(controller.current_state(), State::Completed);
        assert_eq!(controller.fields().get_str("template_id"), Some("nft"));
    }

    #[tokio::test]
    async fn test_failed_generation_recovers_with_retry() {
        let fixture = fixture();
        let sites = fixture.dir.path().join("sites");
        std::fs::write(&sites, b"not a directory").unwrap();

        let reply = fixture.handler.handle_text(1, "/quick meme coin called DogeX").await;
        assert!(!reply.success);
        assert!(reply.message.contains("Generation failed"), "{}", reply.message);

        let failed = fixture.sessions.snapshot(1).await.unwrap();
        assert_eq!(failed.current_state(), State::Error);
        assert!(failed.last_error().is_some());
        assert_eq!(failed.fields().get_str("coin_name"), Some("DogeX"));
        let hash = failed.fields().get_str("site_hash").unwrap().to_owned();

        std::fs::remove_file(&sites).unwrap();
        let reply = fixture.handler.handle_text(1, "/retry").await;
        assert!(reply.success, "{}", reply.message);
        assert!(reply.link.is_some());

        let done = fixture.sessions.snapshot(1).await.unwrap();
        assert_eq!(done.current_state(), State::Completed);
        assert_eq!(done.fields().get_str("site_hash"), Some(hash.as_str()));
        assert!(sites.join(format!("{hash}.html")).exists());
    }

    #[tokio::test]
    async fn test_logo_upload() {
        let fixture = fixture();
        let early = fixture.handler.handle_logo(1, PNG).await;
        assert!(!early.success);

        send_all(&fixture.handler, &["/start", "defi", "YieldMax", "skip", "skip"]).await;
        let reply = fixture.handler.handle_logo(1, PNG).await;
        assert!(reply.success, "{}", reply.message);
        assert_eq!(state_of(&fixture).await, State::AwaitingTheme);

        let logo = fixture.sessions.snapshot(1).await.unwrap();
        assert!(
            logo.fields()
                .get_str("logo_url")
                .unwrap()
                .starts_with("http://localhost:5000/uploads/1_")
        );
    }

    #[tokio::test]
    async fn test_edit_and_retry_commands() {
        let fixture = fixture();
        let reply = fixture.handler.handle_text(1, "/edit").await;
        assert!(!reply.success);

        let reply = fixture.handler.handle_text(1, "/retry").await;
        assert!(!reply.success);
        assert!(reply.message.starts_with("Nothing to retry"));
    }

    #[tokio::test]
    async fn test_reset_and_status() {
        let fixture = fixture();
        send_all(&fixture.handler, &["/start", "memecoin", "MoonElonDoge"]).await;

        let status = fixture.handler.handle_text(1, "/status").await;
        assert!(status.message.contains("Moon Elon Doge"));

        send_all(&fixture.handler, &["/reset"]).await;
        assert_eq!(state_of(&fixture).await, State::Idle);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello, World!", 5), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }
}
