use crate::config::{ScreenConfig, UpcraftConfig};
use crate::conversation::Conversation;
use crate::llm::LlmProvider;
use crate::runner::TurnRunner;
use crate::screen::{ScreenIntent, ScreenResolver};
use crate::sync::SyncClient;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use upcraft_core::{ActionResult, UpcraftResult};
use upcraft_skills::{ActionRegistry, RemoteSkill};

/// What [`Agent::act_on_screen`] did with one screen payload.
#[derive(Debug, Clone)]
pub struct ScreenOutcome {
    pub intent: ScreenIntent,
    /// Result of the dispatched click; `None` for NOOP intents.
    pub result: Option<ActionResult>,
}

/// Runtime shell wiring the registry, the screen resolver, and skill sync.
///
/// The registry is populated by the composition root before the agent is
/// built; the agent never registers anything itself.
pub struct Agent {
    registry: Arc<ActionRegistry>,
    resolver: ScreenResolver,
    screen: ScreenConfig,
    config: UpcraftConfig,
    sync: Option<SyncClient>,
    remote_skills: RwLock<Vec<RemoteSkill>>,
    last_screen: Mutex<Option<String>>,
}

impl Agent {
    /// Builds an agent with the built-in label rule and, when enabled, a sync client.
    pub fn new(registry: Arc<ActionRegistry>, config: UpcraftConfig) -> UpcraftResult<Self> {
        let sync = if config.sync.enabled {
            Some(SyncClient::new(&config.sync)?)
        } else {
            None
        };
        Ok(Self {
            registry,
            resolver: ScreenResolver::with_label(config.screen.target_label.clone()),
            screen: config.screen.clone(),
            config,
            sync,
            remote_skills: RwLock::new(Vec::new()),
            last_screen: Mutex::new(None),
        })
    }

    /// Replaces the screen resolver.
    pub fn with_resolver(mut self, resolver: ScreenResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    pub fn sync_client(&self) -> Option<&SyncClient> {
        self.sync.as_ref()
    }

    /// Pulls the remote skill list. An unreachable service is not fatal:
    /// the agent keeps whatever it had and reports zero.
    pub async fn start(&self) -> usize {
        info!(actions = self.registry.len(), "UpCraft agent starting");

        let Some(sync) = &self.sync else {
            return 0;
        };
        match sync.fetch_skills().await {
            Ok(skills) => {
                let count = skills.len();
                *self.remote_skills.write() = skills;
                info!(count, "Synced skills from sync service");
                count
            }
            Err(e) => {
                warn!(error = %e, "Could not sync skills; using cached defaults");
                0
            }
        }
    }

    /// Skill records fetched by the last successful [`Self::start`].
    pub fn remote_skills(&self) -> Vec<RemoteSkill> {
        self.remote_skills.read().clone()
    }

    /// String-in, string-out entry used by UI bridges.
    pub fn handle_screen_input(&self, input: &str) -> String {
        *self.last_screen.lock() = Some(input.to_string());
        self.resolver.resolve_str(input).to_json()
    }

    /// The most recent payload passed to a screen entry point.
    pub fn last_screen(&self) -> Option<String> {
        self.last_screen.lock().clone()
    }

    /// Resolves `input` and dispatches a CLICK to the configured click action.
    pub async fn act_on_screen(&self, input: &str, cancel: CancellationToken) -> ScreenOutcome {
        *self.last_screen.lock() = Some(input.to_string());
        let intent = self.resolver.resolve_str(input);

        let result = match intent.to_request(&self.screen.click_skill, &self.screen.click_action) {
            Some(request) => {
                let request = request
                    .with_cancel(cancel)
                    .with_deadline(self.config.agent.dispatch_timeout());
                Some(self.registry.execute(request).await)
            }
            None => None,
        };
        ScreenOutcome { intent, result }
    }

    /// A turn runner over this agent's registry.
    pub fn runner(&self, provider: Arc<dyn LlmProvider>) -> TurnRunner {
        TurnRunner::new(provider, self.registry.clone(), &self.config.agent)
    }

    /// A conversation seeded with the configured system prompt.
    pub fn conversation(&self) -> Conversation {
        let mut conversation = Conversation::new();
        if let Some(prompt) = &self.config.agent.system_prompt {
            conversation.set_system_prompt(prompt.clone());
        }
        conversation
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.config.agent.dispatch_timeout()
    }
}
