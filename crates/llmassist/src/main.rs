use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use llmassist_common::{logger, AppConfig};
use llmassist_llm::{HealthCache, HealthReport, LlmPlugin, LlmPluginClient, Message, QuickFeedback};
use llmassist_widget::{
    dashboard, ButtonState, ClickOutcome, DashboardSummary, EventTrackingSrc, GenAiButton,
    Generation, HistoryPanel, LlmStream, StreamOptions, ERROR_TOOLTIP, FEEDBACK_ERROR_MESSAGE,
    NEED_PANEL_CONTEXT_MESSAGE,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    match find_project_root().map(|root| root.join(".env")) {
        Some(env_path) if env_path.exists() => {
            dotenv::from_path(&env_path).ok();
        }
        _ => {
            dotenv::dotenv().ok();
        }
    }
}

#[derive(Parser)]
#[command(name = "llmassist")]
#[command(about = "llmassist - AI-assisted content generation through an LLM plugin", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Overrides {
    /// Dashboard server base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model class (base or large)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Generation timeout in milliseconds (max 60000)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether the LLM plugin is enabled
    Health,

    /// Generate text from system/user prompts
    Generate {
        /// System message (repeatable, sent first)
        #[arg(long, required = true)]
        system: Vec<String>,

        /// User message (repeatable)
        #[arg(long)]
        user: Vec<String>,

        #[command(flatten)]
        revisions: RevisionArgs,
    },

    /// Suggest a title for a dashboard JSON model
    Title {
        dashboard: PathBuf,

        #[command(flatten)]
        revisions: RevisionArgs,
    },

    /// Suggest a description for a dashboard JSON model
    Description {
        dashboard: PathBuf,

        #[command(flatten)]
        revisions: RevisionArgs,
    },
}

#[derive(Args, Default)]
struct RevisionArgs {
    /// Canned revision applied after the first reply (shorter, more-descriptive, regenerate)
    #[arg(long)]
    quick: Vec<QuickFeedback>,

    /// Free-text revision applied after the quick ones
    #[arg(long)]
    feedback: Vec<String>,
}

impl Overrides {
    /// Push CLI overrides into the environment read by `AppConfig::from_env`
    fn apply(&self) {
        if let Some(base_url) = &self.base_url {
            std::env::set_var("LLMASSIST_BASE_URL", base_url);
        }
        if let Some(model) = &self.model {
            std::env::set_var("LLMASSIST_MODEL", model);
        }
        if let Some(temperature) = self.temperature {
            std::env::set_var("LLMASSIST_TEMPERATURE", temperature.to_string());
        }
        if let Some(timeout_ms) = self.timeout_ms {
            std::env::set_var("LLMASSIST_TIMEOUT_MS", timeout_ms.to_string());
        }
        if let Some(level) = &self.log_level {
            std::env::set_var("LLMASSIST_LOG_LEVEL", level);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env early so CLI overrides win over it
    load_dotenv_from_project_root();
    cli.overrides.apply();

    let config = AppConfig::from_env()?;
    if let Err(e) = logger::init(&config) {
        // Unwritable log directory: keep going with console output only
        logger::setup_console_logging(&config.log_level)?;
        warn!("File logging disabled: {}", e);
    }

    info!("llmassist starting: {} ({})", config.base_url, config.plugin_id);

    let client = Arc::new(LlmPluginClient::new(&config)?);
    let health = Arc::new(HealthCache::new());

    match cli.command {
        Commands::Health => {
            let (enabled, report) = check_health(&health, client.as_ref()).await;
            println!("enabled: {}", enabled);
            if let Some(provider) = report.and_then(|r| r.details).and_then(|d| d.llm_provider) {
                println!("provider configured: {}", provider.configured);
                if let Some(error) = provider.error {
                    println!("provider error: {}", error);
                }
            }
        }
        Commands::Generate {
            system,
            user,
            revisions,
        } => {
            let messages = system
                .into_iter()
                .map(Message::system)
                .chain(user.into_iter().map(Message::user))
                .collect();
            let stream = LlmStream::new(client, health, StreamOptions::from_config(&config)?);
            let text = run(stream, messages, EventTrackingSrc::Unknown, None, revisions).await?;
            print_final(text);
        }
        Commands::Title {
            dashboard: path,
            revisions,
        } => {
            let summary = load_dashboard(&path)?;
            let stream = LlmStream::new(client, health, StreamOptions::from_config(&config)?);
            let blocker = (!summary.has_panel_context()).then_some(NEED_PANEL_CONTEXT_MESSAGE);
            let messages = dashboard::dashboard_title_messages(&summary);
            let text = run(stream, messages, EventTrackingSrc::DashboardTitle, blocker, revisions).await?;
            print_final(text);
        }
        Commands::Description {
            dashboard: path,
            revisions,
        } => {
            let summary = load_dashboard(&path)?;
            let stream = LlmStream::new(client, health, StreamOptions::from_config(&config)?);
            let blocker = (!summary.has_panel_context()).then_some(NEED_PANEL_CONTEXT_MESSAGE);
            let messages = dashboard::dashboard_description_messages(&summary);
            let text =
                run(stream, messages, EventTrackingSrc::DashboardDescription, blocker, revisions).await?;
            print_final(text);
        }
    }

    Ok(())
}

/// Check through the cache; details are fetched only once the plugin is enabled
///
/// Health check failures count as disabled rather than failing the command.
async fn check_health(cache: &HealthCache, plugin: &dyn LlmPlugin) -> (bool, Option<HealthReport>) {
    if !cache.is_enabled(plugin).await {
        return (false, None);
    }
    match plugin.health().await {
        Ok(report) => (true, Some(report)),
        Err(e) => {
            warn!("Could not fetch health details: {}", e);
            (true, None)
        }
    }
}

/// stdout carries the final text only
fn print_final(text: Option<String>) {
    if let Some(text) = text {
        println!("{}", text);
    }
}

fn load_dashboard(path: &Path) -> Result<DashboardSummary> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dashboard {}", path.display()))?;
    let model: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse dashboard {}", path.display()))?;
    Ok(DashboardSummary::from_json(&model)?)
}

/// Drive a button through one generation and the requested revisions
///
/// Returns the final text: the first reply, or the last revision once applied.
/// `None` when the plugin is disabled or generation was stopped.
async fn run(
    stream: LlmStream,
    messages: Vec<Message>,
    src: EventTrackingSrc,
    blocker: Option<&str>,
    revisions: RevisionArgs,
) -> Result<Option<String>> {
    let mut builder = GenAiButton::builder(stream, move || messages.clone()).event_source(src);
    if let Some(reason) = blocker {
        builder = builder.disabled(true).tooltip(reason);
    }
    let button = builder.mount().await;

    let Some(view) = button.render() else {
        eprintln!("The LLM plugin is not enabled; nothing to do.");
        return Ok(None);
    };
    if view.disabled {
        bail!("{}", view.tooltip.unwrap_or_default());
    }

    eprintln!("Generating...");
    if !matches!(button.click(), ClickOutcome::Started) {
        bail!("Generation could not be started");
    }

    match wait_settled(&button).await? {
        ButtonState::HasHistory => {}
        ButtonState::Errored { message } => bail!("{} ({})", ERROR_TOOLTIP, message),
        ButtonState::Hidden => {
            eprintln!("The LLM plugin was disabled during generation.");
            return Ok(None);
        }
        ButtonState::Idle | ButtonState::Generating => {
            eprintln!("Generation stopped.");
            return Ok(None);
        }
    }

    let feedback: Vec<Revision> = revisions
        .quick
        .into_iter()
        .map(Revision::Quick)
        .chain(revisions.feedback.into_iter().map(Revision::Text))
        .collect();
    if feedback.is_empty() {
        return Ok(button.history().into_iter().next());
    }

    let ClickOutcome::OpenedHistory(panel) = button.click() else {
        bail!("History panel did not open");
    };
    for revision in feedback {
        eprintln!("Revising: {}", revision);
        match revise(&panel, &revision).await {
            Generation::Completed(reply) => eprintln!("  -> {}", reply),
            Generation::Failed(error) => bail!("{} ({})", FEEDBACK_ERROR_MESSAGE, error),
            Generation::Stopped => {
                eprintln!("Revision stopped.");
                break;
            }
            other => bail!("Revision was not run: {:?}", other),
        }
    }

    Ok(panel.apply())
}

enum Revision {
    Quick(QuickFeedback),
    Text(String),
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Quick(kind) => write!(f, "{}", kind),
            Revision::Text(text) => f.write_str(text),
        }
    }
}

async fn revise(panel: &HistoryPanel, revision: &Revision) -> Generation {
    let run = async {
        match revision {
            Revision::Quick(kind) => panel.quick_feedback(*kind).await,
            Revision::Text(text) => panel.submit_feedback(text).await,
        }
    };
    tokio::pin!(run);

    tokio::select! {
        outcome = &mut run => outcome,
        _ = tokio::signal::ctrl_c() => {
            panel.stop_generation();
            run.await
        }
    }
}

/// Wait for the button to leave `Generating`; Ctrl-C clicks it (stop)
async fn wait_settled(button: &GenAiButton) -> Result<ButtonState> {
    let mut rx = button.subscribe();
    tokio::select! {
        state = rx.wait_for(|s| *s != ButtonState::Generating) => Ok(state?.clone()),
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping generation");
            button.click();
            Ok(button.state())
        }
    }
}
