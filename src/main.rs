// This is the entry point of the screening console.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Read submissions from stdin and route them through the moderation gate
//
// Every line is treated as a chat message unless it starts with a command
// (see `print_help`).

use anyhow::{Context, Result};
use content_moderator::config::AppConfig;
use content_moderator::core::ai::{
    ChatMessage, ChatOutcome, GenerationConfig, GuardedChatService, TextGenerator,
};
use content_moderator::core::moderation::{
    ContentSurface, GateDecision, ModerationGate, ModerationLogStore,
};
use content_moderator::infra::ai::OpenRouterClient;
use content_moderator::infra::moderation::{InMemoryModerationLog, SqliteModerationLog};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

// Keep the console's own transcript bounded; the chat service trims further.
const MAX_CONSOLE_HISTORY: usize = 100;

type Gate = ModerationGate<Arc<dyn ModerationLogStore>>;

fn print_help() {
    println!("Type a message to chat, or one of:");
    println!("  /journal <text>   submit a journal entry");
    println!("  /file <name>      submit an upload by file name");
    println!("  /check <text>     show severity and categories only");
    println!("  /sanitize <text>  mask blocked words");
    println!("  /log              show the latest blocked submissions");
    println!("  /help             show this help");
}

fn print_block(decision: &GateDecision) {
    println!(
        "🚫 {}",
        decision
            .user_message()
            .unwrap_or("This can't be submitted.")
    );

    if decision.is_critical() {
        println!();
        for resource in &decision.support_resources {
            println!("  💙 {} - {}", resource.name, resource.contact);
            println!("     {}", resource.description);
        }
    }
}

async fn screen_and_report(gate: &Gate, surface: ContentSurface, user_id: Option<&str>, text: &str) {
    let decision = gate.screen(surface, user_id, text).await;
    if decision.allowed {
        println!("✅ Accepted ({surface}).");
    } else {
        print_block(&decision);
    }
}

async fn print_log(gate: &Gate) -> Result<()> {
    let events = gate.recent_events(10).await?;
    if events.is_empty() {
        println!("No blocked submissions yet.");
        return Ok(());
    }

    for event in events {
        let categories: Vec<_> = event.categories.iter().map(|c| c.as_str()).collect();
        println!(
            "{} | {} | {} | {} | [{}] | {} fragment(s)",
            event.created_at.format("%Y-%m-%d %H:%M:%S"),
            event.user_id.as_deref().unwrap_or("anonymous"),
            event.surface,
            event.severity,
            categories.join(", "),
            event.flagged_content.len(),
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let engine = Arc::new(
        config
            .build_engine()
            .context("Failed to build moderation engine")?,
    );

    let log_store: Arc<dyn ModerationLogStore> = match &config.log_db_path {
        Some(path) => {
            if let Some(dir) = std::path::Path::new(path).parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)
                        .context("Failed to create directory for the moderation log")?;
                }
            }

            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .connect(&format!("sqlite://{}?mode=rwc", path))
                .await
                .context("Failed to connect to moderation log DB")?;
            let store = SqliteModerationLog::new(pool);
            store
                .migrate()
                .await
                .context("Failed to migrate moderation log DB")?;
            Arc::new(store)
        }
        None => {
            tracing::info!("MODERATION_LOG_DB not set, keeping the moderation log in memory");
            Arc::new(InMemoryModerationLog::new())
        }
    };

    let gate: Arc<Gate> = Arc::new(ModerationGate::new(Arc::clone(&engine), log_store));

    let chat = config.ai.as_ref().map(|ai| {
        let generator: Box<dyn TextGenerator> =
            Box::new(OpenRouterClient::new(ai.api_key.clone()));
        let generation = GenerationConfig {
            model: ai.model.clone(),
            temperature: ai.temperature,
            max_tokens: None,
        };
        GuardedChatService::new(
            generator,
            Arc::clone(&gate),
            ai.system_prompt.clone(),
            generation,
            ai.max_history,
        )
    });

    if chat.is_none() {
        tracing::info!("OPENROUTER_API_KEY not set, chat messages are screened but not answered");
    }

    // Stand-in for the signed-in identity; anonymous when unknown.
    let user_id = std::env::var("USER").ok();
    let mut history: Vec<ChatMessage> = Vec::new();

    // ========================================================================
    // INPUT LOOP
    // ========================================================================

    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = if line.starts_with('/') {
            match line.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (line, ""),
            }
        } else {
            ("", line)
        };

        match command {
            "/help" => print_help(),
            "/journal" => {
                screen_and_report(&gate, ContentSurface::Journal, user_id.as_deref(), rest).await
            }
            "/file" => {
                screen_and_report(&gate, ContentSurface::FileUpload, user_id.as_deref(), rest)
                    .await
            }
            "/check" => {
                let result = engine.moderate_content(rest);
                let categories: Vec<_> =
                    result.blocked_categories.iter().map(|c| c.as_str()).collect();
                println!("severity: {} [{}]", result.severity, categories.join(", "));
            }
            "/sanitize" => println!("{}", engine.sanitize_text(rest)),
            "/log" => {
                if let Err(e) = print_log(&gate).await {
                    tracing::error!("Failed to read moderation log: {}", e);
                }
            }
            "" => match &chat {
                Some(chat) => match chat.chat(user_id.as_deref(), &history, line).await {
                    Ok(ChatOutcome::Reply(reply)) => {
                        println!("🤖 {reply}");
                        history.push(ChatMessage::user(line));
                        history.push(ChatMessage::assistant(reply));
                        if history.len() > MAX_CONSOLE_HISTORY {
                            let excess = history.len() - MAX_CONSOLE_HISTORY;
                            history.drain(..excess);
                        }
                    }
                    Ok(ChatOutcome::Blocked(decision)) => print_block(&decision),
                    Err(e) => {
                        tracing::error!("AI error: {}", e);
                        println!("Sorry, I encountered an error processing your request.");
                    }
                },
                None => {
                    screen_and_report(&gate, ContentSurface::Chat, user_id.as_deref(), line).await
                }
            },
            other => println!("Unknown command `{other}`. Type /help for the list."),
        }
    }

    Ok(())
}
