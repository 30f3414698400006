use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use tempmail::broadcast::Broadcaster;
use tempmail::commands::CommandHandler;
use tempmail::config::Settings;
use tempmail::manager::MailboxManager;
use tempmail::provider::HttpMailProvider;
use tempmail::store::{MemoryStore, SessionStore};
use tempmail::telegram::TelegramClient;

#[derive(Parser, Debug)]
#[command(name = "tempmail-bot", about = "Disposable email chat bot")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "TEMPMAIL_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = Settings::new(cli.config.as_deref())?;
    env_logger::Builder::from_env(Env::default().default_filter_or(settings.log.level.as_str()))
        .init();

    if settings.telegram.bot_token.is_empty() {
        return Err("telegram.bot_token is not configured".into());
    }
    if settings.provider.api_key.is_empty() {
        warn!("provider.api_key is empty; upstream calls will be rejected");
    }

    let settings = Arc::new(settings);
    let provider = Arc::new(HttpMailProvider::new(&settings.provider)?);
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    let manager = Arc::new(MailboxManager::new(provider, store.clone()));

    let telegram = Arc::new(TelegramClient::new(
        &settings.telegram.bot_token,
        settings.telegram.poll_timeout_secs,
    )?);
    let broadcaster = Arc::new(Broadcaster::new(store, telegram.clone()));
    let handler = Arc::new(CommandHandler::new(manager, broadcaster, settings.clone()));

    info!("tempmail-bot started, polling for updates");
    run_polling_loop(telegram, handler, settings.telegram.poll_timeout_secs).await;
    Ok(())
}

/// Long-poll Telegram and handle each inbound command as an independent
/// task; a failing command or delivery affects only that chat.
async fn run_polling_loop(
    telegram: Arc<TelegramClient>,
    handler: Arc<CommandHandler<HttpMailProvider>>,
    poll_timeout_secs: u64,
) {
    let mut offset = 0i64;

    loop {
        let updates = match telegram.get_updates(offset, poll_timeout_secs).await {
            Ok(updates) => updates,
            Err(err) => {
                error!("Failed to fetch updates: {}", err);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };
            let chat_id = message.chat.id;

            let telegram = telegram.clone();
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Some(reply) = handler.handle(chat_id, &text).await {
                    if let Err(err) = telegram.send_message(chat_id, &reply).await {
                        error!("Failed to reply to chat {}: {}", chat_id, err);
                    }
                }
            });
        }
    }
}
