use crate::bot::admin_handlers::{self, FlowCommand};
use crate::bot::handlers::{self, Command};
use crate::bot::resilient::TelegramNotifier;
use crate::bot::subscription::{SubscriptionGuard, TelegramMembership};
use crate::bot::BotServices;
use crate::config::{get_subscription_cache_max_size, get_subscription_cache_ttl, BotSettings};
use guidebot_core::admin::AdminService;
use guidebot_core::flow::{AdminFlowCoordinator, FlowMessages};
use guidebot_core::session::InMemorySessionStore;
use guidebot_core::storage::{JsonGuideCatalog, JsonMenuMediaStore, JsonUserRegistry};
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let bot = Bot::new(settings.telegram.telegram_token.clone());
    let services = init_services(&settings, &bot);
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![services])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn init_services(settings: &BotSettings, bot: &Bot) -> Arc<BotServices> {
    let storage = settings.storage.as_ref();
    info!(dir = %storage.storage_dir.display(), "Using JSON file storage");

    let catalog = Arc::new(JsonGuideCatalog::new(storage.guides_path()));
    let users = Arc::new(JsonUserRegistry::new(storage.users_path()));
    let menu_media = Arc::new(JsonMenuMediaStore::new(storage.menu_media_path()));
    let sessions = Arc::new(InMemorySessionStore::new());

    let admins = Arc::new(AdminService::new(
        settings.telegram.admin_ids(),
        Arc::new(TelegramNotifier::new(bot.clone())),
    ));

    let messages = FlowMessages::default().with_no_guides(storage.no_guides_message.clone());
    let coordinator = Arc::new(AdminFlowCoordinator::new(
        sessions.clone(),
        catalog.clone(),
        admins.clone(),
        messages,
    ));

    let subscription = init_subscription_guard(settings, bot);

    Arc::new(BotServices {
        catalog,
        users,
        menu_media,
        admins,
        sessions,
        coordinator,
        subscription,
        audit_channel: settings.telegram.audit_channel(),
    })
}

fn init_subscription_guard(settings: &BotSettings, bot: &Bot) -> Arc<SubscriptionGuard> {
    let subscription = settings.telegram.subscription();
    let ttl = get_subscription_cache_ttl();
    let max_size = get_subscription_cache_max_size();

    match &subscription {
        Some(s) => info!(
            "Subscription gate enabled for {} (cache ttl: {}s, max_size: {})",
            s.channel, ttl, max_size
        ),
        None => info!("Subscription gate disabled"),
    }

    Arc::new(SubscriptionGuard::new(
        subscription,
        Arc::new(TelegramMembership::new(bot.clone())),
        ttl,
        max_size,
    ))
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text))
                .branch(
                    dptree::filter(|msg: Message| msg.document().is_some())
                        .endpoint(handle_document),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.photo().is_some() || msg.video().is_some())
                        .endpoint(handle_media),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Arc<BotServices>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg, services).await,
        Command::Get => handlers::get_guides(bot, msg, services).await,
        Command::Admin => admin_handlers::admin_menu(bot, msg, services).await,
        Command::ShowGuides => admin_handlers::show_guides(bot, msg, services).await,
        Command::Add => admin_handlers::flow_command(bot, msg, services, FlowCommand::Add).await,
        Command::Delete => {
            admin_handlers::flow_command(bot, msg, services, FlowCommand::Delete).await
        }
        Command::Confirm => {
            admin_handlers::flow_command(bot, msg, services, FlowCommand::Confirm).await
        }
        Command::Cancel => {
            admin_handlers::flow_command(bot, msg, services, FlowCommand::Cancel).await
        }
        Command::ImageMenu => admin_handlers::image_menu(bot, msg, services).await,
        Command::Users => admin_handlers::users(bot, msg, services).await,
        Command::CheckChannel => admin_handlers::check_channel(bot, msg, services).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    services: Arc<BotServices>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_callback(bot, q, services).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, services).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_document(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_document(bot, msg, services).await {
        error!("Document handler error: {}", e);
    }
    respond(())
}

async fn handle_media(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_media(bot, msg, services).await {
        error!("Media handler error: {}", e);
    }
    respond(())
}
