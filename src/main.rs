use std::{borrow::Cow, sync::Arc};

use quiztrainer::{
    config::{Config, WebhookConfig},
    database::{bank::QuestionBank, connection::Connection, local::LocalStore},
    reporter::ResultReporter,
    schema::schema,
    state::TrainerState,
    trainer::Trainer,
};
use teloxide::{
    dispatching::dialogue::InMemStorage,
    error_handlers::IgnoringErrorHandlerSafe,
    prelude::*,
    update_listeners::webhooks::{self, Options},
};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::fmt::format::FmtSpan;

fn init_tracing(level: LevelFilter) {
    tracing_log::LogTracer::init().expect("Failed to forward log records.");
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to install the subscriber.");
}

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Configuration is incomplete.");
    init_tracing(config.log_level);

    let remote = match &config.database_url {
        Some(url) => {
            let connection = Connection::connect(Cow::Borrowed(url.as_str()))
                .await
                .expect("Failed to connect to the database.");
            connection
                .run_migrations()
                .await
                .expect("Failed to run migrations.");
            Some(Arc::new(connection))
        }
        None => {
            info!("DATABASE_URL is not set, results are kept in memory");
            None
        }
    };
    let reporter = Arc::new(ResultReporter::new(remote, Arc::new(LocalStore::default())));

    let bank = QuestionBank::load_dir(&config.question_bank_dir, &config.default_language)
        .expect("Failed to load the question banks.");
    let trainer = Arc::new(Trainer::new(bank, config.engine, reporter));

    let bot = Bot::new(config.teloxide_token);
    info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![InMemStorage::<TrainerState>::new(), trainer])
        .enable_ctrlc_handler()
        .build();

    if let Some(WebhookConfig { url, address }) = config.webhook {
        let listener = webhooks::axum(bot, Options::new(address, url))
            .await
            .expect("Failed to build a listener.");
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }
}
