//! Application assembly
//!
//! Builds every adapter, runs the startup checks and drives the poller until
//! a shutdown signal arrives.

use std::sync::Arc;

use relay_common::{AppConfig, AppError, AppResult};
use relay_db::{
    create_pool, run_migrations, DatabaseConfig, PgBlockRepository, PgHealthCheck,
    PgMappingRepository, PgPool, PgSettingsRepository, PgUserRepository,
    PgVerificationRepository,
};
use relay_service::jobs::daily_jobs;
use relay_service::services::help::register_commands;
use relay_service::services::KeywordList;
use relay_service::{Dispatcher, RelaySettings, Scheduler, SelfTest, ServiceContext};
use tracing::{info, warn};

use crate::captcha::GifCaptcha;
use crate::classifier::OpenAiClassifier;
use crate::telegram::{Poller, TelegramClient};

/// Connect the pool and create the schema
pub async fn connect_database(config: &AppConfig) -> AppResult<PgPool> {
    info!("Connecting to PostgreSQL...");
    let db_config = DatabaseConfig::new(
        config.database.url.clone(),
        config.database.max_connections,
        config.database.min_connections,
    );
    let pool = create_pool(&db_config).await.map_err(AppError::database)?;
    run_migrations(&pool).await.map_err(AppError::database)?;
    info!("PostgreSQL connection established");
    Ok(pool)
}

/// Wire repositories and adapters into a service context
pub fn build_context(
    config: &AppConfig,
    pool: &PgPool,
    telegram: Arc<TelegramClient>,
) -> AppResult<ServiceContext> {
    let classifier = OpenAiClassifier::new(&config.classifier).map_err(AppError::internal)?;
    if !config.classifier.is_configured() {
        warn!("Classifier is not configured, every check uses the keyword list");
    }

    let keywords = match &config.classifier.keywords_path {
        Some(path) => {
            let list = KeywordList::load(path).map_err(AppError::internal)?;
            info!(path = %path.display(), words = list.len(), "Keyword list loaded");
            list
        }
        None => KeywordList::embedded(),
    };

    let ctx = ServiceContext::builder()
        .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
        .verification_repo(Arc::new(PgVerificationRepository::new(pool.clone())))
        .block_repo(Arc::new(PgBlockRepository::new(pool.clone())))
        .mapping_repo(Arc::new(PgMappingRepository::new(pool.clone())))
        .settings_repo(Arc::new(PgSettingsRepository::new(pool.clone())))
        .health(Arc::new(PgHealthCheck::new(pool.clone())))
        .gateway(telegram)
        .classifier(Arc::new(classifier))
        .captcha(Arc::new(GifCaptcha::new()))
        .keywords(keywords)
        .settings(RelaySettings::from(config))
        .build()?;
    Ok(ctx)
}

/// Run the bot until SIGINT or SIGTERM
pub async fn run(config: AppConfig) -> AppResult<()> {
    let pool = connect_database(&config).await?;
    let telegram = Arc::new(TelegramClient::new(&config.telegram).map_err(AppError::internal)?);
    let ctx = Arc::new(build_context(&config, &pool, Arc::clone(&telegram))?);

    let report = SelfTest::new(&ctx).run().await;
    info!(ready = report.all_passed(), "Self-test finished");

    if let Err(err) = register_commands(&ctx).await {
        warn!(error = %err, "Failed to register the command menu");
    }

    let scheduler = Scheduler::new(daily_jobs(&ctx)).spawn();
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&ctx)));
    Poller::new(
        telegram,
        dispatcher,
        config.telegram.poll_timeout_secs,
        config.telegram.concurrency,
    )
    .run(shutdown_signal())
    .await;

    scheduler.abort();
    pool.close().await;
    info!("Relay bot stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
                    _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                info!("SIGINT received, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl-C received, shutting down");
    }
}
