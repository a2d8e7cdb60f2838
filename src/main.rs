use std::{process, sync::Arc};

use brusio::{
    application::{
        content::ContentService,
        error::AppError,
        feed::FeedService,
        repos::{
            CommentsRepo, CreateGroupParams, FollowsRepo, GroupsRepo, PostsRepo, RepoError,
            UsersRepo,
        },
    },
    cache::{CacheConfig, CacheState},
    config,
    domain::slugs,
    infra::{
        db::PostgresRepositories,
        http::{self, AppState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    // Telemetry may not be installed yet when configuration loading fails.
    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::Group(args) => run_group(settings, args.command).await,
    }
}

async fn connect(settings: &config::Settings) -> Result<PostgresRepositories, AppError> {
    let pool = PostgresRepositories::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await
    .map_err(|err| AppError::unexpected(format!("failed to connect to database: {err}")))?;
    Ok(PostgresRepositories::new(pool))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let db = connect(&settings).await?;
    PostgresRepositories::run_migrations(db.pool())
        .await
        .map_err(|err| AppError::unexpected(format!("migration failed: {err}")))?;
    info!("migrations applied");
    Ok(())
}

async fn run_group(
    settings: config::Settings,
    command: config::GroupCommand,
) -> Result<(), AppError> {
    let db = connect(&settings).await?;
    match command {
        config::GroupCommand::Add(args) => {
            let slug = slugs::resolve_slug(&args.title, args.slug.as_deref())
                .map_err(|err| AppError::validation(err.to_string()))?;
            let group = db
                .create_group(CreateGroupParams {
                    slug,
                    title: args.title,
                    description: args.description,
                })
                .await
                .map_err(|err| match err {
                    RepoError::Duplicate { .. } => {
                        AppError::validation("a group with that slug already exists")
                    }
                    other => AppError::unexpected(other.to_string()),
                })?;
            info!(id = %group.id, slug = %group.slug, "group created");
        }
        config::GroupCommand::List => {
            let groups = db
                .list_groups()
                .await
                .map_err(|err| AppError::unexpected(err.to_string()))?;
            for group in &groups {
                println!("{}\t{}\t{}", group.id, group.slug, group.title);
            }
        }
    }
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let db = Arc::new(connect(&settings).await?);
    PostgresRepositories::run_migrations(db.pool())
        .await
        .map_err(|err| AppError::unexpected(format!("migration failed: {err}")))?;

    let posts: Arc<dyn PostsRepo> = db.clone();
    let groups: Arc<dyn GroupsRepo> = db.clone();
    let users: Arc<dyn UsersRepo> = db.clone();
    let comments: Arc<dyn CommentsRepo> = db.clone();
    let follows: Arc<dyn FollowsRepo> = db.clone();

    let feed = Arc::new(FeedService::new(
        posts.clone(),
        groups.clone(),
        users.clone(),
        comments.clone(),
        follows.clone(),
        settings.feed.page_size,
    ));
    let content = Arc::new(ContentService::new(
        posts, groups, users.clone(), comments, follows,
    ));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = cache_config.enabled.then(|| CacheState::new(cache_config));
    if let Some(cache) = &cache {
        info!(ttl_secs = cache.config.ttl_secs, "global feed cache enabled");
    }

    let state = AppState {
        feed,
        content,
        users,
    };
    let router = http::build_router(state, cache).merge(http::db_health_router(db));

    let bind_address = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|err| AppError::unexpected(format!("failed to bind {bind_address}: {err}")))?;

    info!(
        address = %bind_address,
        page_size = settings.feed.page_size,
        "brusio listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown()))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal(grace: std::time::Duration) {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("failed to listen for shutdown signal");
        return;
    }
    info!(grace_secs = grace.as_secs(), "shutdown signal received");
}
