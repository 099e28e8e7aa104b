//! Table booking server.
//!
//! Serves the booking API, persists bookings in PostgreSQL and announces
//! every lifecycle change on the community's Discord channel.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use table_booking::{
    BookingService,
    db::{Database, PgBookingRepository},
    discord::{DiscordClient, Member},
    notify::{Announcer, DEFAULT_SWEEP_INTERVAL, IdentityResolver, TtlCache},
};
use tb_server::{api, config::ServerConfig, logging};

const HELP: &str = "\
Run the table booking server

USAGE:
  tb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:9090]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DISCORD_BOT_TOKEN        Bot token used for announcements and member search
  DISCORD_SERVER_ID        Guild the community lives in
  DISCORD_CHANNEL_ID       Channel receiving booking announcements
  DISCORD_ADMIN_ROLE_ID    Role allowed to accept and refuse bookings
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    config.validate()?;
    info!("Starting table booking server at {}", config.bind);

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.health_check()
        .await
        .context("Database health check failed")?;
    db.initialize_schema()
        .await
        .context("Failed to initialize booking tables")?;
    info!("Database connected successfully");

    let discord = Arc::new(DiscordClient::new(config.discord.clone())?);

    // Player name → member lookups made while composing announcements
    let member_searches: Arc<TtlCache<Vec<Member>>> = Arc::new(TtlCache::new(config.cache_ttl));
    let _search_sweeper = member_searches.spawn_sweeper(DEFAULT_SWEEP_INTERVAL);
    let resolver = IdentityResolver::new(discord.clone(), member_searches);
    let announcer = Announcer::new(discord.clone(), resolver, &config.notify);

    let repo = Arc::new(PgBookingRepository::new(Arc::new(db.pool().clone())));
    let bookings = BookingService::new(repo, Arc::new(announcer));

    // Access token → member lookups made by the auth middleware
    let sessions: Arc<TtlCache<Member>> = Arc::new(TtlCache::new(config.cache_ttl));
    let _session_sweeper = sessions.spawn_sweeper(DEFAULT_SWEEP_INTERVAL);

    let state = api::AppState {
        bookings,
        chat: discord.clone(),
        session: discord,
        members: sessions,
        admin_role_id: config.admin_role_id.clone(),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
