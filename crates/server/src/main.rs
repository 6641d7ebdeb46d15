use anyhow::Context;
use chrono::Duration;
use database::{
    db::create_connection,
    services::user::{NewUser, UserService},
};
use log::{info, warn};
use migration::{Migrator, MigratorTrait};
use models::role::Role;
use server::{
    app,
    auth::{password::hash_password, token::TokenIssuer},
    config::{AppConfig, BootstrapAdmin, DEV_JWT_SECRET},
    state::AppState,
    utils::shutdown::shutdown_signal,
};

async fn bootstrap_admin(
    db: &database::DatabaseConnection,
    admin: &BootstrapAdmin,
) -> anyhow::Result<()> {
    if UserService::admin_exists(db).await? {
        return Ok(());
    }

    let user = UserService::create(
        db,
        NewUser {
            name: admin.name.clone(),
            email: admin.email.clone(),
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
            department_id: None,
        },
    )
    .await?;

    info!("Created bootstrap administrator {} ({})", user.id, user.email);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = create_connection(&config.database_url()?, config.database.max_connections)
        .await
        .context("Failed to connect to the database")?;

    if config.database.run_migrations {
        Migrator::up(&db, None)
            .await
            .context("Failed to run migrations")?;
        info!("Migrations applied");
    }

    match &config.bootstrap_admin {
        Some(admin) => bootstrap_admin(&db, admin).await?,
        None => {
            if !UserService::admin_exists(&db).await? {
                warn!("No administrator exists and no bootstrap_admin is configured");
            }
        }
    }

    if config.auth.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set PORTAL__AUTH__JWT_SECRET");
    }

    let tokens = TokenIssuer::new(
        &config.auth.jwt_secret,
        Duration::days(config.auth.token_ttl_days),
    );
    let state = AppState::new(db, tokens, config.institute.clone());

    let address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Running axum on http://{address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
