//! Assetra - IoT asset management platform backend

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetra::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            AdminRepository, SqlxAdminRepository, SqlxAssetRepository, SqlxBrandRepository,
            SqlxCategoryRepository, SqlxDemoRequestRepository, SqlxDepartmentRepository,
            SqlxEmployeeRepository, SqlxLocationRepository, SqlxMaintenanceRepository,
            SqlxPageRepository, SqlxPlanRepository, SqlxRoleRepository,
        },
    },
    services::{
        password::hash_password,
        scheduler::{self, CronSchedule},
        AuthService, BackupService, EmailService, ReportService, SensorHub,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assetra=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Assetra backend...");

    // Load configuration (config.yml + environment overrides)
    let config = Arc::new(Config::load_with_env(Path::new("config.yml"))?);
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let admins = SqlxAdminRepository::boxed(pool.clone());
    let assets = SqlxAssetRepository::boxed(pool.clone());
    let brands = SqlxBrandRepository::boxed(pool.clone());
    let categories = SqlxCategoryRepository::boxed(pool.clone());
    let demo_requests = SqlxDemoRequestRepository::boxed(pool.clone());
    let departments = SqlxDepartmentRepository::boxed(pool.clone());
    let employees = SqlxEmployeeRepository::boxed(pool.clone());
    let locations = SqlxLocationRepository::boxed(pool.clone());
    let maintenance = SqlxMaintenanceRepository::boxed(pool.clone());
    let pages = SqlxPageRepository::boxed(pool.clone());
    let plans = SqlxPlanRepository::boxed(pool.clone());
    let roles = SqlxRoleRepository::boxed(pool.clone());

    // Bootstrap the first admin account from the environment
    if let (Ok(email), Ok(password)) = (
        std::env::var("ASSETRA_ADMIN_EMAIL"),
        std::env::var("ASSETRA_ADMIN_PASSWORD"),
    ) {
        if admins.get_by_email(&email).await?.is_none() {
            let password_hash = hash_password(&password)?;
            admins.create(&email, "Administrator", &password_hash).await?;
            tracing::info!("Bootstrap admin account created: {}", email);
        }
    }

    // Initialize services
    let auth = Arc::new(AuthService::new(admins.clone(), config.auth.clone()));
    let email = Arc::new(EmailService::new(config.email.clone()));
    let reports = Arc::new(ReportService::new(pool.clone()));
    let backup = Arc::new(BackupService::new(
        pool.clone(),
        config.backup.clone(),
        config.drive.clone(),
    ));
    let sensors = Arc::new(SensorHub::new());

    // Start the scheduled backup task. An invalid schedule or timezone is
    // a configuration error and fails startup.
    if config.backup.enabled {
        let schedule = CronSchedule::parse(&config.backup.cron)?;
        let timezone = scheduler::parse_timezone(&config.backup.timezone)?;
        scheduler::spawn_backup_task(backup.clone(), schedule, timezone);
        tracing::info!(
            "Backup scheduler started (cron '{}', timezone {})",
            config.backup.cron,
            config.backup.timezone
        );
    } else {
        tracing::info!("Scheduled backups disabled");
    }

    if !email.is_enabled() {
        tracing::warn!("EMAIL_HOST not configured; OTP and notification emails are disabled");
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        auth,
        email,
        reports,
        backup,
        sensors,
        admins,
        assets,
        brands,
        categories,
        demo_requests,
        departments,
        employees,
        locations,
        maintenance,
        pages,
        plans,
        roles,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
