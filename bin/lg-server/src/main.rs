//! LearnGate Portal Server
//!
//! Production server for the training-portal backend:
//! - Auth APIs: login, force-reset, admin-reset
//! - Registration APIs: intake, approval
//! - Internal APIs: pending-registration cleanup
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LG_API_PORT` | `8080` | HTTP API port |
//! | `LG_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `LG_MONGO_DB` | `learngate` | MongoDB database name |
//! | `LG_JWT_SECRET` | - | HMAC secret for HS256 sessions |
//! | `LG_JWT_PRIVATE_KEY_PATH` | - | Path to RSA private key PEM (RS256) |
//! | `LG_JWT_PUBLIC_KEY_PATH` | - | Path to RSA public key PEM (RS256) |
//! | `LG_JWT_ISSUER` | `learngate` | JWT issuer claim |
//! | `LG_REGISTRATION_KEY` | - | Base64 32-byte AES key for pending passwords |
//! | `LG_RATE_LIMIT_MAX` | `3` | Registration attempts per window |
//! | `LG_RATE_LIMIT_WINDOW_SECS` | `900` | Registration rate-limit window |
//! | `LG_PENDING_RETENTION_DAYS` | `45` | Pending registration retention |
//! | `LG_REAPER_INTERVAL_SECS` | `3600` | Background reaper interval |
//! | `LG_DEV_MODE` | `false` | Seed development data on startup |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use lg_platform::auth::{auth_router, AuthApiState};
use lg_platform::registration::{
    cipher, maintenance_router, registration_router, RegistrationApiState,
};
use lg_platform::shared::logging::init_logging;
use lg_platform::{
    AppState, AuditService, AuthLayer, DevDataSeeder, EmbeddedCredentialStore, ForceResetService,
    IntakePolicy, IntakeRateLimiter, LoginService, MongoAuthLogStore,
    MongoPendingRegistrationStore, MongoProfileStore, MongoTenantDirectory, PasswordService,
    RegistrationCipher, RegistrationService, TokenConfig, TokenService,
};
use lg_platform::{
    AuthLogStore, CredentialStore, PendingRegistrationStore, ProfileStore, TenantDirectory,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn read_pem(path_var: &str) -> Result<Option<String>> {
    match std::env::var(path_var) {
        Ok(path) => {
            let pem = std::fs::read_to_string(&path)
                .with_context(|| format!("reading PEM from {}", path))?;
            Ok(Some(pem))
        }
        Err(_) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("lg-server");

    info!("Starting LearnGate Portal Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("LG_API_PORT", 8080);
    let mongo_url = env_or("LG_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("LG_MONGO_DB", "learngate");
    let jwt_issuer = env_or("LG_JWT_ISSUER", "learngate");
    let retention_days: i64 = env_or_parse("LG_PENDING_RETENTION_DAYS", 45);
    let reaper_interval_secs: u64 = env_or_parse("LG_REAPER_INTERVAL_SECS", 3600);
    let rate_limit_max: u32 = env_or_parse("LG_RATE_LIMIT_MAX", 3);
    let rate_limit_window_secs: u64 = env_or_parse("LG_RATE_LIMIT_WINDOW_SECS", 900);
    let dev_mode = std::env::var("LG_DEV_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    // Session tokens: RS256 when a key pair is configured, HS256 otherwise
    let token_config = TokenConfig {
        rsa_private_key: read_pem("LG_JWT_PRIVATE_KEY_PATH")?,
        rsa_public_key: read_pem("LG_JWT_PUBLIC_KEY_PATH")?,
        secret_key: env_or("LG_JWT_SECRET", ""),
        issuer: jwt_issuer,
        ..TokenConfig::default()
    };
    let token_service = Arc::new(TokenService::new(token_config)?);

    // Pending-password cipher
    let registration_key = match std::env::var("LG_REGISTRATION_KEY") {
        Ok(key) => key,
        Err(_) => {
            warn!("LG_REGISTRATION_KEY not set; generating an ephemeral key (pending registrations will not survive a restart)");
            cipher::generate_key()
        }
    };
    let registration_cipher = Arc::new(RegistrationCipher::new(&registration_key)?);

    // Stores
    let password_service = Arc::new(PasswordService::default());
    let tenants: Arc<dyn TenantDirectory> = Arc::new(MongoTenantDirectory::new(&db));
    let profiles: Arc<dyn ProfileStore> = Arc::new(MongoProfileStore::new(&db));
    let pending: Arc<dyn PendingRegistrationStore> =
        Arc::new(MongoPendingRegistrationStore::new(&db));
    let auth_logs: Arc<dyn AuthLogStore> = Arc::new(MongoAuthLogStore::new(&db));
    let credential_store = EmbeddedCredentialStore::new(
        &db,
        password_service.clone(),
        token_service.clone(),
    );
    // Unique email index: concurrent duplicate signups must conflict, not
    // create two identities.
    credential_store.ensure_indexes().await?;
    let credentials: Arc<dyn CredentialStore> = Arc::new(credential_store);
    info!("Stores initialized");

    // Seed development data if in dev mode
    if dev_mode {
        let seeder = DevDataSeeder::new(tenants.clone(), profiles.clone(), credentials.clone());
        if let Err(e) = seeder.seed().await {
            warn!("Dev data seeding skipped (data may already exist): {}", e);
        }
    }

    // Services
    let audit = AuditService::new(auth_logs);
    let limiter = Arc::new(IntakeRateLimiter::new(IntakePolicy {
        max_attempts: rate_limit_max,
        window: Duration::from_secs(rate_limit_window_secs),
    })?);
    let login_service = Arc::new(LoginService::new(
        tenants.clone(),
        credentials.clone(),
        profiles.clone(),
    ));
    let reset_service = Arc::new(ForceResetService::new(
        profiles.clone(),
        credentials.clone(),
        audit.clone(),
    ));
    let registration_service = Arc::new(RegistrationService::new(
        pending,
        tenants,
        profiles,
        credentials,
        audit,
        registration_cipher,
        limiter.clone(),
        retention_days,
    ));
    info!("Services initialized");

    // Background reaper for expired pending registrations. The same tick
    // prunes replenished keys out of the rate limiter, which otherwise
    // grows with every distinct email ever submitted.
    {
        let sweeper = registration_service.clone();
        let rate_limiter = limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(reaper_interval_secs));
            loop {
                ticker.tick().await;
                if let Err(e) = sweeper.sweep(chrono::Utc::now()).await {
                    warn!("Pending registration sweep failed: {}", e);
                }
                rate_limiter.retain_recent();
            }
        });
        info!("Reaper started (every {}s)", reaper_interval_secs);
    }

    let app_state = AppState {
        token_service: token_service.clone(),
    };

    let auth_state = AuthApiState {
        login_service,
        reset_service,
    };
    let registration_state = RegistrationApiState {
        registration_service,
    };

    // Build API router with auto-collected OpenAPI paths
    let (router, mut openapi) = OpenApiRouter::new()
        .nest("/auth", auth_router(auth_state))
        .nest("/registrations", registration_router(registration_state.clone()))
        .nest("/internal", maintenance_router(registration_state))
        .split_for_parts();

    openapi.info.title = "LearnGate Portal API".to_string();
    openapi.info.version = "1.0.0".to_string();
    openapi.info.description =
        Some("Multi-tenant training portal: login, registration, and resets".to_string());

    let app = Router::new()
        .merge(router)
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", openapi))
        .layer(AuthLayer::new(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start API server
    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    info!("LearnGate Portal Server started");
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();

    info!("LearnGate Portal Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
