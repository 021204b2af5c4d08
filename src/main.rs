//! Face Biometric Attendance Server - Main Application Entry Point
//!
//! # Startup Flow (`serve`)
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Create the initial admin account if none exists
//! 4. Check the port is free
//! 5. Build HTTP router with routes and middleware
//! 6. Serve HTTPS when certificates exist, plain HTTP otherwise

use std::{net::SocketAddr, path::Path};

use anyhow::{Context, bail};
use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use face_biometric_server::{
    app::{self, AppState},
    config::Config,
    db, launcher,
    services::admin_service,
    tls,
};

#[derive(Parser)]
#[command(name = "face-biometric", version, about = "Face biometric attendance server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the attendance server (default)
    Serve,
    /// Generate a self-signed certificate for HTTPS
    GenCert {
        /// Host name or IP to certify (defaults to the detected LAN address)
        #[arg(long)]
        host: Option<String>,
        /// Overwrite existing certificate files
        #[arg(long)]
        force: bool,
    },
    /// Print the detected LAN address
    DetectIp,
    /// Apply database migrations and exit
    Migrate,
    /// Erase all employees, face data and attendance (admins are kept)
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::GenCert { host, force } => {
            let host = host.unwrap_or_else(tls::detect_lan_ip);
            let (cert, key) = tls::generate_self_signed(
                &host,
                Path::new(&config.tls_cert_path),
                Path::new(&config.tls_key_path),
                force,
            )?;
            println!("Certificate: {}", cert.display());
            println!("Private key: {}", key.display());
            Ok(())
        }
        Command::DetectIp => {
            println!("{}", tls::detect_lan_ip());
            Ok(())
        }
        Command::Migrate => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("Refusing to erase data without --yes");
            }
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            db::reset_employee_data(&pool).await?;
            tracing::warn!("All employees, face data and attendance records were erased");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    admin_service::ensure_bootstrap_admin(&pool, &config).await?;

    launcher::ensure_port_available(&config)?;

    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr()))?;
    let https = tls::tls_files_present(&config);
    let lan_ip = tls::detect_lan_ip();
    let tls_paths = (config.tls_cert_path.clone(), config.tls_key_path.clone());

    launcher::log_startup(&config, https, &lan_ip);

    let state = AppState::new(pool, config).context("invalid attendance window")?;
    let app = app::build_router(state);

    if https {
        let rustls = RustlsConfig::from_pem_file(&tls_paths.0, &tls_paths.1)
            .await
            .context("failed to load TLS certificate")?;
        axum_server::bind_rustls(addr, rustls)
            .serve(app.into_make_service())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;
    }

    Ok(())
}
