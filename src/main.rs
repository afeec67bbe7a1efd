use clap::{Parser, Subcommand};
use delivery_audit::service::{audit_phones, matcher_for, SalesSource};
use delivery_audit::{api, create_pool, output, AppConfig, AuditError, DeliveryAuditor, EvolutionClient, PgSalesSource};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// WhatsApp 投递对账工具 (只读)
#[derive(Debug, Parser)]
#[command(name = "delivery-audit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Cross-check sale delivery status against the provider's sent messages (default)
    Audit {
        /// Also export every classified record as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Check customer phone numbers for E.164 format
    Phones,
    /// Serve an HTTP trigger for on-demand audits
    Serve,
}

type Auditor = DeliveryAuditor<PgSalesSource, EvolutionClient>;

async fn build_auditor(config: &AppConfig) -> Result<Auditor, AuditError> {
    // 记录库连不上属于致命错误
    let pool = create_pool(&config.database.url).await?;
    info!("Database pool created");

    let provider = EvolutionClient::new(config.provider.clone())
        .map_err(|e| AuditError::Config(e.to_string()))?;
    if !config.provider.is_configured() {
        tracing::warn!("Provider not configured, sent messages will be unavailable");
    }

    Ok(DeliveryAuditor::new(
        PgSalesSource::new(pool),
        provider,
        config.audit.lookback_days,
        config.audit.message_fetch_limit,
        matcher_for(config.audit.phone_matching),
    ))
}

async fn run_audit(config: &AppConfig, csv: Option<PathBuf>) -> Result<(), AuditError> {
    println!(
        "\n📊 WhatsApp delivery audit (last {} days)\n",
        config.audit.lookback_days
    );
    let auditor = build_auditor(config).await?;
    let report = auditor.run().await?;

    output::write_json(&report, &config.audit.report_path)?;
    if let Some(csv_path) = csv {
        output::export_to_csv(&report, &csv_path)?;
        info!("CSV exported to {}", csv_path.display());
    }

    print!("{}", output::render_summary(&report, &config.audit.report_path));
    Ok(())
}

async fn run_phone_check(config: &AppConfig) -> Result<(), AuditError> {
    let pool = create_pool(&config.database.url).await?;
    let customers = PgSalesSource::new(pool).fetch_customers().await?;
    info!("Loaded {} customers", customers.len());

    let report = audit_phones(&customers, chrono::Utc::now());
    output::write_json(&report, &config.audit.phone_report_path)?;
    print!("{}", output::render_phone_summary(&report, &config.audit.phone_report_path));
    Ok(())
}

async fn serve(config: &AppConfig) -> Result<(), AuditError> {
    let auditor = Arc::new(build_auditor(config).await?);
    let app = api::router(auditor).layer(ServiceBuilder::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health");
    info!("  POST /api/audit  - run one reconciliation");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // 日志输出到 stderr，stdout 留给控制台摘要
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Loaded config: {:?}", config);

    let result = match cli.command.unwrap_or(Command::Audit { csv: None }) {
        Command::Audit { csv } => run_audit(&config, csv).await,
        Command::Phones => run_phone_check(&config).await,
        Command::Serve => serve(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n❌ Could not run: {}", e);
            ExitCode::FAILURE
        }
    }
}
