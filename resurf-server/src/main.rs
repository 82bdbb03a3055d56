use clap::Parser;
use resurf_core::ResurfConfig;
use tracing_subscriber::{fmt, EnvFilter};

use resurf_server::subsystems::enrich::AiClients;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "resurf.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match ResurfConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let pool = match resurf_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match resurf_core::db::check_health(&pool).await {
            Ok(health) => {
                println!("✅ PostgreSQL connected: {}", health.postgresql);
                match health.pgvector {
                    Some(v) => println!("✅ pgvector version: {}", v),
                    None => {
                        println!("❌ pgvector extension not installed");
                        std::process::exit(1);
                    }
                }
            }
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Resurf DB health check passed");
        return Ok(());
    }

    resurf_server::schema::ensure_schema(&pool, config.ai.embedding_dimensions).await?;

    let ai = AiClients::from_config(&config);

    resurf_server::http::start_http_server(pool, config, ai).await?;

    Ok(())
}
