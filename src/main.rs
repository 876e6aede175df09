mod driver;
mod extractor;
mod queries;
mod records;
mod resolver;
mod sink;
mod transform;

use anyhow::{Context, Result};
use driver::{ExportConfig, Exporter, DEFAULT_BATCH_SIZE};
use sink::JsonlSink;
use std::env;
use tracing::{error, info, warn};

#[derive(Debug)]
struct Config {
    neo4j_uri: String,
    neo4j_user: String,
    neo4j_password: String,
    output_dir: String,
    batch_size: usize,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let batch_size = match env::var("EXPORT_BATCH_SIZE") {
            Ok(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .context("EXPORT_BATCH_SIZE must be a positive integer")?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        Ok(Config {
            neo4j_uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            neo4j_user: env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            neo4j_password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "password".to_string()),
            output_dir: env::var("EXPORT_OUTPUT_DIR").unwrap_or_else(|_| "export".to_string()),
            batch_size,
        })
    }
}

/// Connect to Neo4j with exponential backoff retry logic
async fn connect_neo4j_with_retry(
    uri: &str,
    user: &str,
    password: &str,
    max_retries: u32,
) -> Result<neo4rs::Graph> {
    use tokio::time::{sleep, Duration};

    for attempt in 1..=max_retries {
        info!(
            "🔄 Attempting to connect to Neo4j at {}... (attempt {}/{})",
            uri, attempt, max_retries
        );

        match neo4rs::Graph::new(uri, user, password) {
            Ok(graph) => {
                info!("✅ Successfully connected to Neo4j");
                return Ok(graph);
            }
            Err(e) => {
                if attempt < max_retries {
                    let wait_time = 2u64.pow(attempt - 1); // 1s, 2s, 4s, 8s
                    warn!(
                        "⚠️  Failed to connect to Neo4j: {}. Retrying in {}s (attempt {}/{})...",
                        e, wait_time, attempt, max_retries
                    );
                    sleep(Duration::from_secs(wait_time)).await;
                } else {
                    error!(
                        "❌ Failed to connect to Neo4j after {} attempts: {}",
                        max_retries, e
                    );
                    return Err(anyhow::anyhow!(
                        "Neo4j connection failed after {} retries: {}",
                        max_retries,
                        e
                    ));
                }
            }
        }
    }

    Err(anyhow::anyhow!("Failed to connect to Neo4j"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Export worker starting...");

    let config = Config::from_env()?;

    let graph = connect_neo4j_with_retry(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        4,
    )
    .await?;

    let mut sink = JsonlSink::new(&config.output_dir)?;
    let exporter = Exporter::new(
        graph,
        ExportConfig {
            batch_size: config.batch_size,
        },
    );

    let manifest = exporter.run(&mut sink).await?;

    info!(
        "✅ Export finished: {} node files, {} edge files under {}",
        manifest.node_files.len(),
        manifest.edge_files.len(),
        config.output_dir
    );
    if !manifest.unresolved_types.is_empty() {
        warn!(
            "⚠️  {} type(s) could not be classified against the import schema: {}",
            manifest.unresolved_types.len(),
            manifest.unresolved_types.join(", ")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests;
