use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use topic_resolver::config::AppConfig;
use topic_resolver::{ClusterId, TopicManager, TopicName};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "topic-resolver", about = "Resolve topic metadata of KRaft clusters")]
struct Cli {
    /// TOML file describing the clusters; defaults to a single local cluster
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every topic of a cluster
    List { cluster: String },
    /// Show one topic of a cluster
    Get { cluster: String, topic: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    info!(clusters = config.clusters.len(), "starting topic resolver");
    let service = config.build_service();

    let output = match cli.command {
        Command::List { cluster } => {
            let topics = service.list_topics(&ClusterId::from(cluster)).await?;
            serde_json::to_string_pretty(&topics)?
        }
        Command::Get { cluster, topic } => {
            let topic = TopicName::new(topic).context("invalid topic name")?;
            match service.get_topic(&ClusterId::from(cluster), &topic).await? {
                Some(found) => serde_json::to_string_pretty(&found)?,
                None => anyhow::bail!("topic {} not found", topic),
            }
        }
    };
    println!("{}", output);

    Ok(())
}
