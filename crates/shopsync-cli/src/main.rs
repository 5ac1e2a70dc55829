use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use shopsync_core::{build_document_id, extract_external_id, AppConfig, DocumentKind};
use shopsync_sanity::SanityClient;
use shopsync_sync::{
    sanity_client_from_config, shopify_client_from_config, SyncOptions, SyncRequest, Syncer,
};

#[derive(Debug, Parser)]
#[command(name = "shopsync-cli")]
#[command(about = "Replay catalog webhooks and inspect synced documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a saved webhook body through the sync pipeline
    Apply {
        /// Path to the JSON body (`{action, products, collections, ...}`)
        #[arg(long)]
        file: PathBuf,
    },
    /// Print the published and draft copies of one document
    Show {
        /// Shopify GID, e.g. `gid://shopify/Product/123`
        #[arg(long)]
        gid: String,
        #[arg(long, value_enum)]
        kind: KindArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Product,
    ProductVariant,
    Collection,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Product => Self::Product,
            KindArg::ProductVariant => Self::ProductVariant,
            KindArg::Collection => Self::Collection,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = shopsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Apply { file } => run_apply(&config, &file).await,
        Commands::Show { gid, kind } => {
            let sanity = sanity_client_from_config(&config)?;
            run_show(&sanity, &gid, kind.into()).await
        }
    }
}

async fn run_apply(config: &AppConfig, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let request: SyncRequest = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid sync body", file.display()))?;

    let syncer = Syncer::new(
        shopify_client_from_config(config)?,
        sanity_client_from_config(config)?,
        SyncOptions::from_app_config(config),
    );
    tracing::info!(file = %file.display(), action = %request.action, "replaying sync body");
    let summary = syncer.run(request).await?;

    println!(
        "applied {} mutation(s): {} product(s), {} variant(s), {} collection(s), {} tombstoned",
        summary.mutations,
        summary.products,
        summary.variants,
        summary.collections,
        summary.tombstoned_variants
    );
    if let Some(tx) = summary.transaction_id {
        println!("transaction: {tx}");
    }
    Ok(())
}

async fn run_show(sanity: &SanityClient, gid: &str, kind: DocumentKind) -> anyhow::Result<()> {
    let id = build_document_id(kind, extract_external_id(gid)?);
    tracing::info!(id = %id, dataset = sanity.dataset(), "looking up document pair");
    for target in [id.as_str().to_owned(), id.draft()] {
        match sanity.get_document(&target).await? {
            Some(doc) => println!("{target}:\n{}", serde_json::to_string_pretty(&doc)?),
            None => println!("{target}: (absent)"),
        }
    }
    Ok(())
}
