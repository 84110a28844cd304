//! ec2-rolemap: populate a remote-execution inventory from EC2 tags
//!
//! Queries EC2 for instances matching a tag filter and writes the
//! resulting host/role mapping into a JSON inventory file, or prints it
//! to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use ec2_rolemap::aws::Ec2InstanceSource;
use ec2_rolemap::credentials::resolve_credentials;
use ec2_rolemap::inventory::Inventory;
use ec2_rolemap::provider::AddressField;
use ec2_rolemap::resolver::update_roles;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ec2-rolemap")]
#[command(about = "Populate host/role mappings from EC2 instance tags")]
#[command(version)]
struct Args {
    /// Tag key to group instances by ("__all__" matches every instance)
    #[arg(short, long)]
    tag: String,

    /// Exact tag value to match (any value if omitted)
    #[arg(long)]
    tag_value: Option<String>,

    /// Instance attribute used as the host address
    #[arg(long, default_value = "public_dns_name")]
    address_field: String,

    /// AWS access key id (falls back to environment, then inventory vars)
    #[arg(long)]
    aws_access_key_id: Option<String>,

    /// AWS secret access key (falls back to environment, then inventory vars)
    #[arg(long)]
    aws_secret_access_key: Option<String>,

    /// AWS region
    #[arg(long, default_value = "us-east-2")]
    region: String,

    /// Inventory JSON file to update in place (prints to stdout if omitted)
    #[arg(long)]
    inventory: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let field: AddressField = args.address_field.parse()?;

    let mut inventory = match &args.inventory {
        Some(path) if path.exists() => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read inventory {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse inventory {}", path.display()))?
        }
        _ => Inventory::default(),
    };

    let credentials = resolve_credentials(
        args.aws_access_key_id.as_deref(),
        args.aws_secret_access_key.as_deref(),
        &inventory,
    )?;

    let source = Ec2InstanceSource::new(&args.region, credentials).await;

    update_roles(
        &source,
        &mut inventory,
        &args.tag,
        args.tag_value.as_deref(),
        field,
    )
    .await?;

    match &args.inventory {
        Some(path) => {
            let data = serde_json::to_string_pretty(&inventory)?;
            std::fs::write(path, data)
                .with_context(|| format!("Failed to write inventory {}", path.display()))?;
            info!(path = %path.display(), "Inventory updated");
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&inventory)?);
        }
    }

    Ok(())
}
