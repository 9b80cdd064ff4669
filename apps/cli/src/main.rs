use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::InventoryClient;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "ims", about = "Command line client for the inventory management API")]
struct Cli {
    /// Settings file; `./ims.toml` is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    #[command(subcommand)]
    Categories(CategoryCommand),
    #[command(subcommand)]
    CatalogueItems(CatalogueItemCommand),
    #[command(subcommand)]
    Systems(SystemCommand),
    #[command(subcommand)]
    Items(ItemCommand),
    #[command(subcommand)]
    Manufacturers(ManufacturerCommand),
    #[command(subcommand)]
    Units(ValueCommand),
    #[command(subcommand)]
    UsageStatuses(ValueCommand),
    #[command(subcommand)]
    Spares(SparesCommand),
    #[command(subcommand)]
    TableState(TableStateCommand),
}

/// Nodes to copy or move, and where to put them.
#[derive(Args, Debug)]
pub(crate) struct TransferArgs {
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Destination parent; the top level when omitted.
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct SaveAsArgs {
    pub id: String,
    /// Defaults to the first free `<name>_copy_<n>`.
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CategoryCommand {
    List {
        #[arg(long)]
        parent: Option<String>,
    },
    Tree {
        #[arg(long)]
        root: Option<String>,
        #[arg(long, default_value_t = 8)]
        depth: usize,
    },
    Copy(TransferArgs),
    Move(TransferArgs),
    SaveAs(SaveAsArgs),
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum CatalogueItemCommand {
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Copy(TransferArgs),
    Move(TransferArgs),
    SaveAs(SaveAsArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum SystemCommand {
    List {
        #[arg(long)]
        parent: Option<String>,
    },
    Copy(TransferArgs),
    Move(TransferArgs),
    SaveAs(SaveAsArgs),
}

#[derive(Subcommand, Debug)]
pub(crate) enum ItemCommand {
    List {
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        catalogue_item: Option<String>,
    },
    Move {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ManufacturerCommand {
    List,
    Create(ManufacturerArgs),
    Delete { id: String },
}

#[derive(Args, Debug)]
pub(crate) struct ManufacturerArgs {
    pub name: String,
    #[arg(long, default_value = "")]
    pub url: String,
    #[arg(long, default_value = "")]
    pub address_line: String,
    #[arg(long, default_value = "")]
    pub town: String,
    #[arg(long, default_value = "")]
    pub county: String,
    #[arg(long, default_value = "")]
    pub postcode: String,
    #[arg(long, default_value = "")]
    pub country: String,
    #[arg(long, default_value = "")]
    pub telephone: String,
}

/// Units and usage statuses share one shape.
#[derive(Subcommand, Debug)]
pub(crate) enum ValueCommand {
    List,
    Create { value: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub(crate) enum SparesCommand {
    Show,
    /// Replaces the set of usage statuses counted as spares.
    Set {
        #[arg(required = true)]
        usage_status_ids: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum TableStateCommand {
    /// Applies changes to the table state carried by `url`.
    Encode {
        url: String,
        /// `column=value`; the value is read as JSON when it parses, and
        /// `null` clears the filter.
        #[arg(long = "filter")]
        filters: Vec<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, requires = "sort")]
        desc: bool,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page_index: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long, default_value = shared::table_state::DEFAULT_STATE_PARAM)]
        param: String,
    },
    Decode {
        url: String,
        #[arg(long, default_value = shared::table_state::DEFAULT_STATE_PARAM)]
        param: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?.with_api_url(cli.api_url)?;
    init_tracing(&settings.log_filter);

    let client = InventoryClient::with_options(settings.client_options())
        .context("failed to build api client")?;
    debug!(api_url = %client.base_url(), "ims: client ready");

    commands::run(&client, cli.command, cli.json).await
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
