//! # Pantry CLI (`pantry`)
//!
//! Normalizes free-text ingredient lists against a canonical catalog and
//! finds the stored recipe that needs the fewest extra ingredients.
//!
//! ## Usage
//!
//! ```bash
//! pantry --config ./config/pantry.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pantry init [--catalog FILE]` | Create the SQLite database, optionally seeding the catalog |
//! | `pantry catalog list` | Print every canonical ingredient and its aliases |
//! | `pantry catalog check` | Report duplicate names and overlapping aliases |
//! | `pantry catalog add <name>` | Add a canonical ingredient |
//! | `pantry catalog alias <name> <alias>...` | Attach aliases to an ingredient |
//! | `pantry normalize <phrase>...` | Normalize ingredient phrases |
//! | `pantry find --allowed N <phrase>...` | Closest recipe for an ingredient list |
//! | `pantry import <recipes.json>` | Normalize and store raw recipes |
//! | `pantry serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! pantry init --catalog ./data/ingredients.json
//! pantry import ./data/recipes.json
//! pantry normalize "2 large eggs" "1 cup flour" "water"
//! pantry find --allowed 2 "2 eggs" "flour" "milk"
//! pantry serve
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pantry_match::{catalog_cmd, config, import, query_cmd, server};

/// Pantry: ingredient normalization and recipe matching.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pantry.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pantry",
    about = "Pantry: ingredient normalization and recipe matching",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pantry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent. With `--catalog`, replaces the SQLite ingredient table
    /// with the records of a JSON file after validating them.
    Init {
        /// JSON file of `{name, alias}` records to seed the catalog with.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Inspect and edit the ingredient catalog.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Normalize ingredient phrases to canonical names.
    Normalize {
        /// Raw phrases, e.g. "2 cups all-purpose flour".
        #[arg(required = true)]
        phrases: Vec<String>,

        /// Print the `{matched, unmatched}` JSON response.
        #[arg(long)]
        json: bool,
    },

    /// Find the stored recipe missing the fewest of the given ingredients.
    Find {
        /// Maximum number of missing ingredients to accept.
        #[arg(long, default_value_t = 0)]
        allowed: usize,

        /// Raw phrases of the ingredients on hand.
        #[arg(required = true)]
        phrases: Vec<String>,

        /// Print the find-recipe JSON response.
        #[arg(long)]
        json: bool,
    },

    /// Normalize and store recipes from a JSON file.
    ///
    /// The file holds `[{recipe_name, source_url, ingredients}]`. Recipes
    /// with too many unknown ingredients are rejected; already stored
    /// `source_url`s are skipped.
    Import {
        path: PathBuf,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List canonical ingredients and their aliases.
    List,
    /// Report duplicate names and aliases shared between entries.
    Check,
    /// Add a canonical ingredient with no aliases.
    Add { name: String },
    /// Attach aliases to an existing ingredient.
    Alias {
        name: String,
        #[arg(required = true)]
        aliases: Vec<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init { catalog } => {
            catalog_cmd::run_init(&cfg, catalog.as_deref()).await?;
        }
        Commands::Catalog { action } => match action {
            CatalogAction::List => catalog_cmd::run_catalog_list(&cfg).await?,
            CatalogAction::Check => catalog_cmd::run_catalog_check(&cfg).await?,
            CatalogAction::Add { name } => catalog_cmd::run_catalog_add(&cfg, &name).await?,
            CatalogAction::Alias { name, aliases } => {
                catalog_cmd::run_catalog_alias(&cfg, &name, &aliases).await?
            }
        },
        Commands::Normalize { phrases, json } => {
            query_cmd::run_normalize(&cfg, phrases, json).await?;
        }
        Commands::Find {
            allowed,
            phrases,
            json,
        } => {
            query_cmd::run_find(&cfg, phrases, allowed, json).await?;
        }
        Commands::Import { path } => {
            import::run_import(&cfg, &path).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
