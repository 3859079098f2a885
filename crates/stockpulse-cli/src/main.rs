//! StockPulse CLI - restaurant inventory tracking from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use stockpulse_config_and_utils::{init_logging, Config, Paths};

/// StockPulse CLI for authentication, onboarding, and inventory.
#[derive(Parser)]
#[command(name = "stockpulse")]
#[command(about = "Track restaurant inventory with low-stock alerts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the
    /// configured level, or "warn"
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign up with email and password
    Signup,

    /// Sign in with email and password
    Login,

    /// Sign out and clear the local session
    Logout,

    /// Show the current auth and restaurant state
    Status,

    /// Request a password recovery email
    ResetPassword,

    /// Set a new password for the current session
    UpdatePassword,

    /// Create your restaurant
    Onboard {
        /// Restaurant display name
        #[arg(long)]
        name: Option<String>,
        /// URL slug (derived from the name when omitted)
        #[arg(long)]
        slug: Option<String>,
    },

    /// Manage inventory items
    Inventory {
        #[command(subcommand)]
        command: InventoryCommands,
    },
}

#[derive(Subcommand)]
enum InventoryCommands {
    /// List all items with stock status
    List,

    /// Show items at or below their minimum stock level
    Alerts,

    /// Add a new item
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        unit: String,
        #[arg(long)]
        min_stock: f64,
    },

    /// Edit an item's fields
    Edit {
        /// Item id
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        min_stock: Option<f64>,
    },

    /// Remove an item
    Remove {
        /// Item id
        id: i64,
    },

    /// Increase an item's quantity
    Inc {
        /// Item id
        id: i64,
        /// Amount to add
        #[arg(long, default_value_t = 1.0)]
        by: f64,
    },

    /// Decrease an item's quantity (never below zero)
    Dec {
        /// Item id
        id: i64,
        /// Amount to subtract
        #[arg(long, default_value_t = 1.0)]
        by: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.clone().unwrap_or_else(|| {
        Paths::new()
            .ok()
            .and_then(|paths| Config::load(&paths).ok())
            .map(|config| config.log_level)
            .unwrap_or_else(|| "warn".to_string())
    });
    init_logging(&log_level);

    let format = cli.format;
    match cli.command {
        Commands::Signup => commands::auth::signup(&format).await,
        Commands::Login => commands::auth::login(&format).await,
        Commands::Logout => commands::auth::logout(&format).await,
        Commands::Status => commands::auth::status(&format).await,
        Commands::ResetPassword => commands::auth::reset_password(&format).await,
        Commands::UpdatePassword => commands::auth::update_password(&format).await,
        Commands::Onboard { name, slug } => commands::onboard::onboard(name, slug, &format).await,
        Commands::Inventory { command } => match command {
            InventoryCommands::List => commands::inventory::list(&format).await,
            InventoryCommands::Alerts => commands::inventory::show_alerts(&format).await,
            InventoryCommands::Add {
                name,
                category,
                quantity,
                unit,
                min_stock,
            } => {
                commands::inventory::add(name, category, quantity, unit, min_stock, &format).await
            }
            InventoryCommands::Edit {
                id,
                name,
                category,
                quantity,
                unit,
                min_stock,
            } => {
                commands::inventory::edit(id, name, category, quantity, unit, min_stock, &format)
                    .await
            }
            InventoryCommands::Remove { id } => commands::inventory::remove(id, &format).await,
            InventoryCommands::Inc { id, by } => {
                commands::inventory::adjust(id, by, &format).await
            }
            InventoryCommands::Dec { id, by } => {
                commands::inventory::adjust(id, -by, &format).await
            }
        },
    }
}
