//! Storefront Klaviyo CLI - drive the dispatcher from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Identify a customer (replays events queued before)
//! klaviyo-cli identify -e jo@example.com --first-name Jo
//!
//! # Track an event
//! klaviyo-cli track "Viewed Product" --data '{"SKU": "SOAP"}'
//!
//! # Newsletter
//! klaviyo-cli status jo@example.com
//! klaviyo-cli subscribe jo@example.com
//! klaviyo-cli unsubscribe jo@example.com
//!
//! # Back in stock
//! klaviyo-cli back-in-stock subscribe -e jo@example.com --id 42 --sku SER-30
//!
//! # Forget the cached customer
//! klaviyo-cli reset
//! ```
//!
//! Configuration comes from the `KLAVIYO_*` environment variables read by
//! `ClientConfig::from_env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use storefront_klaviyo_client::BackInStockRequest;
use storefront_klaviyo_core::{Product, User};

mod commands;

#[derive(Parser)]
#[command(name = "klaviyo-cli")]
#[command(author, version, about = "Storefront Klaviyo CLI tools")]
struct Cli {
    /// Directory holding the customer, queued events and watch list
    #[arg(long, env = "KLAVIYO_CACHE_DIR", default_value = ".klaviyo-cache")]
    cache_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify a customer to Klaviyo
    Identify {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Extra customer property as `key=value` (repeatable)
        #[arg(short, long = "property")]
        properties: Vec<String>,
    },
    /// Track an event for the identified customer
    Track {
        /// Event name, e.g. "Viewed Product"
        event: String,

        /// Event properties as a JSON object
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Show whether an email is on the newsletter list
    Status { email: String },
    /// Subscribe an email to the newsletter
    Subscribe { email: String },
    /// Subscribe with an optional phone number (SMS consent)
    SubscribeAdvanced {
        email: String,

        #[arg(long)]
        phone: Option<String>,
    },
    /// Unsubscribe an email from the newsletter
    Unsubscribe { email: String },
    /// Manage back-in-stock notifications
    BackInStock {
        #[command(subcommand)]
        action: BackInStockAction,
    },
    /// Forget the cached customer and watch list
    Reset,
}

#[derive(Subcommand)]
enum BackInStockAction {
    /// Get notified when a product is back in stock
    Subscribe(ProductArgs),
    /// Stop back-in-stock notifications
    Unsubscribe(ProductArgs),
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(short, long)]
    email: String,

    /// Catalog product ID
    #[arg(long)]
    id: u64,

    #[arg(long)]
    sku: String,

    /// Parent SKU of a configurable product's child
    #[arg(long)]
    parent_sku: Option<String>,

    /// Also sign up for the newsletter (unsubscribe only)
    #[arg(long)]
    newsletter: bool,
}

impl ProductArgs {
    fn into_request(self) -> BackInStockRequest {
        let product = Product {
            id: self.id,
            sku: self.sku,
            parent_sku: self.parent_sku,
            ..Product::default()
        };
        let mut request = BackInStockRequest::new(product, self.email);
        request.subscribe_for_newsletter = self.newsletter;
        request
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    let klaviyo = commands::dispatcher(&cli.cache_dir).await?;

    match cli.command {
        Commands::Identify {
            email,
            first_name,
            last_name,
            phone,
            properties,
        } => {
            let user = User {
                id: None,
                email,
                firstname: first_name,
                lastname: last_name,
                telephone: phone,
            };
            commands::identity::identify(&klaviyo, user, &properties).await?;
        }
        Commands::Track { event, data } => {
            commands::identity::track(&klaviyo, &event, data.as_deref()).await?;
        }
        Commands::Status { email } => commands::newsletter::status(&klaviyo, &email).await?,
        Commands::Subscribe { email } => commands::newsletter::subscribe(&klaviyo, email).await?,
        Commands::SubscribeAdvanced { email, phone } => {
            commands::newsletter::subscribe_advanced(&klaviyo, email, phone).await?;
        }
        Commands::Unsubscribe { email } => {
            commands::newsletter::unsubscribe(&klaviyo, &email).await?;
        }
        Commands::BackInStock { action } => match action {
            BackInStockAction::Subscribe(args) => {
                commands::back_in_stock::subscribe(&klaviyo, &args.into_request()).await?;
            }
            BackInStockAction::Unsubscribe(args) => {
                commands::back_in_stock::unsubscribe(&klaviyo, &args.into_request()).await?;
            }
        },
        Commands::Reset => commands::reset(&klaviyo).await,
    }
    Ok(())
}
