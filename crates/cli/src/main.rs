//! Blossom CLI - Storefront client from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (the session is kept in BLOSSOM_SESSION_FILE)
//! blossom login -u florist -p secret1
//!
//! # Browse the catalog
//! blossom products list --size 10
//! blossom products show 3
//!
//! # Fill the cart and check out, paying by card
//! blossom cart add 3 --quantity 2
//! blossom order checkout --method shipping --name Kim --phone 010-1234-5678 \
//!     --address "Seoul" --pay card
//!
//! # Buy a single product directly
//! blossom order direct 3 --method pickup --name Kim --phone 010-1234-5678 --address "Seoul"
//!
//! # Retry a failed order with the key it printed
//! blossom order direct 3 --method pickup --name Kim --phone 010-1234-5678 --address "Seoul" \
//!     --idempotency-key 5f0c2b7e-3d4a-4c1b-9e8f-0a1b2c3d4e5f
//! ```
//!
//! # Environment Variables
//!
//! - `BLOSSOM_API_URL` - Backend origin (required)
//! - `BLOSSOM_SESSION_FILE` - Where the signed-in session is stored
//! - `BLOSSOM_SUBMIT_RETRIES` - Automatic retries of a failed checkout
//! - `SENTRY_DSN` - Enables Sentry error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use blossom_core::{
    CartItemId, DeliveryMethod, IdempotencyKey, OptionId, OrderId, PaymentMethod, ProductId, StoreId,
};
use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "blossom")]
#[command(author, version, about = "Blossom storefront client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        /// Login ID
        #[arg(short = 'u', long)]
        login_id: String,

        /// Password
        #[arg(short, long, env = "BLOSSOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in member
    Whoami,
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Find partner stores
    Stores {
        #[command(subcommand)]
        action: StoreAction,
    },
    /// Show category and delivery-type codes
    Codes,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Review placed orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products, one page at a time
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size
        #[arg(long, default_value_t = 20)]
        size: u32,

        /// Sort expression (e.g. `price,asc`)
        #[arg(long)]
        sort: Option<String>,

        /// Only products in this category
        #[arg(long)]
        category_id: Option<i64>,
    },
    /// Show one product
    Show { id: ProductId },
    /// List a product's options
    Options { id: ProductId },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Stores within a radius of a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Search radius in kilometers
        #[arg(long, default_value_t = 5.0)]
        radius_km: f64,

        /// Filter by name or address
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Show one store
    Show { id: StoreId },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: i64,

        /// Option ID (repeatable)
        #[arg(short, long = "option")]
        options: Vec<OptionId>,
    },
    /// Change a line's quantity
    Qty { item_id: CartItemId, quantity: i64 },
    /// Remove a line
    Remove { item_id: CartItemId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Buy one product without the cart
    Direct {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: i64,

        /// Option ID (repeatable)
        #[arg(short, long = "option")]
        options: Vec<OptionId>,

        #[command(flatten)]
        delivery: DeliveryArgs,

        /// Pay right after the order is placed
        #[arg(long)]
        pay: Option<PaymentMethod>,

        #[command(flatten)]
        resume: ResumeArgs,
    },
    /// Order everything in the cart
    Checkout {
        #[command(flatten)]
        delivery: DeliveryArgs,

        /// Pay right after the order is placed
        #[arg(long)]
        pay: Option<PaymentMethod>,

        #[command(flatten)]
        resume: ResumeArgs,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// The signed-in member's orders
    List,
    /// Show one order
    Show { id: OrderId },
    /// Cancel an order
    Cancel { id: OrderId },
}

/// Keys printed by an earlier run whose outcome is unknown.
#[derive(Args)]
struct ResumeArgs {
    /// Retry an earlier order under the key it printed
    #[arg(long, value_name = "KEY")]
    idempotency_key: Option<IdempotencyKey>,

    /// Retry an earlier payment under the key it printed
    #[arg(long, value_name = "KEY", requires = "pay")]
    payment_key: Option<IdempotencyKey>,
}

impl From<ResumeArgs> for commands::order::Resume {
    fn from(args: ResumeArgs) -> Self {
        Self {
            order_key: args.idempotency_key,
            payment_key: args.payment_key,
        }
    }
}

/// Delivery fields shared by both order commands.
#[derive(Args)]
struct DeliveryArgs {
    /// `pickup`, `shipping`, or `quick`
    #[arg(long)]
    method: DeliveryMethod,

    /// Recipient name
    #[arg(long)]
    name: String,

    /// Recipient phone
    #[arg(long)]
    phone: String,

    /// Delivery or pickup address
    #[arg(long)]
    address: String,

    /// Requested time, e.g. `2025-03-01T10:00:00`
    #[arg(long)]
    reserved_at: Option<String>,

    /// Text for the message card
    #[arg(long)]
    message_card: Option<String>,

    /// Note for the courier
    #[arg(long)]
    note: Option<String>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blossom_storefront=info,blossom_cli=info".into());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    // Logs go to stderr so command output stays pipeable
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // SENTRY_DSN may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();
    init_tracing(cli.json_logs);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::from_env()?;

    match cli.command {
        Commands::Login { login_id, password } => {
            commands::auth::login(&ctx, &login_id, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&ctx)?,
        Commands::Whoami => commands::auth::whoami(&ctx),
        Commands::Products { action } => match action {
            ProductAction::List {
                page,
                size,
                sort,
                category_id,
            } => commands::catalog::list(&ctx, page, size, sort, category_id).await?,
            ProductAction::Show { id } => commands::catalog::show(&ctx, id).await?,
            ProductAction::Options { id } => commands::catalog::options(&ctx, id).await?,
        },
        Commands::Stores { action } => match action {
            StoreAction::Nearby {
                lat,
                lon,
                radius_km,
                keyword,
            } => commands::stores::nearby(&ctx, lat, lon, radius_km, keyword).await?,
            StoreAction::Show { id } => commands::stores::show(&ctx, id).await?,
        },
        Commands::Codes => commands::catalog::codes(&ctx).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&ctx).await?,
            CartAction::Add {
                product_id,
                quantity,
                options,
            } => commands::cart::add(&ctx, product_id, quantity, options).await?,
            CartAction::Qty { item_id, quantity } => {
                commands::cart::set_quantity(&ctx, item_id, quantity).await?;
            }
            CartAction::Remove { item_id } => commands::cart::remove(&ctx, item_id).await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Direct {
                product_id,
                quantity,
                options,
                delivery,
                pay,
                resume,
            } => {
                commands::order::direct(
                    &ctx,
                    product_id,
                    quantity,
                    options,
                    delivery.into_details(),
                    pay,
                    resume.into(),
                )
                .await?;
            }
            OrderAction::Checkout {
                delivery,
                pay,
                resume,
            } => {
                commands::order::checkout(&ctx, delivery.into_details(), pay, resume.into()).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::order::list(&ctx).await?,
            OrdersAction::Show { id } => commands::order::show(&ctx, id).await?,
            OrdersAction::Cancel { id } => commands::order::cancel(&ctx, id).await?,
        },
    }
    Ok(())
}

impl DeliveryArgs {
    fn into_details(self) -> blossom_storefront::types::DeliveryDetails {
        let mut details = blossom_storefront::types::DeliveryDetails::new(
            self.method,
            self.name,
            self.phone,
            self.address,
        );
        details.reserved_at = self.reserved_at;
        details.message_card = self.message_card;
        details.delivery_note = self.note;
        details
    }
}
