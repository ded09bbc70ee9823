//! Cistern CLI
//!
//! Command-line interface for inspecting and demonstrating the cistern
//! drop ledger.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cistern_core::{derive_batch, AccountId};
use cistern_engine::{CisternConfig, CisternEngine};
use cistern_market::{FixedReserves, ReserveSnapshot};

#[derive(Parser)]
#[command(name = "cistern")]
#[command(author = "Cistern Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Cistern - pseudo-random drop ledger on a byte market", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted drop lifecycle against an in-memory engine
    Demo {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of drops to mint
        #[arg(short, long, default_value = "3")]
        drops: u32,

        /// Currency deposited to fund the mint
        #[arg(long, default_value = "1000")]
        deposit: i64,

        /// Entropy string for id derivation (random when omitted)
        #[arg(short, long)]
        entropy: Option<String>,

        /// Resource side of the market pool
        #[arg(long, default_value = "1000000")]
        resource_reserve: i64,

        /// Currency side of the market pool
        #[arg(long, default_value = "500000")]
        currency_reserve: i64,
    },

    /// Price an operation against a market snapshot
    Quote {
        /// Resource side of the market pool
        #[arg(long, default_value = "1000000")]
        resource_reserve: i64,

        /// Currency side of the market pool
        #[arg(long, default_value = "500000")]
        currency_reserve: i64,

        #[command(subcommand)]
        quote: QuoteCommands,
    },

    /// Derive drop ids without touching a ledger
    Derive {
        /// Number of ids to derive
        #[arg(short, long, default_value = "1")]
        amount: u32,

        /// Sequence offset to salt the derivation
        #[arg(short, long, default_value = "0")]
        sequence: u64,

        /// Entropy string (at least 32 characters)
        entropy: String,
    },

    /// Print the effective configuration
    Config {
        /// Configuration file path
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Version information
    Version,
}

#[derive(Subcommand)]
enum QuoteCommands {
    /// Purchase price of a byte amount, fee included
    Cost {
        /// Resource bytes to price
        bytes: i64,
    },
    /// Sale proceeds of a byte amount, after fees
    Proceeds {
        /// Resource bytes to sell
        bytes: i64,
    },
    /// Bytes a currency deposit would purchase
    Deposit {
        /// Currency amount deposited
        quantity: i64,
    },
    /// Cost of minting unbound drops
    Mint {
        /// Number of drops
        amount: u32,
    },
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false),
        )
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<CisternConfig> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => CisternConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn random_entropy() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Demo {
            config,
            drops,
            deposit,
            entropy,
            resource_reserve,
            currency_reserve,
        } => {
            if drops < 3 {
                anyhow::bail!("the demo script needs at least 3 drops");
            }
            let config = load_config(config.as_ref())?;
            let entropy = entropy.unwrap_or_else(random_entropy);
            let treasury = config.treasury.clone();
            let admin = config.admin.clone();
            let symbol = config.currency_symbol.clone();
            let reserves = Arc::new(FixedReserves::new(resource_reserve, currency_reserve));
            let engine = CisternEngine::with_system_clock(config, reserves)?;

            tracing::info!("╔══════════════════════════════════════════════════════╗");
            tracing::info!("║              CISTERN DROP LEDGER DEMO                ║");
            tracing::info!("╚══════════════════════════════════════════════════════╝");
            tracing::info!("Entropy: {}", entropy);
            tracing::info!("Reserves: {} bytes / {} currency", resource_reserve, currency_reserve);

            let alice = AccountId::new("alice")?;
            let bob = AccountId::new("bob")?;

            engine.enable(&admin, true)?;
            engine.open(&alice, &alice)?;

            // Fail early if the deposit cannot cover the mint.
            let needed = engine.system_state().units_per_drop * i64::from(drops);
            let buys = engine.quote_deposit_bytes(deposit);
            if buys < needed {
                anyhow::bail!(
                    "a {deposit} deposit buys {buys} bytes but {drops} drops need {needed}; \
                     raise --deposit"
                );
            }

            let outcome = engine.deposit(&alice, &treasury, deposit, &symbol, "alice")?;
            println!("Deposited {} {}: {:?}", deposit, symbol, outcome);

            let receipt = engine.generate(&alice, &alice, false, drops, &entropy, None)?;
            println!(
                "Minted {} drops for {} bytes ({} left):",
                receipt.ids.len(),
                receipt.bytes_charged,
                receipt.bytes_balance
            );
            for id in &receipt.ids {
                println!("  {}", id);
            }

            engine.transfer(&alice, &alice, &bob, &[receipt.ids[0]], "demo transfer")?;
            println!("Transferred {} to {}", receipt.ids[0], bob);

            let bound = engine.bind(&alice, &alice, &[receipt.ids[1]])?;
            println!(
                "Bound {} releasing {} bytes",
                receipt.ids[1], bound.bytes_released
            );

            let destroyed =
                engine.destroy(&alice, &alice, &[receipt.ids[1], receipt.ids[2]], "demo", None)?;
            println!(
                "Destroyed {} drops, reclaimed {} bytes",
                destroyed.destroyed, destroyed.bytes_reclaimed
            );

            let claim = engine.claim(&alice, &alice)?;
            println!("Claimed {} bytes: {:?}", claim.bytes, claim.payout);

            println!();
            println!("Side effects for the host to settle:");
            for (index, effect) in engine.drain_effects().iter().enumerate() {
                println!("  {}. {}", index + 1, effect);
            }

            println!();
            println!("Final state:");
            println!("{}", serde_json::to_string_pretty(&engine.stats())?);
        }

        Commands::Quote {
            resource_reserve,
            currency_reserve,
            quote,
        } => {
            let snap = ReserveSnapshot {
                resource: resource_reserve,
                currency: currency_reserve,
            };
            match quote {
                QuoteCommands::Cost { bytes } => {
                    let cost = cistern_market::resource_cost_with_fee(bytes, &snap)?;
                    println!("{} bytes cost {} (fee included)", bytes, cost);
                }
                QuoteCommands::Proceeds { bytes } => {
                    let proceeds = cistern_market::resource_proceeds_minus_fee(bytes, &snap);
                    println!("{} bytes sell for {} (after fees)", bytes, proceeds);
                }
                QuoteCommands::Deposit { quantity } => {
                    let bytes = cistern_market::deposit_bytes(quantity, &snap);
                    println!("A {} deposit buys {} bytes", quantity, bytes);
                }
                QuoteCommands::Mint { amount } => {
                    let config = CisternConfig::default();
                    let bytes = config.units_per_drop * i64::from(amount);
                    let cost = cistern_market::resource_cost_with_fee(bytes, &snap)?;
                    println!(
                        "{} drops occupy {} bytes and cost {} (fee included)",
                        amount, bytes, cost
                    );
                }
            }
        }

        Commands::Derive {
            amount,
            sequence,
            entropy,
        } => {
            if entropy.len() < cistern_core::constants::MIN_ENTROPY_LEN {
                anyhow::bail!(
                    "entropy must be at least {} characters",
                    cistern_core::constants::MIN_ENTROPY_LEN
                );
            }
            for id in derive_batch(amount, sequence, &entropy) {
                println!("{}", id);
            }
        }

        Commands::Config { path } => {
            let config = load_config(path.as_ref())?;
            print!("{}", toml::to_string_pretty(&config)?);
        }

        Commands::Version => {
            println!("Cistern v{}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Features:");
            println!("  - Pseudo-random drop minting (SHA-256 derivation)");
            println!("  - Bancor-priced resource byte market");
            println!("  - Bind/unbind storage accounting");
            println!("  - Treasury-mirrored supply tracking");
        }
    }

    Ok(())
}
