//! divvy: command-line driver for a dividend-paying NFT collection.
//!
//! Every invocation loads the persisted collection, applies one command, and
//! saves the result. Holders are 40-hex-char ids or free-form labels.

mod config;
mod input;
mod replay;
mod state;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use divvy_collection::{Bank, DividendPayingCollection, SnapshotStore};
use divvy_core::amount::format_amount;
use divvy_core::types::{Amount, HolderId, TokenId};
use serde_json::json;
use tracing::info;

use crate::config::{CliConfig, Overrides};
use crate::input::{parse_holder, parse_value};
use crate::state::Session;

/// Dividend-paying NFT collection driver.
#[derive(Parser)]
#[command(name = "divvy", version, about = "O(1) dividends for NFT holders")]
struct Cli {
    /// Config file (default: <data-dir>/divvy.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persisted collection.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json").
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint new tokens to a holder.
    Mint(MintArgs),
    /// Move one token between holders.
    Transfer(TransferArgs),
    /// Approve an address to move one token.
    Approve(ApproveArgs),
    /// Grant or revoke an operator over all of an owner's tokens.
    ApproveAll(ApproveAllArgs),
    /// Distribute value across all current token holders.
    Distribute(DistributeArgs),
    /// Pay a holder their withdrawable dividend.
    Withdraw(HolderArg),
    /// Make a holder refuse (or accept again) payouts.
    Reject(RejectArgs),
    /// Show one holder's tokens and dividends.
    Show(ShowArgs),
    /// Show collection-wide totals.
    Status(JsonFlag),
    /// List the event log.
    Events(EventsArgs),
    /// Apply a JSON list of operations atomically.
    Replay(ReplayArgs),
    /// Delete the persisted collection.
    Reset,
}

#[derive(Args)]
struct MintArgs {
    /// Recipient (and caller) of the mint.
    to: String,
    /// Number of tokens.
    amount: u64,
}

#[derive(Args)]
struct TransferArgs {
    from: String,
    to: String,
    /// Token id.
    token: u64,
    /// Caller, when moving on the owner's behalf (default: the owner).
    #[arg(long)]
    caller: Option<String>,
}

#[derive(Args)]
struct ApproveArgs {
    owner: String,
    approved: String,
    token: u64,
}

#[derive(Args)]
struct ApproveAllArgs {
    owner: String,
    operator: String,
    /// Revoke instead of grant.
    #[arg(long)]
    revoke: bool,
}

#[derive(Args)]
struct DistributeArgs {
    /// Payer of the distribution.
    payer: String,
    /// Value in whole coins (e.g. 1.5), or units with --raw.
    value: String,
    /// Interpret the value as raw units.
    #[arg(long)]
    raw: bool,
    /// Send as a plain value transfer instead of an explicit distribution.
    #[arg(long)]
    receive: bool,
}

#[derive(Args)]
struct HolderArg {
    holder: String,
}

#[derive(Args)]
struct RejectArgs {
    holder: String,
    /// Accept payouts again.
    #[arg(long)]
    accept: bool,
}

#[derive(Args)]
struct ShowArgs {
    holder: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct JsonFlag {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EventsArgs {
    /// Only the last N events.
    #[arg(long)]
    last: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ReplayArgs {
    /// Path to the JSON script.
    file: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = CliConfig::load(&Overrides {
        config_file: cli.config,
        data_dir: cli.data_dir,
        log_level: cli.log_level,
        log_format: cli.log_format,
    })?;
    init_logging(&cfg.log_level, &cfg.log_format);

    let store = SnapshotStore::new(cfg.state_path());
    if let Commands::Reset = cli.command {
        if store.remove().context("failed to delete state")? {
            println!("Removed {}", store.path().display());
        } else {
            println!("Nothing to remove at {}", store.path().display());
        }
        return Ok(());
    }

    let mut session = Session::open(store)?;
    let before = session.collection.events().len();
    let mutated = run(&mut session.collection, cli.command)?;
    if mutated {
        session.save()?;
        for event in &session.collection.events()[before..] {
            println!("{event}");
        }
    }
    Ok(())
}

/// Execute one command. Returns whether the collection changed.
fn run(c: &mut DividendPayingCollection<Bank>, command: Commands) -> Result<bool> {
    match command {
        Commands::Mint(args) => {
            let to = parse_holder(&args.to)?;
            let ids = c.mint(&to, args.amount)?;
            info!(holder = %to, count = ids.len(), "minted");
        }
        Commands::Transfer(args) => {
            let from = parse_holder(&args.from)?;
            let caller = match &args.caller {
                Some(caller) => parse_holder(caller)?,
                None => from,
            };
            c.transfer_from(&caller, &from, &parse_holder(&args.to)?, TokenId(args.token))?;
        }
        Commands::Approve(args) => {
            c.approve(
                &parse_holder(&args.owner)?,
                &parse_holder(&args.approved)?,
                TokenId(args.token),
            )?;
        }
        Commands::ApproveAll(args) => {
            c.set_approval_for_all(
                &parse_holder(&args.owner)?,
                &parse_holder(&args.operator)?,
                !args.revoke,
            )?;
        }
        Commands::Distribute(args) => {
            let payer = parse_holder(&args.payer)?;
            let value = parse_value(&args.value, args.raw)?;
            if args.receive {
                c.receive(&payer, value)?;
            } else {
                c.distribute_dividends(&payer, value)?;
            }
            if value == 0 {
                println!("Nothing distributed");
            }
        }
        Commands::Withdraw(args) => {
            let holder = parse_holder(&args.holder)?;
            if c.withdraw_dividend(&holder)? == 0 {
                println!("Nothing to withdraw for {holder}");
            }
        }
        Commands::Reject(args) => {
            let holder = parse_holder(&args.holder)?;
            c.payout_mut().set_rejecting(&holder, !args.accept);
            println!(
                "{holder} now {} payouts",
                if args.accept { "accepts" } else { "rejects" }
            );
        }
        Commands::Show(args) => {
            show(c, &parse_holder(&args.holder)?, args.json)?;
            return Ok(false);
        }
        Commands::Status(args) => {
            status(c, args.json)?;
            return Ok(false);
        }
        Commands::Events(args) => {
            let events = c.events();
            let start = args.last.map_or(0, |n| events.len().saturating_sub(n));
            for (index, event) in events.iter().enumerate().skip(start) {
                if args.json {
                    let line = json!({
                        "index": index,
                        "event": event.name(),
                        "detail": event.to_string(),
                    });
                    println!("{}", serde_json::to_string(&line)?);
                } else {
                    println!("{index:>6}  {event}");
                }
            }
            return Ok(false);
        }
        Commands::Replay(args) => {
            let script = std::fs::read_to_string(&args.file)
                .with_context(|| format!("failed to read {}", args.file.display()))?;
            let ops = replay::parse_script(&script)?;
            if ops.is_empty() {
                bail!("replay file {} contains no operations", args.file.display());
            }
            replay::apply_all(c, &ops)?;
        }
        // Handled before the session is opened.
        Commands::Reset => return Ok(false),
    }
    Ok(true)
}

fn show(c: &DividendPayingCollection<Bank>, holder: &HolderId, as_json: bool) -> Result<()> {
    let tokens: Vec<u64> = c.tokens_of(holder).iter().map(|t| t.0).collect();
    let accumulative = c.accumulative_dividend_of(holder);
    let withdrawable = c.withdrawable_dividend_of(holder);
    let withdrawn = c.withdrawn_dividend_of(holder);
    let paid = c.payout().balance_of(holder);

    if as_json {
        let out = json!({
            "holder": holder.to_string(),
            "balance": c.balance_of(holder),
            "tokens": tokens,
            "accumulative": accumulative.to_string(),
            "withdrawable": withdrawable.to_string(),
            "withdrawn": withdrawn.to_string(),
            "bank_balance": paid.to_string(),
            "rejecting": c.payout().is_rejecting(holder),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Holder:       {holder}");
    println!("Tokens:       {} {:?}", c.balance_of(holder), tokens);
    println!("Accumulative: {}", format_amount(accumulative));
    println!("Withdrawable: {}", format_amount(withdrawable));
    println!("Withdrawn:    {}", format_amount(withdrawn));
    println!("Bank balance: {}", format_amount(paid));
    if c.payout().is_rejecting(holder) {
        println!("Payouts:      rejected");
    }
    Ok(())
}

fn status(c: &DividendPayingCollection<Bank>, as_json: bool) -> Result<()> {
    let holders = c.registry().holders();
    let payees: Vec<(&HolderId, &Amount)> = c.payout().accounts().collect();
    if as_json {
        let out = json!({
            "total_supply": c.total_supply(),
            "holders": holders.len(),
            "next_token_id": c.registry().next_token_id(),
            "total_distributed": c.total_distributed().to_string(),
            "vault": c.vault().to_string(),
            "paid_out": c.payout().paid_out().to_string(),
            "payees": payees.len(),
            "events": c.events().len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Total supply:      {}", c.total_supply());
    println!("Holders:           {}", holders.len());
    println!("Total distributed: {}", format_amount(c.total_distributed()));
    println!("Vault:             {}", format_amount(c.vault()));
    println!("Paid out:          {}", format_amount(c.payout().paid_out()));
    println!("Events:            {}", c.events().len());
    if !holders.is_empty() {
        println!();
        for holder in holders {
            println!(
                "  {holder}  {:>4} tokens  {} withdrawable",
                c.balance_of(&holder),
                format_amount(c.withdrawable_dividend_of(&holder))
            );
        }
    }
    if !payees.is_empty() {
        println!();
        println!("Paid to:");
        for (payee, amount) in payees {
            println!("  {payee}  {}", format_amount(*amount));
        }
    }
    Ok(())
}

/// Initialise the tracing subscriber. `RUST_LOG` overrides `level_str`.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
