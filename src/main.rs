//! LP Autopilot
//!
//! Main entry point. Loads `.env` credentials and the optional TOML strategy
//! file, connects to the node, checks the chain id, and runs liquidity rounds
//! in the selected mode until `--rounds` is reached or Ctrl-C is pressed.
//!
//! Ctrl-C is observed between rounds: a round that has started submitting
//! transactions runs to completion first.
//!
//! Only one bot runs per pid file. `--status` reports on it and exits.
//!
//! Created: 2026-10-18

use alloy::primitives::utils::format_ether;
use alloy::providers::{Provider, ProviderBuilder};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lp_autopilot::chain::{ChainClient, RpcChain};
use lp_autopilot::execution::{Account, StepExecutor};
use lp_autopilot::instance::{self, InstanceLock, InstanceStatus};
use lp_autopilot::scheduler::{RemovalCounter, SystemClock};
use lp_autopilot::{BotSettings, ChainConfig, OperationComposer, OperationKind, RoundScheduler, StrategyFile};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Wrap and add liquidity
    Lp,
    /// Wrap and swap
    Swap,
    /// Swap, then add the received tokens as liquidity
    SwapLp,
    /// Split a budget with reverse-quote sizing, then add liquidity
    Balanced,
}

impl Mode {
    fn name(self) -> &'static str {
        match self {
            Mode::Lp => "lp",
            Mode::Swap => "swap",
            Mode::SwapLp => "swap-lp",
            Mode::Balanced => "balanced",
        }
    }
}

impl From<Mode> for OperationKind {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Lp => OperationKind::WrapAddLiquidity,
            Mode::Swap => OperationKind::WrapSwap,
            Mode::SwapLp => OperationKind::SwapAddLiquidity,
            Mode::Balanced => OperationKind::Balanced,
        }
    }
}

/// Unattended wrap/swap/liquidity rounds against a Uniswap-V2-style router
#[derive(Parser)]
#[command(name = "lp-autopilot")]
struct Args {
    /// Operation run every round
    #[arg(short, long, env = "MODE", value_enum, default_value = "swap-lp")]
    mode: Mode,

    /// TOML strategy file (defaults apply when omitted)
    #[arg(short, long, env = "STRATEGY_FILE")]
    config: Option<PathBuf>,

    /// Env file with PRIVATE_KEY, RPC_URL and contract addresses
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Stop after this many rounds (runs forever otherwise)
    #[arg(long)]
    rounds: Option<u64>,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,

    /// Force periodic liquidity removal on
    #[arg(long, conflicts_with = "no_remove")]
    remove: bool,

    /// Force periodic liquidity removal off
    #[arg(long)]
    no_remove: bool,

    /// Pid file guarding against a second running bot
    #[arg(long, env = "PID_FILE", default_value = "lp-autopilot.pid")]
    pid_file: PathBuf,

    /// Report whether a bot holds the pid file, then exit
    #[arg(long)]
    status: bool,

    /// Append logs to <DIR>/<mode>.out.log instead of stdout
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Args {
    fn removal_override(&self) -> Option<bool> {
        match (self.remove, self.no_remove) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn init_logging(json: bool, file: Option<File>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match (json, file) {
        (true, Some(file)) => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(Mutex::new(file))
            .init(),
        (false, Some(file)) => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        (true, None) => fmt().json().with_env_filter(filter).with_target(false).init(),
        (false, None) => fmt().with_env_filter(filter).with_target(false).init(),
    }
}

fn print_status(pid_file: &Path) -> Result<()> {
    match InstanceStatus::check(pid_file)? {
        InstanceStatus::Running(pid) => println!("Running (pid {})", pid),
        InstanceStatus::Stale => {
            instance::remove_pid_file(pid_file)?;
            println!("Not running (removed stale pid file {:?})", pid_file);
        }
        InstanceStatus::NotRunning => println!("Not running"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.status {
        return print_status(&args.pid_file);
    }

    let log_file = args
        .log_dir
        .as_deref()
        .map(|dir| instance::open_mode_log(dir, args.mode.name()))
        .transpose()?;
    init_logging(args.log_json, log_file);

    let lock = InstanceLock::acquire(&args.pid_file)?;
    let mode = OperationKind::from(args.mode);
    info!("LP Autopilot starting, mode: {} (pid {})", mode, lock.pid());

    // Configuration
    let chain_config = ChainConfig::load(args.env_file.as_deref())?;
    let strategy = match &args.config {
        Some(path) => StrategyFile::load(path)?,
        None => StrategyFile::default(),
    };
    let settings = BotSettings::resolve(&strategy, &chain_config, mode, args.removal_override())
        .context("Invalid strategy")?;
    info!("Configuration loaded (chain_id: {})", chain_config.chain_id);
    info!("Router: {:?} | Factory: {:?} | WETH: {:?}", chain_config.router, chain_config.factory, chain_config.weth);
    info!("Target tokens: {}", settings.round.tokens.len());
    match &settings.removal_interval {
        Some(range) => info!("Liquidity removal every {}-{} LP rounds", range.start(), range.end()),
        None => info!("Liquidity removal disabled"),
    }

    // Node connection
    let provider = ProviderBuilder::new()
        .connect(&chain_config.rpc_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to {}",
                chain_config.rpc_url.chars().take(40).collect::<String>()
            )
        })?;
    let node_chain_id = provider.get_chain_id().await.context("Failed to read chain id")?;
    if node_chain_id != chain_config.chain_id {
        anyhow::bail!(
            "Chain id mismatch: node reports {}, CHAIN_ID is {}",
            node_chain_id,
            chain_config.chain_id
        );
    }
    let chain = Arc::new(RpcChain::new(Arc::new(provider)));

    let account = Account::from_private_key(&chain_config.private_key, chain_config.chain_id)?;
    let balance = chain.native_balance(account.address()).await.context("Failed to read balance")?;
    info!("Wallet {:?} | balance {} ETH", account.address(), format_ether(balance));

    // Engine
    let clock = Arc::new(SystemClock);
    let mut rng = StdRng::from_entropy();
    let executor = StepExecutor::new(
        chain.clone(),
        account,
        settings.gas.clone(),
        settings.executor.clone(),
        clock.clone(),
    );
    let composer = OperationComposer::new(executor, settings.composer.clone(), clock.clone());
    let removal = settings
        .removal_interval
        .clone()
        .map(|range| RemovalCounter::new(range, &mut rng))
        .transpose()?;
    let mut scheduler = RoundScheduler::new(
        chain,
        composer,
        clock,
        rng,
        settings.round.clone(),
        removal,
        settings.backoff.clone(),
    )?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, stopping after the current round");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    scheduler.run(args.rounds, &stop).await;
    drop(lock);
    Ok(())
}
