//! Main entry point for the bridge transfer orchestrator.
//!
//! This binary wires the library crates together: it loads configuration,
//! connects the chain registry, builds the quote and permit services, and
//! drives the scheduler for one of the directional run modes. A background
//! task periodically refreshes the operator wallet snapshot and the
//! per-chain token balance table while transfers are in flight.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Bytes;
use bridge_config::Config;
use bridge_executor::{implementations::evm::AlloyChainOps, ExecutorSettings, TransferExecutor};
use bridge_permit::Eip712PermitSigner;
use bridge_quote::HttpQuoteService;
use bridge_registry::ChainRegistry;
use bridge_scheduler::{Direction, RunSummary, Scheduler};
use bridge_types::{
	format_units, gwei_to_wei, parse_units, without_0x_prefix, RoundPlan, StatusEvent, StatusKind,
	StatusSink, TransferStats,
};

/// Command-line arguments for the orchestrator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Runs transfers from the hub chain to the selected spoke chains.
	Outbound {
		#[command(flatten)]
		plan: PlanArgs,
	},
	/// Runs transfers from the selected spoke chains to the hub chain.
	Inbound {
		#[command(flatten)]
		plan: PlanArgs,
	},
	/// Runs transfers between the hub and a fresh random spoke sample each
	/// round, in the chosen direction.
	Shuffle {
		/// Whether the hub is the source or the destination.
		#[arg(long, value_enum, default_value_t = DirectionArg::FromHub)]
		direction: DirectionArg,
		/// Number of spoke chains sampled per round.
		#[arg(long, default_value_t = 1)]
		count: usize,
		#[command(flatten)]
		plan: PlanArgs,
	},
	/// Prints the operator wallet snapshot and per-chain token balances.
	Balances,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DirectionArg {
	/// Hub is the source of every transfer.
	FromHub,
	/// Hub is the destination of every transfer.
	ToHub,
}

impl From<DirectionArg> for Direction {
	fn from(value: DirectionArg) -> Self {
		match value {
			DirectionArg::FromHub => Direction::FromFixed,
			DirectionArg::ToHub => Direction::ToFixed,
		}
	}
}

/// Shared plan flags for the run modes.
#[derive(clap::Args, Debug)]
struct PlanArgs {
	/// Amount per transfer as a decimal token amount (e.g. "1.5")
	#[arg(long)]
	amount: String,

	/// Number of rounds to execute
	#[arg(long, default_value_t = 1)]
	rounds: u32,

	/// Delay between transfers, in seconds
	#[arg(long, default_value_t = 0)]
	delay: u64,

	/// Destination-chain native gas-drop per transfer, in gwei
	#[arg(long, default_value_t = 0)]
	gas_drop_gwei: u64,

	/// Chain selection: "all", "random", or a comma-separated key list
	#[arg(long, default_value = "all")]
	select: String,

	/// Sample size when `--select random`
	#[arg(long, default_value_t = 1)]
	random_count: usize,
}

/// Status sink that renders events through tracing.
struct TracingSink;

impl StatusSink for TracingSink {
	fn emit(&self, event: StatusEvent) {
		match event.kind {
			StatusKind::Warning => tracing::warn!("{}", event.message),
			StatusKind::Error => tracing::error!("{}", event.message),
			kind => {
				let status = match kind {
					StatusKind::Send => "send",
					StatusKind::Info => "info",
					StatusKind::Gas => "gas",
					StatusKind::Pending => "pending",
					StatusKind::Success => "success",
					StatusKind::Completed => "completed",
					_ => "info",
				};
				tracing::info!(status, "{}", event.message);
			}
		}
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt().with_env_filter(env_filter).with_target(true).init();

	let config = Config::from_file(&args.config)?;
	tracing::info!(
		hub = %config.hub,
		chains = config.chains.len(),
		"Loaded configuration"
	);

	// The signing key is required for every mode; absence is fatal before
	// any connection is opened.
	let private_key = bridge_config::required_private_key()?;

	let registry = Arc::new(ChainRegistry::new(&config.chains, &private_key)?);
	tracing::info!(operator = %registry.operator(), "Connected chain registry");

	if let Command::Balances = args.command {
		return print_balances(&config, &registry).await;
	}

	let hook_data: Bytes = hex::decode(without_0x_prefix(&config.transfer.default_hook_data))
		.map_err(|e| format!("invalid default_hook_data: {}", e))?
		.into();
	let quotes = Arc::new(HttpQuoteService::new(
		config.quote.route_url.clone(),
		config.quote.fee_url.clone(),
		Duration::from_secs(config.quote.timeout_secs),
		config.transfer.default_finality,
		hook_data,
	)?);
	let permits = Arc::new(Eip712PermitSigner::new(Arc::clone(&registry), &private_key)?);
	let ops = Arc::new(AlloyChainOps::new(Arc::clone(&registry)));

	let static_fee = parse_units(&config.transfer.static_fee, config.transfer.token_decimals)
		.ok_or_else(|| format!("invalid static_fee '{}'", config.transfer.static_fee))?;
	let settings = ExecutorSettings {
		static_fee,
		permit_deadline_buffer_secs: config.transfer.permit_deadline_buffer_secs,
		token_decimals: config.transfer.token_decimals,
	};

	let sink: Arc<dyn StatusSink> = Arc::new(TracingSink);
	let stats = Arc::new(TransferStats::new());
	let executor = Arc::new(TransferExecutor::new(
		ops,
		quotes,
		permits,
		settings,
		Arc::clone(&sink),
		Arc::clone(&stats),
	));
	let scheduler = Scheduler::new(executor, config.spoke_keys());

	let refresh = tokio::spawn(refresh_loop(
		Arc::clone(&registry),
		config.hub.clone(),
		config.refresh.interval_secs,
		config.transfer.token_decimals,
		Arc::clone(&stats),
	));

	let summary = match &args.command {
		Command::Outbound { plan } => {
			let plan = build_plan(plan, &config)?;
			scheduler.run_fixed_source(&config.hub, &plan).await?
		}
		Command::Inbound { plan } => {
			let plan = build_plan(plan, &config)?;
			scheduler.run_fixed_destination(&config.hub, &plan).await?
		}
		Command::Shuffle {
			direction,
			count,
			plan,
		} => {
			let plan = build_plan(plan, &config)?;
			scheduler
				.run_random((*direction).into(), &config.hub, *count, &plan)
				.await?
		}
		Command::Balances => unreachable!("handled above"),
	};

	refresh.abort();
	// One closing refresh so the displayed balances reflect the run
	log_wallet_and_tokens(
		&registry,
		&config.hub,
		config.transfer.token_decimals,
		&stats,
	)
	.await;
	report_summary(&sink, &summary, &stats);
	Ok(())
}

/// Builds a validated round plan from command-line flags.
fn build_plan(args: &PlanArgs, config: &Config) -> Result<RoundPlan, Box<dyn std::error::Error>> {
	let amount = parse_units(&args.amount, config.transfer.token_decimals)
		.filter(|a| !a.is_zero())
		.ok_or_else(|| format!("invalid amount '{}'", args.amount))?;
	let selection =
		Scheduler::parse_selection(&args.select, args.random_count, &config.spoke_keys())?;
	// Gas-drop is entered in gwei; the contract field is a u64 wei amount
	let gas_drop_wei = u64::try_from(gwei_to_wei(args.gas_drop_gwei))
		.map_err(|_| format!("gas-drop {} gwei is out of range", args.gas_drop_gwei))?;
	Ok(RoundPlan {
		amount,
		rounds: args.rounds,
		delay_secs: args.delay,
		gas_drop_wei,
		selection,
	})
}

fn report_summary(sink: &Arc<dyn StatusSink>, summary: &RunSummary, stats: &TransferStats) {
	sink.emit(StatusEvent::new(
		StatusKind::Completed,
		format!(
			"run finished: {} attempted, {} completed, {} failed",
			summary.attempted, summary.completed, summary.failed
		),
	));
	tracing::info!(
		pending = stats.pending(),
		completed = stats.completed(),
		failed = stats.failed(),
		"final transfer counters"
	);
}

/// One-shot wallet snapshot and token balance table.
async fn print_balances(
	config: &Config,
	registry: &Arc<ChainRegistry>,
) -> Result<(), Box<dyn std::error::Error>> {
	let snapshot = registry.wallet_snapshot(&config.hub).await?;
	tracing::info!(
		address = %snapshot.address,
		network = %snapshot.network_label,
		balance = %format!("{} {}", format_units(snapshot.native_balance, 18), snapshot.native_symbol),
		gas_price = snapshot.gas_price,
		tx_count = snapshot.tx_count,
		"operator wallet"
	);
	for row in registry.token_table(registry.operator()).await {
		match row.balance {
			Some(balance) => tracing::info!(
				chain = %row.label,
				balance = %format_units(balance, config.transfer.token_decimals),
				"token balance"
			),
			None => tracing::warn!(chain = %row.label, "token balance unavailable"),
		}
	}
	Ok(())
}

/// Periodic wallet and balance refresh, running alongside transfers.
///
/// Reads are best-effort; a failed refresh is logged at debug level and the
/// next tick tries again.
async fn refresh_loop(
	registry: Arc<ChainRegistry>,
	hub_key: String,
	interval_secs: u64,
	token_decimals: u8,
	stats: Arc<TransferStats>,
) {
	let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
	loop {
		interval.tick().await;
		log_wallet_and_tokens(&registry, &hub_key, token_decimals, &stats).await;
	}
}

/// One wallet snapshot plus token-table pass, best-effort.
async fn log_wallet_and_tokens(
	registry: &Arc<ChainRegistry>,
	hub_key: &str,
	token_decimals: u8,
	stats: &TransferStats,
) {
	match registry.wallet_snapshot(hub_key).await {
		Ok(snapshot) => {
			tracing::info!(
				network = %snapshot.network_label,
				balance = %format!("{} {}", format_units(snapshot.native_balance, 18), snapshot.native_symbol),
				gas_price = snapshot.gas_price,
				tx_count = snapshot.tx_count,
				pending = stats.pending(),
				completed = stats.completed(),
				failed = stats.failed(),
				"wallet refresh"
			);
		}
		Err(e) => {
			tracing::debug!("wallet refresh failed: {}", e);
		}
	}
	for row in registry.token_table(registry.operator()).await {
		if let Some(balance) = row.balance {
			tracing::info!(
				chain = %row.label,
				balance = %format_units(balance, token_decimals),
				"token balance"
			);
		}
	}
}
