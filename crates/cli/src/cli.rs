use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::styles::cli_styles;

/// Command-line client for the Azguard wallet.
#[derive(Parser, Debug)]
#[command(name = "azguard")]
#[command(about = "Azguard wallet client - sessions and operation batches over the local relay")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Relay WebSocket endpoint
	#[arg(long, global = true, value_name = "URL")]
	pub endpoint: Option<String>,

	/// Session scope
	#[arg(long, global = true, value_name = "NAME")]
	pub scope: Option<String>,

	/// Wallet detection timeout in milliseconds
	#[arg(long, global = true, value_name = "MS")]
	pub timeout_ms: Option<u64>,

	/// Config file (defaults to the user config directory)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Report wallet detection, compatibility and the session for the scope.
	Status,
	/// Request a new session from the wallet.
	Connect(ConnectArgs),
	/// Close the session for the scope.
	Disconnect,
	/// List the accounts approved for the scope.
	Accounts,
	/// Show wallet information.
	Info,
	/// Submit a batch of operations.
	Execute(ExecuteArgs),
	/// Call an Aztec wallet-RPC method (aztec_requestAccounts, aztec_call, ...).
	Rpc(RpcArgs),
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Status => "status",
			Commands::Connect(_) => "connect",
			Commands::Disconnect => "disconnect",
			Commands::Accounts => "accounts",
			Commands::Info => "info",
			Commands::Execute(_) => "execute",
			Commands::Rpc(_) => "rpc",
		}
	}
}

#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
	/// Dapp name shown in the approval prompt
	#[arg(long, value_name = "NAME")]
	pub name: Option<String>,

	/// Dapp url shown in the approval prompt
	#[arg(long, value_name = "URL")]
	pub url: Option<String>,

	/// Chain to request, repeatable (e.g. aztec:31337)
	#[arg(long = "chain", value_name = "CHAIN")]
	pub chains: Vec<String>,

	/// Operation kind to request, repeatable (e.g. send_transaction)
	#[arg(long = "method", value_name = "KIND")]
	pub methods: Vec<String>,

	/// Request the chains and methods as optional rather than required
	#[arg(long)]
	pub optional: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExecuteArgs {
	/// JSON array of operations
	#[arg(value_name = "OPERATIONS")]
	pub operations: String,
}

#[derive(Args, Debug, Clone)]
pub struct RpcArgs {
	/// Method name
	#[arg(value_name = "METHOD")]
	pub method: String,

	/// JSON params; a non-array value is passed as the single param
	#[arg(value_name = "PARAMS")]
	pub params: Option<String>,
}
