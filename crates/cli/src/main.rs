use azguard_cli::{
	cli::Cli,
	commands,
	logging,
	output::{self, CommandResult},
};
use clap::Parser;
use serde_json::Value;

// Single-threaded so a `session_closed` push is fully reconciled before the
// command that awaited it resumes.
#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let command = cli.command.name();
	match commands::dispatch(cli).await {
		Ok(data) => output::print_result(&CommandResult::success(command, data)),
		Err(err) => {
			let cmd_error = err.to_command_error();
			output::print_error_stderr(&cmd_error);
			output::print_result(&CommandResult::<Value>::failure(command, cmd_error));
			std::process::exit(1);
		}
	}
}
