//! Command implementations. Each returns the `data` payload of its envelope.

use std::sync::Arc;

use azguard::{
	AdapterOptions, AztecWalletAdapter, AzguardClient, CLIENT_VERSION, DappMetadata, Extension,
	FileStorage, Operation, PermissionGrant, RelayProbe, RpcRequest, SessionStorage,
	is_compatible, wait_for_extension,
};
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::cli::{Cli, Commands, ConnectArgs, ExecuteArgs, RpcArgs};
use crate::config::Settings;
use crate::error::{CliError, Result};

pub async fn dispatch(cli: Cli) -> Result<Value> {
	let settings = Settings::load(&cli)?;
	tracing::debug!(
		endpoint = %settings.endpoint,
		scope = %settings.scope,
		sessions = %settings.sessions_path.display(),
		"Resolved settings"
	);

	match cli.command {
		Commands::Status => status(&settings).await,
		Commands::Connect(args) => connect(&settings, args).await,
		Commands::Disconnect => disconnect(&settings).await,
		Commands::Accounts => {
			let client = bind(&settings).await?;
			Ok(serde_json::to_value(client.accounts())?)
		}
		Commands::Info => {
			let client = bind(&settings).await?;
			Ok(serde_json::to_value(client.get_wallet_info().await?)?)
		}
		Commands::Execute(args) => execute(&settings, args).await,
		Commands::Rpc(args) => rpc(&settings, args).await,
	}
}

fn storage(settings: &Settings) -> Arc<dyn SessionStorage> {
	Arc::new(FileStorage::new(&settings.sessions_path))
}

async fn detect(settings: &Settings) -> Option<Arc<dyn Extension>> {
	let probe = RelayProbe::new(&settings.endpoint);
	wait_for_extension(&probe, settings.timeout).await
}

/// Binds a client to the relay, failing when no wallet answers in time.
async fn bind(settings: &Settings) -> Result<AzguardClient> {
	let extension = detect(settings).await.ok_or_else(|| CliError::NotDetected {
		endpoint: settings.endpoint.clone(),
	})?;
	Ok(AzguardClient::from_extension(extension.as_ref(), storage(settings), &settings.scope).await)
}

async fn status(settings: &Settings) -> Result<Value> {
	let Some(extension) = detect(settings).await else {
		return Ok(json!({
			"installed": false,
			"compatible": false,
			"connected": false,
			"endpoint": settings.endpoint,
			"scope": settings.scope,
		}));
	};

	let wallet_version = extension.version().to_string();
	let client =
		AzguardClient::from_extension(extension.as_ref(), storage(settings), &settings.scope).await;

	Ok(json!({
		"installed": true,
		"compatible": is_compatible(&wallet_version),
		"walletVersion": wallet_version,
		"clientVersion": CLIENT_VERSION,
		"connected": client.connected(),
		"endpoint": settings.endpoint,
		"scope": settings.scope,
		"session": client.session(),
	}))
}

async fn connect(settings: &Settings, args: ConnectArgs) -> Result<Value> {
	let client = bind(settings).await?;

	let mut dapp = DappMetadata::new(args.name.unwrap_or_else(|| settings.dapp_name.clone()));
	if let Some(url) = args.url.or_else(|| settings.dapp_url.clone()) {
		dapp = dapp.with_url(url);
	}

	let mut grant = PermissionGrant::new();
	if !args.chains.is_empty() {
		grant = grant.with_chains(args.chains);
	}
	if !args.methods.is_empty() {
		grant = grant.with_methods(args.methods);
	}
	let grants = [grant];

	if args.optional {
		client.connect(&dapp, &[], Some(&grants)).await?;
	} else {
		client.connect(&dapp, &grants, None).await?;
	}
	Ok(serde_json::to_value(client.session())?)
}

/// Closes the session and waits for the wallet's `session_closed` push, which
/// is what clears the persisted session id.
async fn disconnect(settings: &Settings) -> Result<Value> {
	let client = bind(settings).await?;
	let Some(session) = client.session() else {
		return Ok(json!({ "closed": false }));
	};

	let closed = Arc::new(Notify::new());
	let signal = Arc::clone(&closed);
	let _sub = client.on_disconnected().subscribe(move |_| {
		signal.notify_one();
		Ok(())
	});

	client.disconnect().await?;
	tokio::time::timeout(settings.timeout, closed.notified())
		.await
		.map_err(|_| CliError::Timeout {
			ms: settings.timeout.as_millis() as u64,
			condition: "session_closed".to_string(),
		})?;

	Ok(json!({ "closed": true, "sessionId": session.id }))
}

async fn execute(settings: &Settings, args: ExecuteArgs) -> Result<Value> {
	let operations: Vec<Operation> = serde_json::from_str(&args.operations)
		.map_err(|e| CliError::InvalidInput(format!("operations: {e}")))?;

	let client = bind(settings).await?;
	let results = client.execute(&operations).await?;
	Ok(serde_json::to_value(results)?)
}

async fn rpc(settings: &Settings, args: RpcArgs) -> Result<Value> {
	let params = parse_params(args.params.as_deref())?;

	let client = bind(settings).await?;
	let origin = settings
		.dapp_url
		.clone()
		.unwrap_or_else(|| settings.dapp_name.clone());
	let adapter = AztecWalletAdapter::new(client, AdapterOptions::new(origin));

	Ok(adapter.request(RpcRequest::new(args.method, params)).await?)
}

/// A JSON array is spread as positional params; any other value is the single param.
fn parse_params(raw: Option<&str>) -> Result<Vec<Value>> {
	let Some(raw) = raw else {
		return Ok(Vec::new());
	};
	match serde_json::from_str(raw).map_err(|e| CliError::InvalidInput(format!("params: {e}")))? {
		Value::Array(params) => Ok(params),
		single => Ok(vec![single]),
	}
}
