//! Session store for the Azguard wallet.
//!
//! [`AzguardClient`] binds to the wallet's RPC channel, restores or establishes
//! a session for its scope, and keeps the cached session consistent with the
//! `session_updated` / `session_closed` pushes the wallet sends on its own
//! schedule.
//!
//! Local teardown only ever happens in response to `session_closed`: an explicit
//! [`disconnect`](AzguardClient::disconnect) asks the wallet to close the session
//! and the resulting push clears state, exactly as a wallet-initiated close would.

use std::sync::{Arc, Weak};
use std::time::Duration;

use azguard_protocol::rpc::{events, methods};
use azguard_protocol::{
	CaipAccount, DappMetadata, Operation, OperationResult, PermissionGrant, Session, WalletInfo,
};
use azguard_runtime::{
	CLIENT_VERSION, Channel, Error, Extension, ExtensionProbe, Result, SessionStorage,
	is_compatible, session_key, wait_for_extension,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::handlers::EventHandlers;

/// Default time to wait for the extension to appear.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Client for one scope's session with the wallet.
///
/// Cloning is cheap; clones share the same session and event registries.
#[derive(Clone)]
pub struct AzguardClient {
	inner: Arc<ClientInner>,
}

struct ClientInner {
	scope: String,
	/// `None` when no extension was detected
	rpc: Option<Arc<dyn Channel>>,
	storage: Arc<dyn SessionStorage>,
	session: Mutex<Option<Session>>,
	connected: EventHandlers<Session>,
	disconnected: EventHandlers<()>,
	accounts_changed: EventHandlers<Vec<CaipAccount>>,
	permissions_changed: EventHandlers<Vec<PermissionGrant>>,
}

impl AzguardClient {
	/// Waits up to `timeout` for the extension, binds to it and restores any
	/// session persisted for `scope`.
	///
	/// If the extension never appears the client is returned unbound: every
	/// call that needs the channel fails with [`Error::NotInstalled`].
	pub async fn create(
		probe: &dyn ExtensionProbe,
		storage: Arc<dyn SessionStorage>,
		scope: impl Into<String>,
		timeout: Duration,
	) -> Self {
		let scope = scope.into();
		match wait_for_extension(probe, timeout).await {
			Some(extension) => Self::from_extension(extension.as_ref(), storage, scope).await,
			None => {
				tracing::info!(scope = %scope, "Azguard wallet not detected");
				Self::new(scope, storage, None)
			}
		}
	}

	/// Binds to an already detected extension and restores the persisted session.
	pub async fn from_extension(
		extension: &dyn Extension,
		storage: Arc<dyn SessionStorage>,
		scope: impl Into<String>,
	) -> Self {
		if !is_compatible(extension.version()) {
			tracing::warn!(
				client_version = CLIENT_VERSION,
				wallet_version = extension.version(),
				"Azguard wallet version is not compatible with this client"
			);
		}

		let client = Self::new(scope.into(), storage, Some(extension.create_client()));
		client.subscribe_pushes();
		client.restore_session().await;
		client
	}

	fn new(scope: String, storage: Arc<dyn SessionStorage>, rpc: Option<Arc<dyn Channel>>) -> Self {
		Self {
			inner: Arc::new(ClientInner {
				scope,
				rpc,
				storage,
				session: Mutex::new(None),
				connected: EventHandlers::new(),
				disconnected: EventHandlers::new(),
				accounts_changed: EventHandlers::new(),
				permissions_changed: EventHandlers::new(),
			}),
		}
	}

	/// Returns true if the extension shows up within `timeout`.
	pub async fn is_azguard_installed(probe: &dyn ExtensionProbe, timeout: Duration) -> bool {
		wait_for_extension(probe, timeout).await.is_some()
	}

	/// Returns true if the extension shows up within `timeout` and reports a compatible version.
	pub async fn is_azguard_installed_and_compatible(
		probe: &dyn ExtensionProbe,
		timeout: Duration,
	) -> bool {
		wait_for_extension(probe, timeout)
			.await
			.is_some_and(|extension| is_compatible(extension.version()))
	}

	pub fn scope(&self) -> &str {
		&self.inner.scope
	}

	/// Returns true if a wallet channel is bound.
	pub fn is_installed(&self) -> bool {
		self.inner.rpc.is_some()
	}

	/// Returns true if a session is held.
	pub fn connected(&self) -> bool {
		self.inner.session.lock().is_some()
	}

	pub fn session(&self) -> Option<Session> {
		self.inner.session.lock().clone()
	}

	/// Approved accounts of the current session, empty when disconnected.
	pub fn accounts(&self) -> Vec<CaipAccount> {
		self.inner.accounts()
	}

	/// Approved permissions of the current session, empty when disconnected.
	pub fn permissions(&self) -> Vec<PermissionGrant> {
		self.inner.permissions()
	}

	/// Fired after a successful [`connect`](Self::connect) with the new session.
	pub fn on_connected(&self) -> &EventHandlers<Session> {
		&self.inner.connected
	}

	/// Fired when the wallet closes the session, before local state is cleared.
	pub fn on_disconnected(&self) -> &EventHandlers<()> {
		&self.inner.disconnected
	}

	/// Fired when a session update changes the approved accounts.
	pub fn on_accounts_changed(&self) -> &EventHandlers<Vec<CaipAccount>> {
		&self.inner.accounts_changed
	}

	/// Fired when a session update changes the approved permissions.
	pub fn on_permissions_changed(&self) -> &EventHandlers<Vec<PermissionGrant>> {
		&self.inner.permissions_changed
	}

	/// Requests a session from the wallet, replacing any session already held.
	pub async fn connect(
		&self,
		dapp: &DappMetadata,
		required_permissions: &[PermissionGrant],
		optional_permissions: Option<&[PermissionGrant]>,
	) -> Result<()> {
		let rpc = self.rpc()?;
		let params = vec![
			serde_json::to_value(dapp)?,
			serde_json::to_value(required_permissions)?,
			serde_json::to_value(optional_permissions)?,
		];
		let session: Session = rpc.send(methods::CONNECT, params).await?;

		*self.inner.session.lock() = Some(session.clone());
		if let Err(e) = self
			.inner
			.storage
			.set(&session_key(&self.inner.scope), &session.id)
		{
			tracing::warn!(error = %e, scope = %self.inner.scope, "Failed to persist session id");
		}

		tracing::info!(
			scope = %self.inner.scope,
			session_id = %session.id,
			accounts = session.accounts.len(),
			"Connected to Azguard wallet"
		);
		self.inner.connected.dispatch(&session);
		Ok(())
	}

	/// Asks the wallet to close the current session. No-op when disconnected.
	///
	/// Local state is cleared when the wallet answers with `session_closed`.
	pub async fn disconnect(&self) -> Result<()> {
		let Some(session_id) = self.session_id() else {
			return Ok(());
		};
		let rpc = self.rpc()?;

		tracing::debug!(scope = %self.inner.scope, session_id = %session_id, "Closing session");
		rpc.send_no_result(methods::CLOSE_SESSION, vec![json!(session_id)])
			.await
	}

	/// Submits `operations` as one batch and returns the wallet's ordered results.
	///
	/// Results are passed through unchanged: they correspond positionally to
	/// `operations`, and everything after the first failure is reported as
	/// [`OperationResult::Skipped`].
	pub async fn execute(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
		let rpc = self.rpc()?;
		let session_id = self.session_id().ok_or(Error::NotConnected)?;

		tracing::debug!(
			scope = %self.inner.scope,
			operations = operations.len(),
			"Executing operation batch"
		);
		rpc.send(
			methods::EXECUTE,
			vec![json!(session_id), serde_json::to_value(operations)?],
		)
		.await
	}

	/// Fetches wallet information. Does not require a session.
	pub async fn get_wallet_info(&self) -> Result<WalletInfo> {
		self.rpc()?.send(methods::GET_WALLET_INFO, vec![]).await
	}

	fn rpc(&self) -> Result<&dyn Channel> {
		self.inner.rpc.as_deref().ok_or(Error::NotInstalled)
	}

	fn session_id(&self) -> Option<String> {
		self.inner.session.lock().as_ref().map(|s| s.id.clone())
	}

	/// Routes wallet pushes to the reconciliation handlers.
	///
	/// Callbacks hold a weak reference so the channel does not keep the client alive.
	fn subscribe_pushes(&self) {
		let Some(rpc) = self.inner.rpc.as_ref() else {
			return;
		};

		let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
		rpc.on(
			events::SESSION_UPDATED,
			Arc::new(move |params| {
				if let Some(inner) = weak.upgrade() {
					inner.on_session_updated(params);
				}
			}),
		);

		let weak: Weak<ClientInner> = Arc::downgrade(&self.inner);
		rpc.on(
			events::SESSION_CLOSED,
			Arc::new(move |_| {
				if let Some(inner) = weak.upgrade() {
					inner.on_session_closed();
				}
			}),
		);
	}

	/// Restores the session persisted for this scope, if the wallet still knows it.
	async fn restore_session(&self) {
		let key = session_key(&self.inner.scope);
		let session_id = match self.inner.storage.get(&key) {
			Ok(Some(id)) => id,
			Ok(None) => return,
			Err(e) => {
				tracing::warn!(error = %e, scope = %self.inner.scope, "Failed to read persisted session");
				return;
			}
		};
		let Ok(rpc) = self.rpc() else {
			return;
		};

		match rpc
			.send::<Option<Session>>(methods::GET_SESSION, vec![json!(session_id)])
			.await
		{
			Ok(Some(session)) => {
				tracing::debug!(scope = %self.inner.scope, session_id = %session.id, "Restored session");
				*self.inner.session.lock() = Some(session);
			}
			Ok(None) => {
				tracing::debug!(scope = %self.inner.scope, session_id = %session_id, "Persisted session no longer exists");
			}
			Err(e) => {
				tracing::warn!(error = %e, scope = %self.inner.scope, "Failed to restore session");
			}
		}
	}
}

impl std::fmt::Debug for AzguardClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AzguardClient")
			.field("scope", &self.inner.scope)
			.field("installed", &self.inner.rpc.is_some())
			.field("session", &*self.inner.session.lock())
			.finish()
	}
}

impl ClientInner {
	fn accounts(&self) -> Vec<CaipAccount> {
		self.session
			.lock()
			.as_ref()
			.map(|s| s.accounts.clone())
			.unwrap_or_default()
	}

	fn permissions(&self) -> Vec<PermissionGrant> {
		self.session
			.lock()
			.as_ref()
			.map(|s| s.permissions.clone())
			.unwrap_or_default()
	}

	/// Replaces the session and fires change events against the new state.
	fn on_session_updated(&self, params: Vec<Value>) {
		let Some(payload) = params.into_iter().next() else {
			tracing::warn!("session_updated push without a session");
			return;
		};
		let session: Session = match serde_json::from_value(payload) {
			Ok(session) => session,
			Err(e) => {
				tracing::warn!(error = %e, "Malformed session_updated push");
				return;
			}
		};

		let (accounts_differ, permissions_differ) = {
			let mut slot = self.session.lock();
			let changes = match slot.as_ref() {
				Some(old) => (
					accounts_changed(&old.accounts, &session.accounts),
					permissions_changed(&old.permissions, &session.permissions),
				),
				None => (
					accounts_changed(&[], &session.accounts),
					permissions_changed(&[], &session.permissions),
				),
			};
			*slot = Some(session);
			changes
		};

		tracing::debug!(
			scope = %self.scope,
			accounts_changed = accounts_differ,
			permissions_changed = permissions_differ,
			"Session updated"
		);

		if accounts_differ {
			self.accounts_changed.dispatch(&self.accounts());
		}
		if permissions_differ {
			self.permissions_changed.dispatch(&self.permissions());
		}
	}

	/// Fires `disconnected`, then clears the session, then forgets the persisted id.
	fn on_session_closed(&self) {
		tracing::info!(scope = %self.scope, "Session closed");

		self.disconnected.dispatch(&());
		*self.session.lock() = None;
		if let Err(e) = self.storage.remove(&session_key(&self.scope)) {
			tracing::warn!(error = %e, scope = %self.scope, "Failed to remove persisted session");
		}
	}
}

/// Positional comparison of account lists.
pub fn accounts_changed(old: &[CaipAccount], new: &[CaipAccount]) -> bool {
	old.len() != new.len() || old.iter().zip(new).any(|(a, b)| a != b)
}

/// Positional comparison of permission lists, field by field in order.
pub fn permissions_changed(old: &[PermissionGrant], new: &[PermissionGrant]) -> bool {
	old.len() != new.len()
		|| old.iter().zip(new).any(|(a, b)| {
			a.chains != b.chains || a.methods != b.methods || a.events != b.events
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grant(chains: &[&str], methods: &[&str]) -> PermissionGrant {
		PermissionGrant::new()
			.with_chains(chains.iter().copied())
			.with_methods(methods.iter().copied())
	}

	#[test]
	fn test_permissions_of_different_length_changed() {
		let one = vec![grant(&["aztec:1"], &["send_transaction"])];
		let two = vec![one[0].clone(), grant(&["aztec:2"], &[])];

		assert!(permissions_changed(&one, &two));
		assert!(permissions_changed(&two, &one));
		assert!(permissions_changed(&[], &one));
	}

	#[test]
	fn test_permissions_compare_in_order() {
		let a = vec![grant(&["aztec:1", "aztec:2"], &["send_transaction"])];
		let b = vec![grant(&["aztec:2", "aztec:1"], &["send_transaction"])];

		assert!(permissions_changed(&a, &b));
		assert!(!permissions_changed(&a, &a.clone()));
	}

	#[test]
	fn test_permissions_detect_event_changes() {
		let a = vec![PermissionGrant::new().with_events(["accounts_changed"])];
		let b = vec![PermissionGrant::new()];

		assert!(permissions_changed(&a, &b));
	}

	#[test]
	fn test_accounts_compare_positionally() {
		let a: Vec<CaipAccount> = vec!["aztec:1:0x1".into(), "aztec:1:0x2".into()];
		let reordered: Vec<CaipAccount> = vec!["aztec:1:0x2".into(), "aztec:1:0x1".into()];

		assert!(!accounts_changed(&a, &a.clone()));
		assert!(accounts_changed(&a, &reordered));
		assert!(accounts_changed(&a, &a[..1]));
	}
}
