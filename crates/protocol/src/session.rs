//! Session state shared between the dapp and the wallet.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chain-qualified account identifier (`<namespace>:<reference>:<address>`).
///
/// The wallet reports accounts in this form; bare addresses are what the
/// Aztec wallet-RPC surface exposes to dapps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaipAccount(String);

impl CaipAccount {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the address with the network-identifier prefix stripped.
	///
	/// Identifiers without a `:` separator are returned unchanged.
	pub fn address(&self) -> &str {
		self.0.rsplit_once(':').map_or(self.0.as_str(), |(_, address)| address)
	}

	/// Returns the network-identifier prefix, if any.
	pub fn chain(&self) -> Option<&str> {
		self.0.rsplit_once(':').map(|(chain, _)| chain)
	}

	/// Returns true if the qualified identifier ends with `address`.
	pub fn matches_address(&self, address: &str) -> bool {
		!address.is_empty() && self.0.ends_with(address)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CaipAccount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for CaipAccount {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl From<String> for CaipAccount {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// A single permission grant requested by a dapp or approved by the user.
///
/// Every field is an ordered list; equality is positional, not set-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
	/// Chain identifiers this grant covers.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chains: Option<Vec<String>>,
	/// Operation kinds the dapp may submit.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub methods: Option<Vec<String>>,
	/// Events the dapp may subscribe to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub events: Option<Vec<String>>,
}

impl PermissionGrant {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_chains<I, S>(mut self, chains: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.chains = Some(chains.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_methods<I, S>(mut self, methods: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.methods = Some(methods.into_iter().map(Into::into).collect());
		self
	}

	pub fn with_events<I, S>(mut self, events: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.events = Some(events.into_iter().map(Into::into).collect());
		self
	}
}

/// Descriptive dapp information shown by the wallet on connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DappMetadata {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub logo: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl DappMetadata {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			..Default::default()
		}
	}

	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}
}

/// Server-held authorization state for one connected scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	pub id: String,
	pub accounts: Vec<CaipAccount>,
	pub permissions: Vec<PermissionGrant>,
}

/// Wallet information returned by `get_wallet_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletInfo {
	#[serde(default)]
	pub name: String,
	pub version: String,
	/// Fields this crate does not model, preserved as-is.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn account_address_strips_chain_prefix() {
		let account = CaipAccount::from("aztec:31337:0xabc");
		assert_eq!(account.address(), "0xabc");
		assert_eq!(account.chain(), Some("aztec:31337"));
	}

	#[test]
	fn account_without_prefix_is_its_own_address() {
		let account = CaipAccount::from("0xabc");
		assert_eq!(account.address(), "0xabc");
		assert_eq!(account.chain(), None);
	}

	#[test]
	fn account_matches_by_suffix() {
		let account = CaipAccount::from("aztec:31337:0xabc");
		assert!(account.matches_address("0xabc"));
		assert!(!account.matches_address("0xabd"));
		assert!(!account.matches_address(""));
	}

	#[test]
	fn permission_equality_is_positional() {
		let a = PermissionGrant::new().with_chains(["aztec:1", "aztec:2"]);
		let b = PermissionGrant::new().with_chains(["aztec:2", "aztec:1"]);
		assert_ne!(a, b);
		assert_eq!(a, a.clone());
	}

	#[test]
	fn session_deserializes_from_wallet_json() {
		let json = r#"{
			"id": "s-1",
			"accounts": ["aztec:31337:0x01"],
			"permissions": [{"chains": ["aztec:31337"], "methods": ["send_transaction"]}]
		}"#;
		let session: Session = serde_json::from_str(json).unwrap();
		assert_eq!(session.id, "s-1");
		assert_eq!(session.accounts[0].address(), "0x01");
		assert_eq!(session.permissions[0].events, None);
	}

	#[test]
	fn session_requires_accounts_and_permissions() {
		assert!(serde_json::from_str::<Session>(r#"{"id": "s-1"}"#).is_err());
		assert!(serde_json::from_str::<Session>(r#"{"id": "s-1", "accounts": []}"#).is_err());
		assert!(serde_json::from_str::<Session>(r#"{"id": "s-1", "permissions": []}"#).is_err());
	}

	#[test]
	fn wallet_info_keeps_unknown_fields() {
		let json = r#"{"name": "Azguard", "version": "1.2.3", "build": 7}"#;
		let info: WalletInfo = serde_json::from_str(json).unwrap();
		assert_eq!(info.version, "1.2.3");
		assert_eq!(info.extra["build"], 7);
	}
}
