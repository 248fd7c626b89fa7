//! Azguard wallet client.
//!
//! Session management around the Azguard extension's RPC channel, plus an
//! adapter exposing the Aztec wallet-RPC method surface.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use azguard::{AzguardClient, DappMetadata, MemoryStorage, PermissionGrant, RelayProbe};
//!
//! let probe = RelayProbe::default();
//! let client = AzguardClient::create(&probe, Arc::new(MemoryStorage::new()), "my-dapp", azguard::DEFAULT_TIMEOUT).await;
//!
//! if !client.connected() {
//!     let grant = PermissionGrant::new().with_chains(["aztec:31337"]).with_methods(["send_transaction"]);
//!     client.connect(&DappMetadata::new("My dapp"), &[grant], None).await?;
//! }
//! let _sub = client.on_accounts_changed().subscribe(|accounts| {
//!     println!("{} accounts", accounts.len());
//!     Ok(())
//! });
//! ```

pub mod adapter;
pub mod client;
pub mod handlers;

pub use adapter::{
	AdapterOptions, AuthWitness, AztecWalletAdapter, CallRequest, RpcRequest,
	SendTransactionRequest, WalletMethod,
};
pub use azguard_protocol::{
	Action, AuthwitContent, CaipAccount, Call, DappMetadata, EncodedCall, Operation,
	OperationResult, PermissionGrant, Session, SimulateViewsResult, WalletInfo,
};
pub use azguard_runtime::{
	CLIENT_VERSION, Channel, DEFAULT_RELAY_URL, Error, Extension, ExtensionProbe, FileStorage,
	MemoryStorage, RelayProbe, Result, SessionStorage, is_compatible, session_key,
	wait_for_extension,
};
pub use client::{AzguardClient, DEFAULT_TIMEOUT};
pub use handlers::{EventHandlers, HandlerFn, HandlerId, Subscription};
