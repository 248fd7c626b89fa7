//! Wire types for the Azguard wallet RPC protocol.
//!
//! Everything that crosses the channel between a dapp and the wallet extension
//! lives here: sessions and permission grants, the operation/action batch model,
//! tagged operation results, and the JSON-RPC frames used by the relay transport.

pub mod operation;
pub mod rpc;
pub mod session;

pub use operation::{
	Action, AuthwitContent, Call, EncodedCall, Operation, OperationResult, SimulateViewsResult,
};
pub use rpc::{ErrorPayload, Hello, Message, PushEvent, Request, Response};
pub use session::{CaipAccount, DappMetadata, PermissionGrant, Session, WalletInfo};
