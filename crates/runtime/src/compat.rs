//! Client/wallet version compatibility.

/// Version of this client, compared against the wallet's reported version.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns true if `remote` is compatible with [`CLIENT_VERSION`].
pub fn is_compatible(remote: &str) -> bool {
	versions_compatible(CLIENT_VERSION, remote)
}

/// Compares the first two dot-separated segments of both versions.
///
/// Segments are compared as raw strings; patch and build segments are ignored.
pub fn versions_compatible(local: &str, remote: &str) -> bool {
	let mut local = local.split('.');
	let mut remote = remote.split('.');
	local.next() == remote.next() && local.next() == remote.next()
}
