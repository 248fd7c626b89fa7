//! Persisted session identifiers.
//!
//! Storage is a synchronous key/value map. Only the session id is persisted,
//! under [`session_key`]; the session itself is re-fetched from the wallet.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Prefix of every persisted session key.
pub const SESSION_KEY_PREFIX: &str = "azguard:session:";

/// Returns the storage key for `scope` (`azguard:session:<scope>`).
pub fn session_key(scope: &str) -> String {
	format!("{SESSION_KEY_PREFIX}{scope}")
}

/// Synchronous key/value storage.
pub trait SessionStorage: Send + Sync {
	fn get(&self, key: &str) -> Result<Option<String>>;
	fn set(&self, key: &str, value: &str) -> Result<()>;
	/// Removing a missing key is not an error.
	fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SessionStorage for MemoryStorage {
	fn get(&self, key: &str) -> Result<Option<String>> {
		Ok(self.entries.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.entries.lock().insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) -> Result<()> {
		self.entries.lock().remove(key);
		Ok(())
	}
}

/// Storage backed by a single JSON object on disk.
///
/// The file is re-read on every access; concurrent writers from other
/// processes are not coordinated.
#[derive(Debug)]
pub struct FileStorage {
	path: PathBuf,
	lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock: Mutex::new(()),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<BTreeMap<String, String>> {
		match fs::read_to_string(&self.path) {
			Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
			Ok(content) => serde_json::from_str(&content)
				.map_err(|e| Error::Storage(format!("{}: {e}", self.path.display()))),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
			Err(e) => Err(e.into()),
		}
	}

	fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
		Ok(())
	}
}

impl SessionStorage for FileStorage {
	fn get(&self, key: &str) -> Result<Option<String>> {
		let _guard = self.lock.lock();
		Ok(self.load()?.remove(key))
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		let _guard = self.lock.lock();
		let mut entries = self.load()?;
		entries.insert(key.to_string(), value.to_string());
		self.save(&entries)
	}

	fn remove(&self, key: &str) -> Result<()> {
		let _guard = self.lock.lock();
		let mut entries = self.load()?;
		if entries.remove(key).is_some() {
			self.save(&entries)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn test_session_key_is_scope_qualified() {
		assert_eq!(session_key("my-dapp"), "azguard:session:my-dapp");
	}

	#[test]
	fn test_memory_storage_set_get_remove() {
		let storage = MemoryStorage::new();
		storage.set("k", "v").unwrap();
		assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));

		storage.remove("k").unwrap();
		storage.remove("k").unwrap();
		assert_eq!(storage.get("k").unwrap(), None);
	}

	#[test]
	fn test_file_storage_missing_file_is_empty() {
		let tmp = TempDir::new().unwrap();
		let storage = FileStorage::new(tmp.path().join("sessions.json"));
		assert_eq!(storage.get(&session_key("a")).unwrap(), None);
	}

	#[test]
	fn test_file_storage_persists_across_instances() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("nested/sessions.json");

		FileStorage::new(&path).set(&session_key("a"), "s-1").unwrap();
		FileStorage::new(&path).set(&session_key("b"), "s-2").unwrap();

		let storage = FileStorage::new(&path);
		assert_eq!(storage.get(&session_key("a")).unwrap().as_deref(), Some("s-1"));

		storage.remove(&session_key("a")).unwrap();
		assert_eq!(FileStorage::new(&path).get(&session_key("a")).unwrap(), None);
		assert_eq!(
			FileStorage::new(&path).get(&session_key("b")).unwrap().as_deref(),
			Some("s-2")
		);
	}

	#[test]
	fn test_file_storage_reports_corrupt_file() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("sessions.json");
		fs::write(&path, "not json").unwrap();

		assert!(matches!(
			FileStorage::new(&path).get("k"),
			Err(Error::Storage(_))
		));
	}
}
