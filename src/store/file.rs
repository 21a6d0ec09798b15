//! File-backed [`CredentialStore`] for lightweight single-node deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPayload, CredentialStatus, ProviderId, TenantCredential, TenantId},
	store::{
		self, CompareAndSwapOutcome, CredentialStore, Records, StoreError, StoreFuture, StoreKey,
	},
};

/// Persists credential records to a JSON file after each mutation.
///
/// The snapshot is written to a sibling `.tmp` file, synced, then renamed over the target so a
/// crash never leaves a truncated document behind. Secrets are stored as-is; encrypt the volume
/// when that matters.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Records>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Records, StoreError> {
		if !path.exists() {
			return Ok(Records::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(Records::new());
		}

		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let entries: Vec<TenantCredential> =
			serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {} at `{}`: {}", path.display(), e.path(), e.inner()),
			})?;

		Ok(entries.into_iter().map(|record| (StoreKey::of(&record), record)).collect())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Records) -> Result<(), StoreError> {
		let mut snapshot = contents.values().collect::<Vec<_>>();

		snapshot.sort_by(|a, b| (&a.tenant, &a.provider).cmp(&(&b.tenant, &b.provider)));

		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	// Applies `mutate` to a copy so a failed write leaves memory and disk in agreement.
	fn mutate<T>(&self, mutate: impl FnOnce(&mut Records) -> T) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let mut next = guard.clone();
		let out = mutate(&mut next);

		self.persist_locked(&next)?;
		*guard = next;

		Ok(out)
	}
}
impl CredentialStore for FileStore {
	fn upsert<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		payload: CredentialPayload,
		status: CredentialStatus,
	) -> StoreFuture<'a, TenantCredential> {
		Box::pin(async move {
			self.mutate(|records| store::apply_upsert(records, tenant, provider, payload, status))
		})
	}

	fn get<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
	) -> StoreFuture<'a, Option<TenantCredential>> {
		Box::pin(async move { Ok(self.inner.read().get(&StoreKey::new(tenant, provider)).cloned()) })
	}

	fn set_status<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		status: CredentialStatus,
	) -> StoreFuture<'a, Option<TenantCredential>> {
		Box::pin(async move {
			if !self.inner.read().contains_key(&StoreKey::new(tenant, provider)) {
				return Ok(None);
			}

			self.mutate(|records| store::apply_set_status(records, tenant, provider, status))
		})
	}

	fn compare_and_swap<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		expected_updated_at: OffsetDateTime,
		payload: CredentialPayload,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let current =
				self.inner.read().get(&StoreKey::new(tenant, provider)).map(|r| r.updated_at);

			match current {
				None => Ok(CompareAndSwapOutcome::Missing),
				Some(updated_at) if updated_at != expected_updated_at =>
					Ok(CompareAndSwapOutcome::Stale),
				Some(_) => self.mutate(|records| {
					store::apply_compare_and_swap(
						records,
						tenant,
						provider,
						expected_updated_at,
						payload,
					)
				}),
			}
		})
	}

	fn restore(&self, record: TenantCredential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.mutate(|records| {
				records.insert(StoreKey::of(&record), record);
			})
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"marketplace_auth_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn pair() -> (TenantId, ProviderId) {
		(
			TenantId::new("tenant-demo").expect("Failed to build tenant fixture."),
			ProviderId::new("magazine_luiza").expect("Failed to build provider fixture."),
		)
	}

	#[test]
	fn upsert_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let (tenant, provider) = pair();
		let payload = CredentialPayload::from_fields([("api_key", "k"), ("seller_id", "s")]);
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let stored = rt
			.block_on(store.upsert(&tenant, &provider, payload.clone(), CredentialStatus::Active))
			.expect("Failed to upsert fixture record into file store.");

		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.get(&tenant, &provider))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched, stored);
		assert_eq!(fetched.payload, payload);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn disconnect_is_persisted() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let (tenant, provider) = pair();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		assert!(
			rt.block_on(store.set_status(&tenant, &provider, CredentialStatus::Disconnected))
				.expect("Status update on an empty store should succeed.")
				.is_none()
		);

		rt.block_on(store.upsert(
			&tenant,
			&provider,
			CredentialPayload::new(),
			CredentialStatus::Active,
		))
		.expect("Failed to upsert fixture record into file store.");
		rt.block_on(store.set_status(&tenant, &provider, CredentialStatus::Disconnected))
			.expect("Failed to disconnect fixture record.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.get(&tenant, &provider))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.status, CredentialStatus::Disconnected);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn malformed_snapshot_reports_json_path() {
		let path = temp_path();

		fs::write(&path, br#"[{"tenant": "tenant-1", "provider": 7}]"#)
			.expect("Failed to write malformed snapshot fixture.");

		let err = FileStore::open(&path).expect_err("Malformed snapshot should be rejected.");

		assert!(matches!(&err, StoreError::Serialization { message } if message.contains("[0].provider")));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
