//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPayload, CredentialStatus, ProviderId, TenantCredential, TenantId},
	store::{self, CompareAndSwapOutcome, CredentialStore, Records, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<Records>>;

/// Storage backend that keeps credential records in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Returns every stored record, ordered by tenant then provider.
	pub fn snapshot(&self) -> Vec<TenantCredential> {
		let mut records = self.0.read().values().cloned().collect::<Vec<_>>();

		records.sort_by(|a, b| (&a.tenant, &a.provider).cmp(&(&b.tenant, &b.provider)));

		records
	}

	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn upsert<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		payload: CredentialPayload,
		status: CredentialStatus,
	) -> StoreFuture<'a, TenantCredential> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(store::apply_upsert(&mut map.write(), tenant, provider, payload, status))
		})
	}

	fn get<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
	) -> StoreFuture<'a, Option<TenantCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&StoreKey::new(tenant, provider)).cloned()) })
	}

	fn set_status<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		status: CredentialStatus,
	) -> StoreFuture<'a, Option<TenantCredential>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(store::apply_set_status(&mut map.write(), tenant, provider, status)) })
	}

	fn compare_and_swap<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		expected_updated_at: OffsetDateTime,
		payload: CredentialPayload,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(store::apply_compare_and_swap(
				&mut map.write(),
				tenant,
				provider,
				expected_updated_at,
				payload,
			))
		})
	}

	fn restore(&self, record: TenantCredential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(StoreKey::of(&record), record);

			Ok(())
		})
	}
}
