//! Storage contracts and built-in store implementations for tenant credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPayload, CredentialStatus, ProviderId, TenantCredential, TenantId},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for tenant credentials.
///
/// A backend keeps at most one record per `(tenant, provider)` pair. Implementations must never
/// log payload values.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Creates or overwrites the record for the pair.
	///
	/// `created_at` survives overwrites; `updated_at` and `last_sync` are stamped on every call.
	fn upsert<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		payload: CredentialPayload,
		status: CredentialStatus,
	) -> StoreFuture<'a, TenantCredential>;

	/// Fetches the record for the pair, if present.
	fn get<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
	) -> StoreFuture<'a, Option<TenantCredential>>;

	/// Transitions the status of an existing record. Returns `None` when no record exists.
	fn set_status<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		status: CredentialStatus,
	) -> StoreFuture<'a, Option<TenantCredential>>;

	/// Replaces the payload only if the record was not modified since `expected_updated_at`.
	fn compare_and_swap<'a>(
		&'a self,
		tenant: &'a TenantId,
		provider: &'a ProviderId,
		expected_updated_at: OffsetDateTime,
		payload: CredentialPayload,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Writes `record` back verbatim, replacing whatever is stored for its pair.
	///
	/// Used to roll back a write whose side effects could not be completed.
	fn restore(&self, record: TenantCredential) -> StoreFuture<'_, ()>;
}

/// Result of a compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The record was unchanged since the expected instant and now holds the new payload.
	Updated,
	/// The record exists but was modified concurrently.
	Stale,
	/// No record exists for the pair.
	Missing,
}

/// Error type produced by [`CredentialStore`] and channel mirror implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A concurrent writer changed the record first.
	#[error("Credential for `{provider}` was modified concurrently; retry the request.")]
	Conflict {
		/// Provider key of the contended record.
		provider: String,
	},
}

/// Unique key identifying a stored credential.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreKey {
	/// Owning tenant.
	pub tenant: TenantId,
	/// Provider key.
	pub provider: ProviderId,
}
impl StoreKey {
	/// Builds a key for the pair.
	pub fn new(tenant: &TenantId, provider: &ProviderId) -> Self {
		Self { tenant: tenant.clone(), provider: provider.clone() }
	}

	/// Builds the key of an existing record.
	pub fn of(record: &TenantCredential) -> Self {
		Self::new(&record.tenant, &record.provider)
	}
}

type Records = HashMap<StoreKey, TenantCredential>;

// Monotonic stamp so a compare-and-swap never observes the same `updated_at` twice.
fn next_stamp(previous: OffsetDateTime) -> OffsetDateTime {
	let now = OffsetDateTime::now_utc();

	if now > previous { now } else { previous + Duration::nanoseconds(1) }
}

fn apply_upsert(
	records: &mut Records,
	tenant: &TenantId,
	provider: &ProviderId,
	payload: CredentialPayload,
	status: CredentialStatus,
) -> TenantCredential {
	let key = StoreKey::new(tenant, provider);
	let record = match records.get(&key) {
		Some(existing) => {
			let now = next_stamp(existing.updated_at);

			TenantCredential {
				payload,
				status,
				last_sync: Some(now),
				updated_at: now,
				..existing.clone()
			}
		},
		None => TenantCredential::new(
			tenant.clone(),
			provider.clone(),
			payload,
			status,
			OffsetDateTime::now_utc(),
		),
	};

	records.insert(key, record.clone());

	record
}

fn apply_set_status(
	records: &mut Records,
	tenant: &TenantId,
	provider: &ProviderId,
	status: CredentialStatus,
) -> Option<TenantCredential> {
	let record = records.get_mut(&StoreKey::new(tenant, provider))?;

	record.status = status;
	record.updated_at = next_stamp(record.updated_at);

	Some(record.clone())
}

fn apply_compare_and_swap(
	records: &mut Records,
	tenant: &TenantId,
	provider: &ProviderId,
	expected_updated_at: OffsetDateTime,
	payload: CredentialPayload,
) -> CompareAndSwapOutcome {
	match records.get_mut(&StoreKey::new(tenant, provider)) {
		Some(record) if record.updated_at == expected_updated_at => {
			let now = next_stamp(record.updated_at);

			record.payload = payload;
			record.last_sync = Some(now);
			record.updated_at = now;

			CompareAndSwapOutcome::Updated
		},
		Some(_) => CompareAndSwapOutcome::Stale,
		None => CompareAndSwapOutcome::Missing,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn pair() -> (TenantId, ProviderId) {
		(
			TenantId::new("tenant-1").expect("Tenant fixture should be valid."),
			ProviderId::new("amazon").expect("Provider fixture should be valid."),
		)
	}

	#[test]
	fn upsert_preserves_created_at_and_advances_updated_at() {
		let (tenant, provider) = pair();
		let mut records = Records::new();
		let first = apply_upsert(
			&mut records,
			&tenant,
			&provider,
			CredentialPayload::new().with_field("access_token", "t1"),
			CredentialStatus::Active,
		);
		let second = apply_upsert(
			&mut records,
			&tenant,
			&provider,
			CredentialPayload::new().with_field("access_token", "t2"),
			CredentialStatus::Active,
		);

		assert_eq!(records.len(), 1);
		assert_eq!(second.created_at, first.created_at);
		assert!(second.updated_at > first.updated_at);
		assert_eq!(second.payload.expose("access_token"), Some("t2"));
	}

	#[test]
	fn compare_and_swap_detects_stale_writers() {
		let (tenant, provider) = pair();
		let mut records = Records::new();
		let stored = apply_upsert(
			&mut records,
			&tenant,
			&provider,
			CredentialPayload::new(),
			CredentialStatus::Active,
		);
		let payload = CredentialPayload::new().with_field("access_token", "t2");

		assert_eq!(
			apply_compare_and_swap(&mut records, &tenant, &provider, stored.updated_at, payload.clone()),
			CompareAndSwapOutcome::Updated
		);
		assert_eq!(
			apply_compare_and_swap(&mut records, &tenant, &provider, stored.updated_at, payload),
			CompareAndSwapOutcome::Stale
		);

		let other = TenantId::new("tenant-2").expect("Tenant fixture should be valid.");

		assert_eq!(
			apply_compare_and_swap(
				&mut records,
				&other,
				&provider,
				stored.updated_at,
				CredentialPayload::new()
			),
			CompareAndSwapOutcome::Missing
		);
	}

	#[test]
	fn set_status_on_missing_record_is_none() {
		let (tenant, provider) = pair();
		let mut records = Records::new();

		assert!(
			apply_set_status(&mut records, &tenant, &provider, CredentialStatus::Disconnected)
				.is_none()
		);
	}

	#[test]
	fn conflict_message_names_the_provider() {
		let err = StoreError::Conflict { provider: "amazon".into() };

		assert_eq!(
			err.to_string(),
			"Credential for `amazon` was modified concurrently; retry the request."
		);
	}
}
