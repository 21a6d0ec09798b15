// self
use marketplace_auth_broker::{
	auth::{CredentialPayload, CredentialStatus, ProviderId, TenantId},
	store::{CompareAndSwapOutcome, CredentialStore, MemoryStore},
};

fn tenant(raw: &str) -> TenantId {
	TenantId::new(raw).expect("Tenant fixture should be valid.")
}

fn provider(raw: &str) -> ProviderId {
	ProviderId::new(raw).expect("Provider fixture should be valid.")
}

#[tokio::test]
async fn upsert_keeps_one_record_per_tenant_and_provider() {
	let store = MemoryStore::default();
	let (acme, globex, amazon) = (tenant("acme"), tenant("globex"), provider("amazon"));

	for token in ["t1", "t2", "t3"] {
		store
			.upsert(
				&acme,
				&amazon,
				CredentialPayload::new().with_field("access_token", token),
				CredentialStatus::Active,
			)
			.await
			.expect("Upsert should succeed.");
	}

	store
		.upsert(&globex, &amazon, CredentialPayload::new(), CredentialStatus::Active)
		.await
		.expect("Upsert for a second tenant should succeed.");

	assert_eq!(store.len(), 2);

	let record = store
		.get(&acme, &amazon)
		.await
		.expect("Get should succeed.")
		.expect("Record should exist after upsert.");

	assert_eq!(record.payload.expose("access_token"), Some("t3"));
	assert!(store.get(&acme, &provider("shopee")).await.expect("Get should succeed.").is_none());
}

#[tokio::test]
async fn compare_and_swap_rejects_writers_holding_an_old_snapshot() {
	let store = MemoryStore::default();
	let (acme, amazon) = (tenant("acme"), provider("amazon"));
	let snapshot = store
		.upsert(&acme, &amazon, CredentialPayload::new(), CredentialStatus::Active)
		.await
		.expect("Upsert should succeed.");
	let first = store
		.compare_and_swap(
			&acme,
			&amazon,
			snapshot.updated_at,
			CredentialPayload::new().with_field("access_token", "winner"),
		)
		.await
		.expect("First CAS should run.");
	let second = store
		.compare_and_swap(
			&acme,
			&amazon,
			snapshot.updated_at,
			CredentialPayload::new().with_field("access_token", "loser"),
		)
		.await
		.expect("Second CAS should run.");

	assert_eq!(first, CompareAndSwapOutcome::Updated);
	assert_eq!(second, CompareAndSwapOutcome::Stale);

	let record = store
		.get(&acme, &amazon)
		.await
		.expect("Get should succeed.")
		.expect("Record should exist.");

	assert_eq!(record.payload.expose("access_token"), Some("winner"));
	assert_eq!(record.status, CredentialStatus::Active);
	assert_eq!(record.created_at, snapshot.created_at);
}

#[tokio::test]
async fn status_transitions_and_restore() {
	let store = MemoryStore::default();
	let (acme, amazon) = (tenant("acme"), provider("amazon"));

	assert!(
		store
			.set_status(&acme, &amazon, CredentialStatus::Disconnected)
			.await
			.expect("Status update should succeed.")
			.is_none()
	);

	let original = store
		.upsert(&acme, &amazon, CredentialPayload::new(), CredentialStatus::Active)
		.await
		.expect("Upsert should succeed.");
	let disconnected = store
		.set_status(&acme, &amazon, CredentialStatus::Disconnected)
		.await
		.expect("Status update should succeed.")
		.expect("Existing record should be updated.");

	assert_eq!(disconnected.status, CredentialStatus::Disconnected);
	assert!(disconnected.updated_at > original.updated_at);

	store.restore(original.clone()).await.expect("Restore should succeed.");

	assert_eq!(store.snapshot(), vec![original]);
}
