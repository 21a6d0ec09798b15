//! Mirrors the connection flag onto tenant-owned channel records.
//!
//! The broker does not own channel records. It only flips their `connected` flag after a
//! credential write so the tenant-facing UI reflects the broker's view.

// self
use crate::{
	_prelude::*,
	auth::{ChannelRef, TenantId},
	store::{StoreError, StoreFuture},
};

/// Collaborator that persists the channel `connected` flag.
pub trait ChannelStatusSync
where
	Self: Send + Sync,
{
	/// Sets the flag on `channel`, owned by `tenant`.
	fn set_connected<'a>(
		&'a self,
		tenant: &'a TenantId,
		channel: &'a ChannelRef,
		connected: bool,
	) -> StoreFuture<'a, ()>;
}

/// In-process channel directory for tests, demos, and single-node deployments.
///
/// [`MemoryChannelDirectory::fail_next_writes`] injects write failures so rollback paths can be
/// exercised without a real backend.
#[derive(Debug, Default)]
pub struct MemoryChannelDirectory {
	flags: RwLock<HashMap<(TenantId, ChannelRef), bool>>,
	failures: Mutex<usize>,
}
impl MemoryChannelDirectory {
	/// Returns the mirrored flag, or `None` if the channel was never written.
	pub fn is_connected(&self, tenant: &TenantId, channel: &ChannelRef) -> Option<bool> {
		self.flags.read().get(&(tenant.clone(), channel.clone())).copied()
	}

	/// Makes the next `count` writes fail with a backend error.
	pub fn fail_next_writes(&self, count: usize) {
		*self.failures.lock() = count;
	}

	fn take_failure(&self) -> bool {
		let mut remaining = self.failures.lock();

		if *remaining == 0 {
			return false;
		}

		*remaining -= 1;

		true
	}
}
impl ChannelStatusSync for MemoryChannelDirectory {
	fn set_connected<'a>(
		&'a self,
		tenant: &'a TenantId,
		channel: &'a ChannelRef,
		connected: bool,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			if self.take_failure() {
				return Err(StoreError::Backend {
					message: format!("Channel `{channel}` could not be updated"),
				});
			}

			self.flags.write().insert((tenant.clone(), channel.clone()), connected);

			Ok(())
		})
	}
}
