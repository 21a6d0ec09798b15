//! Caller identity and tenant resolution.

// self
use crate::{
	_prelude::*,
	auth::{Secret, TenantId},
};

/// Boxed future returned by [`TenantResolver::resolve`].
pub type TenantFuture<'a> = Pin<Box<dyn Future<Output = Result<TenantId>> + 'a + Send>>;

/// Credentials presented by the caller of the broker.
#[derive(Clone, Debug, Default)]
pub struct CallerIdentity {
	/// Bearer token of the application session, if any.
	pub bearer: Option<Secret>,
}
impl CallerIdentity {
	/// Identity carrying a bearer token.
	pub fn bearer(token: impl Into<Secret>) -> Self {
		Self { bearer: Some(token.into()) }
	}

	/// Identity with no credentials.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Non-blank bearer token.
	pub fn token(&self) -> Option<&Secret> {
		self.bearer.as_ref().filter(|token| !token.is_blank())
	}
}

/// Resolves the active tenant of an authenticated caller.
///
/// Implementations return [`Error::Unauthenticated`] when the identity is missing or invalid,
/// and [`Error::TenantResolution`] when the caller is known but has no active tenant.
pub trait TenantResolver
where
	Self: Send + Sync,
{
	/// Resolves `caller` to a tenant.
	fn resolve<'a>(&'a self, caller: &'a CallerIdentity) -> TenantFuture<'a>;
}

/// Resolver backed by a fixed bearer-to-tenant table.
#[derive(Clone, Debug, Default)]
pub struct StaticTenantResolver {
	callers: HashMap<String, Option<TenantId>>,
}
impl StaticTenantResolver {
	/// Accepts `bearer` and resolves it to `tenant`.
	pub fn with_caller(mut self, bearer: impl Into<String>, tenant: TenantId) -> Self {
		self.callers.insert(bearer.into(), Some(tenant));

		self
	}

	/// Accepts `bearer` as a valid session that has no active tenant.
	pub fn with_tenantless_caller(mut self, bearer: impl Into<String>) -> Self {
		self.callers.insert(bearer.into(), None);

		self
	}

	fn resolve_now(&self, caller: &CallerIdentity) -> Result<TenantId> {
		let token = caller
			.token()
			.ok_or_else(|| Error::Unauthenticated { reason: "no bearer token supplied".into() })?;

		match self.callers.get(token.expose()) {
			Some(Some(tenant)) => Ok(tenant.clone()),
			Some(None) =>
				Err(Error::TenantResolution { reason: "caller has no active tenant".into() }),
			None => Err(Error::Unauthenticated { reason: "bearer token is not recognized".into() }),
		}
	}
}
impl TenantResolver for StaticTenantResolver {
	fn resolve<'a>(&'a self, caller: &'a CallerIdentity) -> TenantFuture<'a> {
		Box::pin(async move { self.resolve_now(caller) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn resolver() -> StaticTenantResolver {
		StaticTenantResolver::default()
			.with_caller("good", TenantId::new("tenant-1").expect("Tenant fixture should be valid."))
			.with_tenantless_caller("orphan")
	}

	#[tokio::test]
	async fn resolves_known_callers() {
		let tenant = resolver()
			.resolve(&CallerIdentity::bearer("good"))
			.await
			.expect("Known caller should resolve.");

		assert_eq!(tenant.as_ref(), "tenant-1");
	}

	#[tokio::test]
	async fn classifies_failures() {
		let resolver = resolver();

		assert!(matches!(
			resolver.resolve(&CallerIdentity::anonymous()).await,
			Err(Error::Unauthenticated { .. })
		));
		assert!(matches!(
			resolver.resolve(&CallerIdentity::bearer("  ")).await,
			Err(Error::Unauthenticated { .. })
		));
		assert!(matches!(
			resolver.resolve(&CallerIdentity::bearer("unknown")).await,
			Err(Error::Unauthenticated { .. })
		));
		assert!(matches!(
			resolver.resolve(&CallerIdentity::bearer("orphan")).await,
			Err(Error::TenantResolution { .. })
		));
	}
}
