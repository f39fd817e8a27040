//! RAII lease over a pooled grant.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::AccountKey,
	pool::{Grant, GrantPool},
};

/// Exclusive use of one [`Grant`]; dropping the lease returns the grant to its pool.
///
/// Release happens in [`Drop`], so it runs on success, on `?` propagation, on panic
/// unwinding, and when the owning future is cancelled mid-flight.
pub struct GrantLease<'p> {
	pool: &'p GrantPool,
	account: AccountKey,
	grant: Grant,
}
impl<'p> GrantLease<'p> {
	pub(crate) fn new(pool: &'p GrantPool, account: AccountKey, grant: Grant) -> Self {
		Self { pool, account, grant }
	}

	/// Account the grant belongs to.
	pub fn account(&self) -> &AccountKey {
		&self.account
	}

	/// Leased grant.
	pub fn grant(&self) -> &Grant {
		&self.grant
	}
}
impl Deref for GrantLease<'_> {
	type Target = Grant;

	fn deref(&self) -> &Self::Target {
		self.grant()
	}
}
impl Drop for GrantLease<'_> {
	fn drop(&mut self) {
		self.pool.release(self.account.clone(), self.grant.clone());
	}
}
impl Debug for GrantLease<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GrantLease")
			.field("account", &self.account.name)
			.field("grant", &self.grant)
			.finish()
	}
}
