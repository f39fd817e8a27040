//! Account keys partitioning the grant pool.

// self
use crate::{
	_prelude::*,
	auth::{AccountName, AccountSecret},
};

/// Identity under which upstream calls are authenticated.
///
/// Equality is structural: two keys with the same name but different secrets are distinct
/// pool partitions, so a rotated password never reuses grants issued for the old one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountKey {
	/// Upstream account name.
	pub name: AccountName,
	/// Upstream account password.
	pub secret: AccountSecret,
}
impl AccountKey {
	/// Creates a key for the provided name and secret.
	pub fn new(name: AccountName, secret: AccountSecret) -> Self {
		Self { name, secret }
	}
}
impl Display for AccountKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.name)
	}
}
