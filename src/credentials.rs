//! Static credential table mapping tenant API keys to upstream accounts.
//!
//! The table is built once from configuration and shared read-only for the life of the
//! process. Resolution follows one rule: a key granted a single account always runs as that
//! account (any hint is ignored); a key granted several accounts must name one of them.

// self
use crate::{
	_prelude::*,
	auth::{AccountKey, AccountName, AccountSecret, ApiKey, secret},
	error::ConfigError,
};

/// Failures resolving an API key + account hint against the table.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CredentialError {
	/// The API key is not present in the table.
	#[error("API key {fingerprint} is not configured.")]
	UnknownApiKey {
		/// Fingerprint of the presented key.
		fingerprint: String,
	},
	/// The API key grants several accounts and no account was named.
	#[error("This API key grants several accounts; the request must name one of them.")]
	AccountRequired,
	/// The named account is not granted to the API key.
	#[error("Account `{account}` is not authorized for this API key.")]
	AccountNotAuthorized {
		/// Account named by the request.
		account: String,
	},
}

/// Accounts granted to one API key, written either as a list or as a comma-separated string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountList {
	/// `pacs: xyz00,xyz01`
	Joined(String),
	/// `pacs: [xyz00, xyz01]`
	Listed(Vec<String>),
}
impl AccountList {
	/// Account names in declaration order, trimmed, with empty segments skipped.
	pub fn names(&self) -> Vec<&str> {
		let raw: Vec<&str> = match self {
			Self::Joined(joined) => joined.split(',').collect(),
			Self::Listed(list) => list.iter().map(String::as_str).collect(),
		};

		raw.into_iter().map(str::trim).filter(|name| !name.is_empty()).collect()
	}
}

/// One `api` entry of the credential file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
	/// Tenant-facing API key.
	#[serde(alias = "api_key")]
	pub key: String,
	/// Accounts the key may act as.
	#[serde(alias = "accounts")]
	pub pacs: AccountList,
}

/// Validated, immutable credential table.
#[derive(Clone, Default)]
pub struct CredentialTable {
	secrets: HashMap<AccountName, AccountSecret>,
	grants: HashMap<ApiKey, Vec<AccountName>>,
}
impl CredentialTable {
	/// Validates and assembles a table from `account → secret` pairs and API key entries.
	pub fn new<A, E>(accounts: A, entries: E) -> Result<Self, ConfigError>
	where
		A: IntoIterator<Item = (String, String)>,
		E: IntoIterator<Item = ApiKeyEntry>,
	{
		let mut secrets = HashMap::new();

		for (name, secret) in accounts {
			let account = AccountName::new(&name).map_err(|e| ConfigError::InvalidAccount {
				account: name.clone(),
				reason: e.to_string(),
			})?;

			if secret.trim().is_empty() {
				return Err(ConfigError::InvalidAccount {
					account: name,
					reason: "secret is empty".into(),
				});
			}

			secrets.insert(account, AccountSecret::new(secret));
		}

		let mut grants = HashMap::new();

		for (index, entry) in entries.into_iter().enumerate() {
			if entry.key.trim().is_empty() {
				return Err(ConfigError::EmptyApiKey { index });
			}

			let mut accounts = Vec::<AccountName>::new();

			for name in entry.pacs.names() {
				let Some((account, _)) = secrets.get_key_value(name) else {
					return Err(ConfigError::UnknownAccount { index, account: name.into() });
				};

				if !accounts.contains(account) {
					accounts.push(account.clone());
				}
			}

			if accounts.is_empty() {
				return Err(ConfigError::NoAccounts { index });
			}

			let key = ApiKey::new(entry.key);

			if grants.contains_key(&key) {
				return Err(ConfigError::DuplicateApiKey { index, fingerprint: key.fingerprint() });
			}

			grants.insert(key, accounts);
		}

		Ok(Self { secrets, grants })
	}

	/// Number of configured upstream accounts.
	pub fn account_count(&self) -> usize {
		self.secrets.len()
	}

	/// Number of configured API keys.
	pub fn api_key_count(&self) -> usize {
		self.grants.len()
	}

	/// Accounts the API key may act as, in declaration order.
	pub fn accounts_for(&self, api_key: &str) -> Result<&[AccountName], CredentialError> {
		self.grants
			.get(api_key)
			.map(Vec::as_slice)
			.ok_or_else(|| CredentialError::UnknownApiKey { fingerprint: secret::fingerprint(api_key) })
	}

	/// Picks the upstream account a request authenticated with `api_key` runs as.
	///
	/// An empty hint counts as no hint.
	pub fn resolve(
		&self,
		api_key: &str,
		hint: Option<&str>,
	) -> Result<AccountKey, CredentialError> {
		let accounts = self.accounts_for(api_key)?;
		let hint = hint.map(str::trim).filter(|hint| !hint.is_empty());
		let account = match (accounts, hint) {
			([only], _) => only,
			(_, None) => return Err(CredentialError::AccountRequired),
			(_, Some(hint)) => accounts
				.iter()
				.find(|account| account.as_ref() == hint)
				.ok_or_else(|| CredentialError::AccountNotAuthorized { account: hint.to_owned() })?,
		};
		let secret = self
			.secrets
			.get(account)
			.cloned()
			.ok_or_else(|| CredentialError::AccountNotAuthorized { account: account.to_string() })?;

		Ok(AccountKey::new(account.clone(), secret))
	}
}
impl Debug for CredentialTable {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialTable")
			.field("accounts", &self.secrets.keys().collect::<Vec<_>>())
			.field("api_keys", &self.grants.len())
			.finish()
	}
}
