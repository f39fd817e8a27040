//! Per-account grant pool handing out exclusive, reusable grant leases.
//!
//! The upstream allows one live service-ticket chain per grant, and issuing a grant for an
//! account invalidates the previous one. To run concurrent requests for the same account the
//! pool keeps a free-list of unleased grants per [`AccountKey`]: acquiring pops the oldest
//! still-valid grant (purging expired ones on the way), and only on a miss does it ask the
//! [`TicketIssuer`] for a new grant. A [`GrantLease`] owns its grant exclusively until it is
//! dropped, at which point the grant goes back to the tail of its free-list.
//!
//! The bookkeeping lock is a synchronous [`Mutex`] held only for list manipulation; it is
//! never held across issuance or upstream calls, so network latency never serializes
//! unrelated accounts.

pub mod grant;
pub mod lease;

pub use grant::*;
pub use lease::*;

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::AccountKey,
	config::PoolConfig,
	issuer::TicketIssuer,
	obs::{self, PoolEvent},
};

type FreeLists = HashMap<AccountKey, VecDeque<Grant>>;

/// Owned grant pool shared by all gateway requests.
pub struct GrantPool {
	issuer: Arc<dyn TicketIssuer>,
	config: PoolConfig,
	free: Mutex<FreeLists>,
	// Only accounts with an issuance in progress have an entry.
	issuance_guards: Mutex<HashMap<AccountKey, Arc<AsyncMutex<()>>>>,
	metrics: PoolMetrics,
}
impl GrantPool {
	/// Creates an empty pool that issues grants through `issuer`.
	pub fn new(issuer: Arc<dyn TicketIssuer>, config: PoolConfig) -> Self {
		Self {
			issuer,
			config,
			free: Default::default(),
			issuance_guards: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Issuer used for grants and service tickets.
	pub fn issuer(&self) -> &dyn TicketIssuer {
		self.issuer.as_ref()
	}

	/// Pool tuning in effect.
	pub fn config(&self) -> &PoolConfig {
		&self.config
	}

	/// Counters describing pool activity since construction.
	pub fn metrics(&self) -> &PoolMetrics {
		&self.metrics
	}

	/// Leases a grant for `account`, issuing a new one when no cached grant is usable.
	///
	/// The returned [`GrantLease`] holds the grant exclusively and returns it to the pool when
	/// dropped, including when the surrounding future is cancelled. Issuance failures are
	/// propagated unchanged and leave the pool untouched.
	pub async fn acquire(&self, account: &AccountKey) -> Result<GrantLease<'_>> {
		if let Some(grant) = self.take_cached(account, OffsetDateTime::now_utc()) {
			return Ok(GrantLease::new(self, account.clone(), grant));
		}
		if !self.config.serialize_issuance {
			return self.issue(account).await;
		}

		let guard = self.issuance_guard(account);
		let leased = {
			let _issuing = guard.lock().await;

			// Another lease may have come back while this caller waited for the guard.
			match self.take_cached(account, OffsetDateTime::now_utc()) {
				Some(grant) => Ok(GrantLease::new(self, account.clone(), grant)),
				None => self.issue(account).await,
			}
		};

		drop(guard);
		self.retire_issuance_guard(account);

		leased
	}

	/// Runs `op` while holding a lease for `account`.
	///
	/// `op` receives a copy of the leased grant; the lease itself stays with this call and is
	/// released on every exit path. When [`PoolConfig::lease_timeout`] is set and `op` overruns
	/// it, `op` is abandoned, the grant is released, and [`Error::LeaseTimeout`] is returned.
	pub async fn with_grant<T, F, Fut>(&self, account: &AccountKey, op: F) -> Result<T>
	where
		F: FnOnce(Grant) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		let lease = self.acquire(account).await?;
		let fut = op(lease.grant().clone());
		let Some(deadline) = self.config.lease_timeout else {
			return fut.await;
		};
		let limit = std::time::Duration::try_from(deadline).unwrap_or_default();

		match tokio::time::timeout(limit, fut).await {
			Ok(result) => result,
			Err(_) => {
				self.metrics.timeouts.fetch_add(1, Ordering::Relaxed);
				obs::record_pool_event(PoolEvent::TimedOut);
				obs::lease_timed_out(&account.name, deadline);

				drop(lease);

				Err(Error::LeaseTimeout { account: account.name.to_string(), after: deadline })
			},
		}
	}

	/// Places an externally obtained grant on the free-list for `account`.
	///
	/// Useful for warm starts; expired grants are ignored.
	pub fn seed(&self, account: &AccountKey, grant: Grant) {
		if grant.is_expired() {
			return;
		}

		self.free.lock().entry(account.clone()).or_default().push_back(grant);
	}

	/// Number of unleased grants currently cached for `account`, expired ones included.
	pub fn idle_count(&self, account: &AccountKey) -> usize {
		self.free.lock().get(account).map_or(0, VecDeque::len)
	}

	/// Pops the oldest valid grant for `account`, discarding expired entries before it.
	fn take_cached(&self, account: &AccountKey, now: OffsetDateTime) -> Option<Grant> {
		let (found, purged) = {
			let mut free = self.free.lock();
			let mut purged = 0;
			let mut found = None;

			if let Some(list) = free.get_mut(account) {
				while let Some(grant) = list.pop_front() {
					if grant.is_expired_at(now) {
						purged += 1;

						continue;
					}

					found = Some(grant);

					break;
				}

				if list.is_empty() {
					free.remove(account);
				}
			}

			(found, purged)
		};

		if purged > 0 {
			self.metrics.purged.fetch_add(purged as u64, Ordering::Relaxed);
			obs::record_pool_event(PoolEvent::Purged);
			obs::grants_purged(&account.name, purged);
		}
		if found.is_some() {
			self.metrics.hits.fetch_add(1, Ordering::Relaxed);
			obs::record_pool_event(PoolEvent::Hit);
		}

		found
	}

	async fn issue(&self, account: &AccountKey) -> Result<GrantLease<'_>> {
		let token = self.issuer.issue_grant(account).await?;
		let grant = Grant::new(token, OffsetDateTime::now_utc(), self.config.lease_horizon);

		self.metrics.issued.fetch_add(1, Ordering::Relaxed);
		obs::record_pool_event(PoolEvent::Issued);
		obs::grant_issued(&account.name, grant.expires_at);

		Ok(GrantLease::new(self, account.clone(), grant))
	}

	/// Returns a leased grant to the tail of its free-list, or drops it once expired.
	pub(crate) fn release(&self, account: AccountKey, grant: Grant) {
		if grant.is_expired() {
			self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
			obs::record_pool_event(PoolEvent::Dropped);
			obs::grant_dropped(&account.name);

			return;
		}

		self.free.lock().entry(account).or_default().push_back(grant);
		self.metrics.released.fetch_add(1, Ordering::Relaxed);
		obs::record_pool_event(PoolEvent::Released);
	}

	/// Returns (and creates on demand) the issuance guard for an account.
	fn issuance_guard(&self, account: &AccountKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.issuance_guards.lock();

		guards.entry(account.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Removes the issuance guard for an account once no caller holds or awaits it.
	///
	/// A caller cancelled while waiting skips this; the next issuance for the account retires
	/// the entry instead.
	fn retire_issuance_guard(&self, account: &AccountKey) {
		let mut guards = self.issuance_guards.lock();

		if guards.get(account).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(account);
		}
	}
}
impl Debug for GrantPool {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GrantPool")
			.field("config", &self.config)
			.field("accounts", &self.free.lock().len())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Thread-safe counters for pool activity.
#[derive(Debug, Default)]
pub struct PoolMetrics {
	hits: AtomicU64,
	issued: AtomicU64,
	purged: AtomicU64,
	released: AtomicU64,
	dropped: AtomicU64,
	timeouts: AtomicU64,
}
impl PoolMetrics {
	/// Acquisitions satisfied from a free-list.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Grants obtained from the issuer.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Expired grants discarded during acquisition.
	pub fn purged(&self) -> u64 {
		self.purged.load(Ordering::Relaxed)
	}

	/// Grants returned to a free-list.
	pub fn released(&self) -> u64 {
		self.released.load(Ordering::Relaxed)
	}

	/// Grants dropped on release because they had expired.
	pub fn dropped(&self) -> u64 {
		self.dropped.load(Ordering::Relaxed)
	}

	/// Leased operations abandoned at their deadline.
	pub fn timeouts(&self) -> u64 {
		self.timeouts.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::AtomicUsize;
	// self
	use super::*;
	use crate::{
		auth::{AccountName, AccountSecret},
		issuer::{IssuerFuture, ServiceTicket},
	};

	#[derive(Default)]
	struct CountingIssuer {
		calls: AtomicUsize,
	}
	impl TicketIssuer for CountingIssuer {
		fn issue_grant<'a>(&'a self, account: &'a AccountKey) -> IssuerFuture<'a, GrantToken> {
			let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			Box::pin(async move { Ok(GrantToken::new(format!("{}-grant-{n}", account.name))) })
		}

		fn issue_service_ticket<'a>(
			&'a self,
			_grant: &'a GrantToken,
		) -> IssuerFuture<'a, ServiceTicket> {
			Box::pin(async { Ok(ServiceTicket::new("ST-1")) })
		}
	}

	fn account(name: &str) -> AccountKey {
		AccountKey::new(
			AccountName::new(name).expect("Account fixture should be valid."),
			AccountSecret::new("secret"),
		)
	}

	fn grant(token: &str, age: Duration, horizon: Duration) -> Grant {
		Grant::new(GrantToken::new(token), OffsetDateTime::now_utc() - age, horizon)
	}

	fn pool() -> (GrantPool, Arc<CountingIssuer>) {
		let issuer = Arc::new(CountingIssuer::default());

		(GrantPool::new(issuer.clone(), PoolConfig::default()), issuer)
	}

	#[test]
	fn take_cached_purges_expired_entries_in_order() {
		let (pool, _) = pool();
		let xyz = account("xyz00");
		let now = OffsetDateTime::now_utc();

		pool.free.lock().insert(
			xyz.clone(),
			VecDeque::from([
				grant("expired", Duration::hours(2), Duration::hours(1)),
				grant("valid-old", Duration::ZERO, Duration::hours(1)),
				grant("valid-new", Duration::ZERO, Duration::hours(1)),
			]),
		);

		let first = pool.take_cached(&xyz, now).expect("A valid grant should be cached.");

		assert_eq!(first.token.expose(), "valid-old");
		assert_eq!(pool.idle_count(&xyz), 1);
		assert_eq!(pool.metrics().purged(), 1);
		assert_eq!(pool.metrics().hits(), 1);
	}

	#[test]
	fn take_cached_removes_exhausted_lists() {
		let (pool, _) = pool();
		let xyz = account("xyz00");

		pool.free.lock().insert(
			xyz.clone(),
			VecDeque::from([grant("old", Duration::hours(2), Duration::hours(1))]),
		);

		assert!(pool.take_cached(&xyz, OffsetDateTime::now_utc()).is_none());
		assert!(!pool.free.lock().contains_key(&xyz));
	}

	#[tokio::test]
	async fn lease_returns_grant_on_drop() {
		let (pool, issuer) = pool();
		let xyz = account("xyz00");

		{
			let lease = pool.acquire(&xyz).await.expect("Acquire should issue a grant.");

			assert_eq!(lease.grant().token.expose(), "xyz00-grant-1");
			assert_eq!(pool.idle_count(&xyz), 0);
		}

		assert_eq!(pool.idle_count(&xyz), 1);

		let lease = pool.acquire(&xyz).await.expect("Second acquire should hit the cache.");

		assert_eq!(lease.grant().token.expose(), "xyz00-grant-1");
		assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn release_drops_grants_that_expired_while_leased() {
		let (pool, _) = pool();
		let xyz = account("xyz00");

		pool.release(xyz.clone(), grant("stale", Duration::hours(2), Duration::hours(1)));

		assert_eq!(pool.idle_count(&xyz), 0);
		assert_eq!(pool.metrics().dropped(), 1);
	}

	#[tokio::test]
	async fn serialized_issuance_retires_its_guard() {
		let issuer = Arc::new(CountingIssuer::default());
		let config = PoolConfig { serialize_issuance: true, ..Default::default() };
		let pool = GrantPool::new(issuer.clone(), config);
		let xyz = account("xyz00");
		let (first, second) = tokio::join!(pool.acquire(&xyz), pool.acquire(&xyz));
		let first = first.expect("First acquire should issue a grant.");
		let second = second.expect("Second acquire should issue a grant.");

		assert_ne!(first.grant().token.expose(), second.grant().token.expose());
		assert!(pool.issuance_guards.lock().is_empty());

		drop((first, second));

		let _lease = pool.acquire(&xyz).await.expect("Cached grant should be leased.");

		assert_eq!(issuer.calls.load(Ordering::SeqCst), 2);
		assert!(pool.issuance_guards.lock().is_empty());
	}

	#[test]
	fn seed_ignores_expired_grants() {
		let (pool, _) = pool();
		let xyz = account("xyz00");

		pool.seed(&xyz, grant("stale", Duration::hours(2), Duration::hours(1)));
		pool.seed(&xyz, grant("fresh", Duration::ZERO, Duration::hours(1)));

		assert_eq!(pool.idle_count(&xyz), 1);
	}
}
