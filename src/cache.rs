//! Token acquisition, caching, and quota-aware refresh orchestration.
//!
//! [`TokenCache`] owns the current bearer token, its expiry, and the fixed-window request
//! counters. Callers use [`TokenCache::obtain`] to get a currently valid token; the cache
//! decides whether to reuse the cached secret or exchange credentials for a new one, and
//! throttles exchanges against the issuer's per-window budget. A singleflight guard ensures
//! concurrent callers piggy-back on the same in-flight refresh instead of stampeding the
//! token endpoint.

// self
use crate::{
	_prelude::*,
	endpoint::{TokenEndpoint, TokenGrant, TokenSecret},
	obs::{self, ObtainOutcome, ObtainSpan},
	quota::{DEFAULT_QUOTA_LIMIT, DEFAULT_QUOTA_WINDOW, QuotaWindow},
};

/// Token cached alongside its absolute expiry.
#[derive(Clone, Debug)]
struct CachedToken {
	secret: TokenSecret,
	token_type: String,
	expires_at: Instant,
}
impl CachedToken {
	fn from_grant(grant: TokenGrant, now: Instant) -> Self {
		Self {
			secret: grant.access_token,
			token_type: grant.token_type,
			expires_at: now + grant.expires_in,
		}
	}

	fn is_valid_at(&self, now: Instant) -> bool {
		now < self.expires_at
	}
}

/// Mutable cache state. Token, expiry, and window counters form one atomic unit and are only
/// ever written together under the state lock.
struct CacheState {
	token: Option<CachedToken>,
	window: QuotaWindow,
	/// Completed refresh attempts, successful or not.
	attempt: u64,
	/// Outcome of the most recent failed refresh, tagged with its attempt number so callers
	/// that were already waiting when it completed can share it.
	last_failure: Option<(u64, Error)>,
}

/// Read-only snapshot of the cache for diagnostics.
#[derive(Clone, Debug)]
pub struct CacheStatus {
	/// Remaining validity of the cached token, if one is present and unexpired.
	pub token_valid_for: Option<Duration>,
	/// Token type tag of the most recently cached token.
	pub token_type: Option<String>,
	/// Requests recorded against the current window.
	pub requests_used: u32,
	/// Request ceiling per window.
	pub requests_limit: u32,
	/// Time until the current window resets.
	pub window_resets_in: Duration,
}

/// Credential cache that reuses bearer tokens and throttles refreshes.
///
/// Construct one instance at startup and hand it by reference (or inside an [`Arc`]) to every
/// component that needs authenticated calls; there is no ambient global.
pub struct TokenCache<E>
where
	E: ?Sized + TokenEndpoint,
{
	endpoint: Arc<E>,
	state: Mutex<CacheState>,
	/// Serializes refreshes so at most one fetch is ever in flight.
	refresh: AsyncMutex<()>,
}
impl<E> TokenCache<E>
where
	E: ?Sized + TokenEndpoint,
{
	/// Creates a cache over the provided endpoint with the default quota of
	/// [`DEFAULT_QUOTA_LIMIT`] requests per [`DEFAULT_QUOTA_WINDOW`], anchored at construction
	/// time.
	///
	/// The endpoint is taken as an explicit [`Arc`] so callers can keep a handle to it and so
	/// `Arc<dyn TokenEndpoint>` works without type annotations.
	pub fn new(endpoint: Arc<E>) -> Self {
		let now = Instant::now();

		Self {
			endpoint,
			state: Mutex::new(CacheState {
				token: None,
				window: QuotaWindow::new(DEFAULT_QUOTA_LIMIT, DEFAULT_QUOTA_WINDOW, now),
				attempt: 0,
				last_failure: None,
			}),
			refresh: AsyncMutex::new(()),
		}
	}

	/// Overrides the per-window request ceiling, restarting the window at the current instant.
	pub fn with_quota_limit(mut self, limit: u32) -> Self {
		let state = self.state.get_mut();

		state.window = QuotaWindow::new(limit, state.window.length(), Instant::now());

		self
	}

	/// Overrides the window length, restarting the window at the current instant.
	pub fn with_quota_window(mut self, length: Duration) -> Self {
		let state = self.state.get_mut();

		state.window = QuotaWindow::new(state.window.limit(), length, Instant::now());

		self
	}

	/// Returns a currently valid bearer token, fetching a new one when needed.
	///
	/// The fast path returns the cached secret with no network call and no side effects. On a
	/// cache miss the call serializes behind any in-flight refresh, suspends until the quota
	/// window resets when the budget is spent, and performs a single exchange. A failed
	/// exchange surfaces as [`Error::Fetch`] and is never retried internally; calling again
	/// re-enters the expiry and quota logic.
	pub async fn obtain(&self) -> Result<TokenSecret> {
		self.obtain_with_cancel(std::future::pending()).await
	}

	/// Same as [`TokenCache::obtain`], failing with [`Error::Cancelled`] if `cancel` completes
	/// while the call is waiting on the in-flight refresh, the quota window, or the exchange
	/// itself. Cancellation never corrupts shared state.
	pub async fn obtain_with_cancel<F>(&self, cancel: F) -> Result<TokenSecret>
	where
		F: Future<Output = ()>,
	{
		let span = ObtainSpan::new("obtain");

		obs::record_obtain_outcome(ObtainOutcome::Attempt);

		let result = span.instrument(self.obtain_inner(cancel)).await;

		match &result {
			Ok(_) => obs::record_obtain_outcome(ObtainOutcome::Success),
			Err(_) => obs::record_obtain_outcome(ObtainOutcome::Failure),
		}

		result
	}

	async fn obtain_inner<F>(&self, cancel: F) -> Result<TokenSecret>
	where
		F: Future<Output = ()>,
	{
		tokio::pin!(cancel);

		// Fast path: cached and strictly before expiry.
		let joined_at = {
			let state = self.state.lock();

			if let Some(secret) = Self::cached_secret(&state) {
				return Ok(secret);
			}

			state.attempt
		};

		// A refresh is required; serialize behind any in-flight one.
		let _refresh = tokio::select! {
			guard = self.refresh.lock() => guard,
			() = &mut cancel => return Err(Error::Cancelled),
		};

		// Re-check under the guard: the refresh that just finished may have stored a fresh
		// token, or failed while this caller was already waiting, in which case its error is
		// this caller's error too.
		{
			let state = self.state.lock();

			if let Some(secret) = Self::cached_secret(&state) {
				return Ok(secret);
			}

			let failed_while_waiting = state
				.last_failure
				.as_ref()
				.filter(|(attempt, _)| *attempt > joined_at)
				.map(|(_, error)| error.clone());

			if let Some(error) = failed_while_waiting {
				return Err(error);
			}
		}

		// Quota: suspend until the window rolls when the budget is spent.
		let deadline = {
			let mut state = self.state.lock();

			state.window.exhausted_until(Instant::now())
		};

		if let Some(deadline) = deadline {
			obs::record_quota_wait(deadline.saturating_duration_since(Instant::now()));

			tokio::select! {
				() = tokio::time::sleep_until(deadline) => {},
				() = &mut cancel => return Err(Error::Cancelled),
			}

			self.state.lock().window.tick(Instant::now());
		}

		obs::record_obtain_outcome(ObtainOutcome::Refresh);

		let fetched = tokio::select! {
			result = self.endpoint.fetch() => result,
			() = &mut cancel => return Err(Error::Cancelled),
		};
		let mut state = self.state.lock();
		let now = Instant::now();

		state.attempt += 1;

		match fetched {
			Ok(grant) => {
				state.window.note_request(now);

				let token = CachedToken::from_grant(grant, now);
				let secret = token.secret.clone();

				state.token = Some(token);
				state.last_failure = None;

				Ok(secret)
			},
			Err(e) => {
				if e.counts_against_quota() {
					state.window.note_request(now);
				}

				let error = Error::from(e);

				state.last_failure = Some((state.attempt, error.clone()));

				Err(error)
			},
		}
	}

	/// Reports a point-in-time snapshot of the cache for diagnostics.
	pub fn status(&self) -> CacheStatus {
		let mut state = self.state.lock();
		let now = Instant::now();

		state.window.tick(now);

		CacheStatus {
			token_valid_for: state
				.token
				.as_ref()
				.filter(|token| token.is_valid_at(now))
				.map(|token| token.expires_at - now),
			token_type: state.token.as_ref().map(|token| token.token_type.clone()),
			requests_used: state.window.used(),
			requests_limit: state.window.limit(),
			window_resets_in: state.window.resets_at() - now,
		}
	}

	fn cached_secret(state: &CacheState) -> Option<TokenSecret> {
		let secret = state
			.token
			.as_ref()
			.filter(|token| token.is_valid_at(Instant::now()))
			.map(|token| token.secret.clone())?;

		obs::record_obtain_outcome(ObtainOutcome::Hit);

		Some(secret)
	}
}
impl<E> Debug for TokenCache<E>
where
	E: ?Sized + TokenEndpoint,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenCache")
			.field("token_cached", &state.token.is_some())
			.field("requests_used", &state.window.used())
			.finish()
	}
}
