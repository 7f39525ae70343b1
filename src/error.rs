//! Cache-level error types shared by the obtain path and endpoint transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by [`TokenCache::obtain`](crate::cache::TokenCache::obtain).
///
/// The type is `Clone` so callers coalesced onto the same in-flight refresh all receive the
/// failure that ended it; the fetch cause is shared behind an [`Arc`].
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// The token endpoint failed to produce a usable token.
	#[error(transparent)]
	Fetch(Arc<FetchError>),
	/// The caller's cancellation signal fired while waiting on quota or an in-flight refresh.
	#[error("Token request was cancelled while waiting.")]
	Cancelled,
}
impl Error {
	/// Returns the underlying fetch failure, if this error came from the endpoint.
	pub fn fetch_cause(&self) -> Option<&FetchError> {
		match self {
			Self::Fetch(cause) => Some(cause.as_ref()),
			Self::Cancelled => None,
		}
	}
}
impl From<FetchError> for Error {
	fn from(e: FetchError) -> Self {
		Self::Fetch(Arc::new(e))
	}
}

/// Failure raised while exchanging client credentials against the token endpoint.
#[derive(Debug, ThisError)]
pub enum FetchError {
	/// Endpoint answered with a non-2xx status.
	#[error("Token endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Response body captured for diagnostics.
		body: String,
		/// Retry-After hint expressed as a relative duration, if supplied.
		retry_after: Option<Duration>,
	},
	/// Endpoint answered 2xx with a body that could not be parsed.
	#[error("Token endpoint returned a malformed payload.")]
	Payload {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Endpoint reported a token lifetime of zero or less.
	#[error("Token endpoint reported a non-positive lifetime of {seconds} seconds.")]
	NonPositiveLifetime {
		/// The `expires_in` value as received.
		seconds: i64,
	},
	/// Request was dispatched but failed in transit (timeout, broken connection).
	#[error("Network error occurred while calling the token endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Connection to the endpoint was never established.
	#[error("Failed to connect to the token endpoint.")]
	Connect {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Request failed locally before anything was sent.
	#[error("Token request could not be constructed.")]
	RequestBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
}
impl FetchError {
	/// Wraps a transport failure that occurred after the request was dispatched.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Wraps a failure to establish a connection to the endpoint.
	pub fn connect(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Connect { source: Box::new(src) }
	}

	/// Wraps a failure that happened before the request left the process.
	pub fn request_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestBuild { source: Box::new(src) }
	}

	/// Whether this failure consumed the issuer's quota.
	///
	/// Requests that never reached the issuer do not count against the fixed-window budget.
	pub fn counts_against_quota(&self) -> bool {
		!matches!(self, Self::Connect { .. } | Self::RequestBuild { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for FetchError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			Self::request_build(e)
		} else if e.is_connect() {
			Self::connect(e)
		} else {
			Self::transport(e)
		}
	}
}
