//! Quota-aware bearer token cache. Obtain, reuse, and refresh client-credential access tokens
//! without tripping the issuer's request ceiling.
//!
//! The crate centers on [`cache::TokenCache`]: it owns the current token, its expiry, and the
//! fixed-window request counters, and exposes a single operation to obtain a currently valid
//! token. The network exchange itself lives behind the [`endpoint::TokenEndpoint`] contract so
//! transports can be swapped or faked; a reqwest-backed implementation ships behind the
//! `reqwest` feature (on by default).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod endpoint;
pub mod error;
#[cfg(feature = "reqwest")] pub mod http;
pub mod obs;
pub mod quota;
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and fixtures shared by the crate's integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{endpoint::ClientCredentials, http::ReqwestTokenEndpoint};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "warden-client";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "warden-secret";

	/// Credentials fixture shared across integration tests.
	pub fn test_credentials() -> ClientCredentials {
		ClientCredentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
	}

	/// Builds a reqwest-backed endpoint pointed at a mock server's `/token` route.
	pub fn mock_token_endpoint(base_url: &str) -> ReqwestTokenEndpoint {
		let url = Url::parse(&format!("{base_url}/token"))
			.expect("Mock token URL should parse successfully.");

		ReqwestTokenEndpoint::new(url, test_credentials())
			.expect("Reqwest endpoint should build successfully for tests.")
	}

	/// Renders a minimal success payload in the token endpoint's wire shape.
	pub fn grant_body(token: &str, expires_in: i64) -> String {
		format!(
			"{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}"
		)
	}
}

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use tokio::time::Instant;
	#[cfg(feature = "reqwest")]
	pub use url::Url;

	pub use crate::error::{Error, FetchError, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
