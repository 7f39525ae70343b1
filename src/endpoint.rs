//! Token endpoint collaborator contract plus the credential and grant types it exchanges.

// self
use crate::_prelude::*;

/// Boxed future returned by [`TokenEndpoint::fetch`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TokenGrant, FetchError>> + 'a + Send>>;

/// Capability that trades client credentials for a fresh bearer token.
///
/// The cache depends only on this abstract exchange, so the transport can be swapped or faked
/// in tests. The cache guarantees at most one in-flight call at a time.
pub trait TokenEndpoint
where
	Self: Send + Sync,
{
	/// Performs the network exchange and returns the issued grant.
	fn fetch(&self) -> FetchFuture<'_>;
}

/// Redacted bearer secret wrapper keeping token material out of logs.
#[derive(Clone)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the `Authorization` header value downstream consumers attach to their requests.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Client identifier plus confidential secret presented to the token endpoint.
#[derive(Clone, Debug)]
pub struct ClientCredentials {
	/// OAuth-style client identifier.
	pub client_id: String,
	/// Client secret; redacted in debug output.
	pub client_secret: TokenSecret,
}
impl ClientCredentials {
	/// Creates a credential pair.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: TokenSecret::new(client_secret) }
	}
}

/// Wire shape of a successful token endpoint response.
#[derive(Debug, Deserialize)]
struct WireTokenResponse {
	access_token: String,
	expires_in: i64,
	token_type: String,
}

/// Successful result of a token fetch; transient, never stored beyond extraction into the
/// cache.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Issued bearer secret.
	pub access_token: TokenSecret,
	/// Token type tag reported by the endpoint (typically `bearer`).
	pub token_type: String,
	/// Validity period of the grant. Always positive when built through [`TokenGrant::from_wire`].
	pub expires_in: Duration,
}
impl TokenGrant {
	/// Validates raw wire fields into a grant, rejecting non-positive lifetimes.
	pub fn from_wire(
		access_token: impl Into<String>,
		token_type: impl Into<String>,
		expires_in_secs: i64,
	) -> Result<Self, FetchError> {
		if expires_in_secs <= 0 {
			return Err(FetchError::NonPositiveLifetime { seconds: expires_in_secs });
		}

		Ok(Self {
			access_token: TokenSecret::new(access_token),
			token_type: token_type.into(),
			expires_in: Duration::from_secs(expires_in_secs as u64),
		})
	}

	/// Parses a JSON token response body, attributing the HTTP status to parse failures.
	pub fn from_json_slice(body: &[u8], status: Option<u16>) -> Result<Self, FetchError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);
		let wire: WireTokenResponse = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| FetchError::Payload { source, status })?;

		Self::from_wire(wire.access_token, wire.token_type, wire.expires_in)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer(), "Bearer super-secret");
	}

	#[test]
	fn credentials_redact_the_secret_only() {
		let credentials = ClientCredentials::new("app-1", "hunter2");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("app-1"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn wire_parsing_accepts_the_documented_shape() {
		let body = br#"{"access_token":"abc","token_type":"bearer","expires_in":10}"#;
		let grant = TokenGrant::from_json_slice(body, Some(200))
			.expect("Documented wire shape should parse successfully.");

		assert_eq!(grant.access_token.expose(), "abc");
		assert_eq!(grant.token_type, "bearer");
		assert_eq!(grant.expires_in, Duration::from_secs(10));
	}

	#[test]
	fn malformed_payloads_surface_the_status() {
		let err = TokenGrant::from_json_slice(b"{\"access_token\":42}", Some(200))
			.expect_err("Malformed payloads should be rejected.");

		assert!(matches!(err, FetchError::Payload { status: Some(200), .. }));
	}

	#[test]
	fn non_positive_lifetimes_are_rejected() {
		for seconds in [0, -30] {
			let err = TokenGrant::from_wire("abc", "bearer", seconds)
				.expect_err("Non-positive lifetimes should be rejected.");

			assert!(matches!(err, FetchError::NonPositiveLifetime { seconds: got } if got == seconds));
		}
	}
}
