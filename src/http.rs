//! Reqwest-backed [`TokenEndpoint`] transport.

// crates.io
use reqwest::{
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use time::{OffsetDateTime, format_description::well_known::Rfc2822};
// self
use crate::{
	_prelude::*,
	endpoint::{ClientCredentials, FetchFuture, TokenEndpoint, TokenGrant},
};

/// [`TokenEndpoint`] implementation that POSTs a form-url-encoded credential exchange to a
/// fixed token URL.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly instead of delegating to another URI. Configure any
/// custom [`ReqwestClient`] passed to [`ReqwestTokenEndpoint::with_client`] accordingly.
#[derive(Clone, Debug)]
pub struct ReqwestTokenEndpoint {
	client: ReqwestClient,
	token_url: Url,
	credentials: ClientCredentials,
}
impl ReqwestTokenEndpoint {
	/// Creates an endpoint with a private client that never follows redirects.
	pub fn new(token_url: Url, credentials: ClientCredentials) -> Result<Self, FetchError> {
		let client = ReqwestClient::builder()
			.redirect(Policy::none())
			.build()
			.map_err(FetchError::request_build)?;

		Ok(Self::with_client(client, token_url, credentials))
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, token_url: Url, credentials: ClientCredentials) -> Self {
		Self { client, token_url, credentials }
	}
}
impl TokenEndpoint for ReqwestTokenEndpoint {
	fn fetch(&self) -> FetchFuture<'_> {
		Box::pin(async move {
			let response = self
				.client
				.post(self.token_url.clone())
				.form(&[
					("client_id", self.credentials.client_id.as_str()),
					("client_secret", self.credentials.client_secret.expose()),
				])
				.send()
				.await
				.map_err(FetchError::from)?;
			let status = response.status();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(FetchError::from)?;

			if !status.is_success() {
				return Err(FetchError::Status {
					status: status.as_u16(),
					body: String::from_utf8_lossy(&body).into_owned(),
					retry_after,
				});
			}

			TokenGrant::from_json_slice(&body, Some(status.as_u16()))
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return delta.try_into().ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers_with_retry_after(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			HeaderValue::from_str(value).expect("Retry-After fixture should be a valid header."),
		);

		headers
	}

	#[test]
	fn retry_after_parses_delta_seconds() {
		let headers = headers_with_retry_after("120");

		assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(120)));
	}

	#[test]
	fn retry_after_parses_rfc2822_dates() {
		let future = OffsetDateTime::now_utc() + time::Duration::minutes(5);
		let formatted =
			future.format(&Rfc2822).expect("Future instant should format as RFC 2822.");
		let headers = headers_with_retry_after(&formatted);
		let parsed = parse_retry_after(&headers).expect("A future date should yield a delay.");

		assert!(parsed <= Duration::from_secs(300));
		assert!(parsed > Duration::from_secs(290));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let past = OffsetDateTime::now_utc() - time::Duration::minutes(5);
		let formatted = past.format(&Rfc2822).expect("Past instant should format as RFC 2822.");

		assert_eq!(parse_retry_after(&headers_with_retry_after(&formatted)), None);
		assert_eq!(parse_retry_after(&headers_with_retry_after("soonish")), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}
}
