//! Minimal end-to-end demo: build a cache over a real endpoint, obtain a token, and attach it
//! as a bearer header on a downstream request.

// std
use std::sync::Arc;
// crates.io
use token_warden::{
	cache::TokenCache, endpoint::ClientCredentials, http::ReqwestTokenEndpoint, reqwest, url::Url,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let token_url = Url::parse("https://api.example.com/token")?;
	let credentials = ClientCredentials::new("your_client_id", "your_client_secret");
	let endpoint = ReqwestTokenEndpoint::new(token_url, credentials)?;
	let cache = TokenCache::new(Arc::new(endpoint));

	// Repeated obtains reuse the cached token until it expires; refreshes are throttled to
	// the issuer's per-window budget automatically.
	let token = cache.obtain().await?;
	let response = reqwest::Client::new()
		.get("https://api.example.com/orders")
		.header("Authorization", token.bearer())
		.send()
		.await?;

	println!("orders endpoint answered {}", response.status());
	println!("cache status: {:?}", cache.status());

	Ok(())
}
