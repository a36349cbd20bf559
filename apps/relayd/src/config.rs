use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Complete configuration for the relay daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
	/// Primary upstream WebSocket URL
	pub server_url: String,
	/// Independent error-reporting WebSocket URL
	pub error_url: String,
	/// Monitored endpoints as `(id, url)` pairs; `http(s)` URLs are consumed
	/// over SSE, `ws(s)` URLs over WebSocket
	pub endpoints: Vec<(String, String)>,
}

impl Config {
	/// Load configuration from environment variables with sensible defaults
	pub fn from_env() -> Result<Self> {
		let endpoints = match std::env::var("MOMENTUM_ENDPOINTS") {
			Ok(raw) => parse_endpoints(&raw)?,
			Err(_) => Vec::new(),
		};

		Ok(Self {
			server_url: std::env::var("MOMENTUM_SERVER_URL").unwrap_or_else(|_| "ws://localhost:4000/ws".to_string()),
			error_url: std::env::var("MOMENTUM_ERROR_URL").unwrap_or_else(|_| "ws://localhost:4000/errors".to_string()),
			endpoints,
		})
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			server_url: "ws://localhost:4000/ws".to_string(),
			error_url: "ws://localhost:4000/errors".to_string(),
			endpoints: Vec::new(),
		}
	}
}

/// Comma-separated `id=url` pairs
fn parse_endpoints(raw: &str) -> Result<Vec<(String, String)>> {
	raw
		.split(',')
		.filter(|entry| !entry.trim().is_empty())
		.map(|entry| {
			entry
				.split_once('=')
				.map(|(id, url)| (id.trim().to_string(), url.trim().to_string()))
				.filter(|(id, url)| !id.is_empty() && !url.is_empty())
				.ok_or_else(|| Error::Config(format!("invalid endpoint entry: {entry:?}, expected id=url")))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_endpoint_pairs() {
		let endpoints = parse_endpoints("github=http://localhost:4000/github/events, logs=ws://localhost:4000/logs").unwrap();
		assert_eq!(endpoints.len(), 2);
		assert_eq!(endpoints[0], ("github".to_string(), "http://localhost:4000/github/events".to_string()));
		assert_eq!(endpoints[1].0, "logs");
	}

	#[test]
	fn test_parse_rejects_entries_without_url() {
		assert!(parse_endpoints("github").is_err());
		assert!(parse_endpoints("=http://localhost").is_err());
	}

	#[test]
	fn test_empty_endpoint_list_is_allowed() {
		assert!(parse_endpoints("").unwrap().is_empty());
		assert!(parse_endpoints(" , ").unwrap().is_empty());
	}
}
