use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("transport error: {0}")]
	Transport(#[from] relay_transport::TransportError),

	#[error("registry error: {0}")]
	Registry(#[from] relay_registry::RegistryError),

	#[error("configuration error: {0}")]
	Config(String),

	#[error("JSON parsing error: {0}")]
	JsonParse(#[from] serde_json::Error),
}
