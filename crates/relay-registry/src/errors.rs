use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
	#[error("endpoint not found: {0}")]
	NotFound(String),

	#[error("endpoint already registered: {0}")]
	AlreadyRegistered(String),
}
