pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid configuration: {message}")]
	Config { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<sieve_config::Error> for Error {
	fn from(err: sieve_config::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}

impl From<sieve_domain::Error> for Error {
	fn from(err: sieve_domain::Error) -> Self {
		Self::Config { message: err.to_string() }
	}
}
