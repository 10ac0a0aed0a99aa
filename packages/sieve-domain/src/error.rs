pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Regex(#[from] regex::Error),
	#[error("{message}")]
	InvalidVocabulary { message: String },
}
