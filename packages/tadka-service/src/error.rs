pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("No profile exists for user {user_id:?}.")]
	ProfileNotFound { user_id: String },
	#[error("User {user_id:?} has not completed onboarding.")]
	OnboardingIncomplete { user_id: String },
	#[error("Only {found} eligible candidates were found; {required} are required.")]
	InsufficientCandidates { found: usize, required: usize },
	#[error("Candidate retrieval exceeded {timeout_ms} ms.")]
	RetrievalTimeout { timeout_ms: u64 },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Scoring error: {message}")]
	Scoring { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<tadka_storage::Error> for Error {
	fn from(err: tadka_storage::Error) -> Self {
		match err {
			tadka_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			tadka_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			tadka_storage::Error::MalformedRow(message) => Self::Storage { message },
			tadka_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
