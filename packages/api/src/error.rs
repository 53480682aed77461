#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid {field}: {message}")]
    InvalidUrl { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
