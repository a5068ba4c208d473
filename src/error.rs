/// Errors raised when building a tree.
///
/// Lookups and removals of absent keys are not errors; they return `None`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid degree {degree}: must be at least {min}")]
    InvalidDegree { degree: usize, min: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
