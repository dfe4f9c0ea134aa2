// biseriation-core/src/error.rs

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Io(e) => write!(f, "IO error: {}", e),
            CoreError::Parse(e) => write!(f, "Parse error: {}", e),
            CoreError::Invalid(e) => write!(f, "Invalid: {}", e),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
