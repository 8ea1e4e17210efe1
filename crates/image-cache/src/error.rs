//! Error types for the image cache

use std::fmt;

#[derive(Debug)]
pub enum ImageCacheError {
    /// The origin was unreachable or answered with a failure status
    Network(Box<dyn std::error::Error + Send + Sync>),
    /// Disk I/O failed for a reason other than "not found"
    File(Box<std::io::Error>),
    /// Free space on the cache volume could not be determined
    SpaceQuery(Box<std::io::Error>),
    InvalidLocator(String),
    Config(String),
    Unknown(String),
}

impl fmt::Display for ImageCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCacheError::Network(err) => write!(f, "Network error: {}", err),
            ImageCacheError::File(err) => write!(f, "File error: {}", err),
            ImageCacheError::SpaceQuery(err) => {
                write!(f, "Unable to determine free space: {}", err)
            }
            ImageCacheError::InvalidLocator(msg) => write!(f, "Invalid locator: {}", msg),
            ImageCacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ImageCacheError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for ImageCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageCacheError::Network(err) => Some(err.as_ref()),
            ImageCacheError::File(err) => Some(err.as_ref()),
            ImageCacheError::SpaceQuery(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ImageCacheError {
    fn from(err: reqwest::Error) -> Self {
        ImageCacheError::Network(Box::new(err))
    }
}

impl From<std::io::Error> for ImageCacheError {
    fn from(err: std::io::Error) -> Self {
        ImageCacheError::File(Box::new(err))
    }
}

impl From<url::ParseError> for ImageCacheError {
    fn from(err: url::ParseError) -> Self {
        ImageCacheError::InvalidLocator(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ImageCacheError>;
