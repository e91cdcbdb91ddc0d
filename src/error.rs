use std::fmt;
use std::str::Utf8Error;

/// Error type for the fallible text accessors.
///
/// Appending never fails; only reading the buffered bytes back as UTF-8 text
/// can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffered bytes are not valid UTF-8
    Utf8(Utf8Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Utf8(e) => write!(f, "Invalid UTF-8 in buffer: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Utf8(e) => Some(e),
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::Utf8(e)
    }
}

/// Result type alias for buffer text accessors
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_utf8_error_display_and_source() {
        let bad = [0x61, 0xff];
        let err: Error = std::str::from_utf8(&bad).unwrap_err().into();

        assert!(err.to_string().starts_with("Invalid UTF-8 in buffer"));
        assert!(err.source().is_some());

        let Error::Utf8(inner) = err;
        assert_eq!(inner.valid_up_to(), 1);
    }
}
