use std::fmt::{self, Display};

/// Errors raised synchronously by buffer and promise operations.
///
/// Asynchronous failures carried through streams and the pump use
/// [`easy_error::Error`] instead; this enum covers the immediate,
/// caller-visible failure cases.
#[derive(Debug, PartialEq, Eq)]
pub enum CoreError {
    /// A read or copy range falls outside the written part of a buffer.
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
    /// A range argument is malformed (`start > end`).
    InvalidArgument(String),
    /// A text encoding name was not recognized.
    UnsupportedEncoding(String),
    /// A promise accessor was called in the wrong terminal state.
    InvalidState(&'static str),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { start, end, len } => {
                write!(
                    f,
                    "range {}..{} out of bounds for buffer of length {}",
                    start, end, len
                )
            }
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Self::UnsupportedEncoding(name) => write!(f, "unsupported encoding: {}", name),
            Self::InvalidState(msg) => write!(f, "invalid state: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let e = CoreError::OutOfBounds {
            start: 4,
            end: 8,
            len: 6,
        };
        assert_eq!(e.to_string(), "range 4..8 out of bounds for buffer of length 6");

        let e = CoreError::UnsupportedEncoding("KOI8-R".to_string());
        assert_eq!(e.to_string(), "unsupported encoding: KOI8-R");
    }
}
