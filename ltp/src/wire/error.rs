use core::fmt;

/// The error type for parsing and emitting line representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// An incoming packet was shorter than its header or declared length requires.
    Truncated,
    /// An incoming packet could be parsed, but its contents are invalid.
    ///
    /// E.g. a header claiming a checksum that is never sent or a zero window.
    Malformed,
    /// An incoming packet was recognized as a known message type but not one this side handles.
    Unrecognized,
    /// A value exceeded the range of its field, such as a payload longer than 127 octets.
    Exceeded,
}

/// The result type for the wire module.
pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Truncated    => write!(f, "truncated packet"),
            Error::Malformed    => write!(f, "malformed packet"),
            Error::Unrecognized => write!(f, "unrecognized packet"),
            Error::Exceeded     => write!(f, "field value out of range"),
        }
    }
}
