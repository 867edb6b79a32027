use crate::Error;
use std::fmt;
use std::io::ErrorKind;

/// High-level reason a background network or hardware operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Refused,
    Unreachable,
    Disconnected,
    Rejected,
    Protocol,
    Hardware,
    Config,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Refused => "refused",
            FailureKind::Unreachable => "unreachable",
            FailureKind::Disconnected => "disconnected",
            FailureKind::Rejected => "rejected",
            FailureKind::Protocol => "protocol",
            FailureKind::Hardware => "hardware",
            FailureKind::Config => "config",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a crate-level error for logging.
pub fn classify_error(err: &Error) -> FailureKind {
    match err {
        Error::InvalidArgs(_) => FailureKind::Config,
        Error::Io(io_err) => classify_io_error(io_err),
        Error::Parse(_) => FailureKind::Protocol,
        Error::Hardware(_) => FailureKind::Hardware,
        Error::Timeout(_) => FailureKind::Timeout,
        Error::Rejected(_) => FailureKind::Rejected,
    }
}

pub fn classify_io_error(err: &std::io::Error) -> FailureKind {
    match err.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => FailureKind::Timeout,
        ErrorKind::ConnectionRefused => FailureKind::Refused,
        ErrorKind::NotFound | ErrorKind::AddrNotAvailable => FailureKind::Unreachable,
        ErrorKind::BrokenPipe
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::UnexpectedEof => FailureKind::Disconnected,
        ErrorKind::InvalidInput => FailureKind::Config,
        ErrorKind::InvalidData => FailureKind::Protocol,
        _ => match err.raw_os_error() {
            // 101 = ENETUNREACH, 113 = EHOSTUNREACH, 110 = ETIMEDOUT, 111 = ECONNREFUSED
            Some(101) | Some(113) => FailureKind::Unreachable,
            Some(110) => FailureKind::Timeout,
            Some(111) => FailureKind::Refused,
            _ => FailureKind::Unknown,
        },
    }
}
