//! Outbound network plumbing: the connectivity TCP connect, and the Weather
//! Underground HTTP and FTP adapters.

use std::{
    io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    path::Path,
    time::Duration,
};

use crate::{reading::Reading, Error, Result};

pub mod errors;
pub mod wunderground;

pub use errors::{classify_error, FailureKind};

/// Sends one weather record to the aggregation service.
pub trait RecordUploader: Send + Sync {
    fn upload(&self, reading: &Reading) -> Result<()>;
}

/// Publishes the latest webcam picture.
pub trait ImageUploader: Send + Sync {
    fn upload(&self, path: &Path) -> Result<()>;
}

/// Resolve `host:port` to at least one socket address.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| io_error(&format!("resolve {host}"), e))?
        .collect();
    if addrs.is_empty() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{host} did not resolve to any address"),
        )));
    }
    Ok(addrs)
}

/// Connect to the first address of `host:port` that answers within `timeout`.
pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in resolve(host, port)? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    let err = last_err.unwrap_or_else(|| io::Error::other("no address attempted"));
    Err(io_error(&format!("connect {host}:{port}"), err))
}

/// Wrap an I/O error, keeping timeouts distinct from other transport failures.
pub fn io_error(context: &str, err: io::Error) -> Error {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            Error::Timeout(format!("{context}: {err}"))
        }
        kind => Error::Io(io::Error::new(kind, format!("{context}: {err}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn connects_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let stream = connect("127.0.0.1", port, Duration::from_secs(1)).unwrap();
        assert_eq!(stream.read_timeout().unwrap(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn refused_connection_is_io_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = connect("127.0.0.1", port, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(classify_error(&err), FailureKind::Refused);
    }

    #[test]
    fn timeouts_map_to_timeout_variant() {
        let err = io_error("read", io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(err, Error::Timeout(_)));
        let err = io_error("read", io::Error::new(io::ErrorKind::WouldBlock, "slow"));
        assert!(matches!(err, Error::Timeout(_)));
    }
}
