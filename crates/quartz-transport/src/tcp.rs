use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::RouterStream;

/// Connect to a router control port (blocking, no timeout).
pub fn connect(host: &str, port: u16) -> Result<RouterStream> {
    connect_with_timeout(host, port, None)
}

/// Connect to a router control port with an optional dial timeout.
///
/// Every resolved address is tried in order; the error of the last attempt
/// is returned if none succeeds.
pub fn connect_with_timeout(
    host: &str,
    port: u16,
    timeout: Option<Duration>,
) -> Result<RouterStream> {
    let addr = format!("{host}:{port}");
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Resolve {
            addr: addr.clone(),
            source: e,
        })?
        .collect();

    if candidates.is_empty() {
        return Err(TransportError::Resolve {
            addr,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no socket addresses resolved",
            ),
        });
    }

    let mut last_err = None;
    for candidate in candidates {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                debug!(%candidate, "connected to router");
                let stream = RouterStream::from_tcp(stream);
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "no connect attempt made")
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn test_connect_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let mut client = connect("127.0.0.1", port).unwrap();
            client.write_all(b".#01\r").unwrap();
        });

        let (mut server, _) = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b".#01\r");

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = connect_with_timeout("127.0.0.1", port, Some(Duration::from_millis(500)));
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_shutdown_wakes_blocked_reader() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = connect("127.0.0.1", port).unwrap();
        let (_server, _) = listener.accept().unwrap();

        let mut reader = client.try_clone().unwrap();
        let blocked = std::thread::spawn(move || {
            let mut buf = [0u8; 16];
            reader.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(50));
        client.shutdown().unwrap();

        let read = blocked.join().unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[test]
    fn test_try_clone_shares_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = connect("127.0.0.1", port).unwrap();
        let (mut server, _) = listener.accept().unwrap();

        let mut writer = client.try_clone().unwrap();
        writer.write_all(b".BI1\r").unwrap();

        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b".BI1\r");
        assert_eq!(
            client.local_addr().unwrap(),
            writer.local_addr().unwrap()
        );
    }
}
