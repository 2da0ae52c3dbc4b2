use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use super::Endpoint;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot reach supervisor at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: io::Error,
    },

    #[error("i/o error talking to supervisor: {0}")]
    Io(#[from] io::Error),

    #[error("supervisor returned HTTP status {0}")]
    Status(u16),

    #[error("malformed HTTP response: {0}")]
    Malformed(&'static str),
}

/// POST one XML-RPC body to the endpoint and return the response body.
/// One connection per call; supervisord closes after `Connection: close`.
pub fn roundtrip(
    endpoint: &Endpoint,
    body: &str,
    timeout: Duration,
) -> Result<String, TransportError> {
    let raw = match endpoint {
        Endpoint::Unix(path) => {
            let mut stream = UnixStream::connect(path).map_err(|source| {
                TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                }
            })?;
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
            exchange(&mut stream, "localhost", body)?
        }
        Endpoint::Inet { host, port } => {
            let addr = (host.as_str(), *port)
                .to_socket_addrs()
                .and_then(|mut addrs| {
                    addrs.next().ok_or_else(|| {
                        io::Error::new(io::ErrorKind::NotFound, "no address for host")
                    })
                })
                .map_err(|source| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            let mut stream =
                TcpStream::connect_timeout(&addr, timeout).map_err(|source| {
                    TransportError::Connect {
                        endpoint: endpoint.to_string(),
                        source,
                    }
                })?;
            stream.set_read_timeout(Some(timeout))?;
            stream.set_write_timeout(Some(timeout))?;
            exchange(&mut stream, host, body)?
        }
    };

    let body = parse_http_response(&raw)?;
    String::from_utf8(body).map_err(|_| TransportError::Malformed("body is not valid UTF-8"))
}

fn exchange<S: Read + Write>(stream: &mut S, host: &str, body: &str) -> io::Result<Vec<u8>> {
    let request = format!(
        "POST /RPC2 HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: supmon/{version}\r\n\
         Content-Type: text/xml;charset=utf-8\r\n\
         Content-Length: {length}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        version = env!("CARGO_PKG_VERSION"),
        length = body.len(),
    );

    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    trace!(bytes = response.len(), "read supervisor response");
    Ok(response)
}

/// Split status line, headers and body; honor Content-Length when given,
/// otherwise the connection close delimits the body.
pub(crate) fn parse_http_response(raw: &[u8]) -> Result<Vec<u8>, TransportError> {
    let header_end = find_header_end(raw).ok_or(TransportError::Malformed("no header end"))?;
    let head = std::str::from_utf8(&raw[..header_end])
        .map_err(|_| TransportError::Malformed("non-UTF-8 headers"))?;
    let body = &raw[header_end + 4..];

    let status_line = head.lines().next().unwrap_or("");
    let mut parts = status_line.split_whitespace();
    let proto = parts.next().unwrap_or("");
    if !proto.starts_with("HTTP/") {
        return Err(TransportError::Malformed("missing status line"));
    }
    let status: u16 = parts
        .next()
        .and_then(|code| code.parse().ok())
        .ok_or(TransportError::Malformed("unparseable status code"))?;
    if status != 200 {
        return Err(TransportError::Status(status));
    }

    let content_length = head.lines().skip(1).find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.eq_ignore_ascii_case("content-length") {
            value.trim().parse::<usize>().ok()
        } else {
            None
        }
    });

    match content_length {
        Some(length) if body.len() < length => Err(TransportError::Malformed("truncated body")),
        Some(length) => Ok(body[..length].to_vec()),
        None => Ok(body.to_vec()),
    }
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}
