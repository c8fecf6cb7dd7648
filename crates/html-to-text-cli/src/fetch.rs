//! Minimal HTTP fetching for the `--url` input mode.
//!
//! A deliberately small HTTP/1.0 client over [`TcpStream`]: one GET per
//! connection, `Connection: close`, body read to EOF and truncated to
//! `Content-Length` when the server sends one. Redirects are followed up
//! to a fixed limit. Only `http://` URLs are supported.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;

const MAX_REDIRECTS: usize = 5;
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// A fetched document body plus the `Content-Type` header, if any.
#[derive(Debug)]
pub struct FetchedDocument {
    /// Raw response body bytes.
    pub body: Vec<u8>,
    /// Value of the `Content-Type` response header.
    pub content_type: Option<String>,
}

/// Errors raised while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL scheme is not plain HTTP.
    #[error("unsupported URL {0} (only http:// URLs are supported)")]
    UnsupportedScheme(String),
    /// The URL has no host, or a redirect target could not be resolved.
    #[error("invalid URL {0}")]
    InvalidUrl(String),
    /// Establishing the TCP connection failed.
    #[error("connection to {host} failed: {source}")]
    Connect {
        /// Host the connection was made to.
        host: String,
        /// Underlying socket error.
        source: std::io::Error,
    },
    /// The connection dropped mid-request or mid-response.
    #[error("error talking to {host}: {source}")]
    Io {
        /// Host the connection was made to.
        host: String,
        /// Underlying socket error.
        source: std::io::Error,
    },
    /// A non-success, non-redirect status code.
    #[error("server returned status {0}")]
    Status(u16),
    /// The response could not be parsed as HTTP.
    #[error("malformed HTTP response")]
    MalformedResponse,
    /// The redirect chain exceeded the limit.
    #[error("too many redirects")]
    TooManyRedirects,
}

struct Response {
    status: u16,
    content_type: Option<String>,
    location: Option<String>,
    body: Vec<u8>,
}

/// Fetch `url`, following redirects.
pub fn fetch(url: &str, user_agent: &str) -> Result<FetchedDocument, FetchError> {
    let mut target = url.to_string();
    for _ in 0..=MAX_REDIRECTS {
        let (authority, path) = split_url(&target)?;
        let response = request(&authority, &path, user_agent)?;
        match response.status {
            200..=299 => {
                return Ok(FetchedDocument {
                    body: response.body,
                    content_type: response.content_type,
                });
            }
            301 | 302 | 303 | 307 | 308 => {
                let location = response.location.ok_or(FetchError::MalformedResponse)?;
                log::debug!("following redirect from {target} to {location}");
                target = absolutize(&target, &location)?;
            }
            status => return Err(FetchError::Status(status)),
        }
    }
    Err(FetchError::TooManyRedirects)
}

fn split_url(url: &str) -> Result<(String, String), FetchError> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| FetchError::UnsupportedScheme(url.to_string()))?;
    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if authority.is_empty() {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok((authority.to_string(), path.to_string()))
}

fn request(authority: &str, path: &str, user_agent: &str) -> Result<Response, FetchError> {
    let address = if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{authority}:80")
    };
    let mut stream = TcpStream::connect(&address).map_err(|source| FetchError::Connect {
        host: authority.to_string(),
        source,
    })?;
    let io_error = |source| FetchError::Io {
        host: authority.to_string(),
        source,
    };
    stream.set_read_timeout(Some(IO_TIMEOUT)).map_err(io_error)?;
    stream.set_write_timeout(Some(IO_TIMEOUT)).map_err(io_error)?;

    let request = format!(
        "GET {path} HTTP/1.0\r\nHost: {authority}\r\nUser-Agent: {user_agent}\r\nAccept: text/html\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).map_err(io_error)?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).map_err(io_error)?;
    parse_response(&raw)
}

fn parse_response(raw: &[u8]) -> Result<Response, FetchError> {
    let header_end = raw
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .ok_or(FetchError::MalformedResponse)?;
    let head =
        std::str::from_utf8(&raw[..header_end]).map_err(|_| FetchError::MalformedResponse)?;
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|status_line| status_line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or(FetchError::MalformedResponse)?;

    let mut content_type = None;
    let mut location = None;
    let mut content_length = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("location") {
            location = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().ok();
        }
    }

    let mut body = raw[header_end + 4..].to_vec();
    if let Some(length) = content_length {
        body.truncate(length);
    }
    Ok(Response {
        status,
        content_type,
        location,
        body,
    })
}

/// Resolve a redirect `Location` against the URL that produced it.
fn absolutize(base: &str, location: &str) -> Result<String, FetchError> {
    if location.starts_with("http://") {
        return Ok(location.to_string());
    }
    if let Some(path) = location.strip_prefix('/') {
        let (authority, _) = split_url(base)?;
        return Ok(format!("http://{authority}/{path}"));
    }
    Err(FetchError::InvalidUrl(location.to_string()))
}
