// src/core/protocol/http.rs

//! A minimal HTTP/1.x codec: decodes a request head and encodes a plain-text
//! response. Each connection carries a single exchange, so request bodies are
//! never read and every response closes the connection.

use crate::core::InflightError;
use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CRLF: &str = "\r\n";
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_SIZE: usize = 8 * 1024;

/// The parsed request line and headers of an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    /// Minor version: `0` for HTTP/1.0, `1` for HTTP/1.1.
    pub version: u8,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A complete response with a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: "OK",
            body: body.into(),
        }
    }

    pub fn bad_request() -> Self {
        Self {
            status: 400,
            reason: "Bad Request",
            body: "400 Bad Request\n".to_string(),
        }
    }

    pub fn header_fields_too_large() -> Self {
        Self {
            status: 431,
            reason: "Request Header Fields Too Large",
            body: "431 Request Header Fields Too Large\n".to_string(),
        }
    }
}

/// A `tokio_util::codec` implementation for request heads and responses.
#[derive(Debug, Default)]
pub struct HttpCodec;

impl Decoder for HttpCodec {
    type Item = RequestHead;
    type Error = InflightError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(pos) = src
            .windows(HEAD_TERMINATOR.len())
            .position(|w| w == HEAD_TERMINATOR)
        else {
            if src.len() > MAX_HEAD_SIZE {
                return Err(InflightError::RequestTooLarge(MAX_HEAD_SIZE));
            }
            return Ok(None);
        };

        let head_len = pos + HEAD_TERMINATOR.len();
        if head_len > MAX_HEAD_SIZE {
            return Err(InflightError::RequestTooLarge(MAX_HEAD_SIZE));
        }

        let head = parse_head(std::str::from_utf8(&src[..pos])?)?;
        src.advance(head_len);
        Ok(Some(head))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(head) => Ok(Some(head)),
            None if buf.is_empty() => Ok(None),
            None => Err(InflightError::IncompleteData),
        }
    }
}

impl Encoder<Response> for HttpCodec {
    type Error = InflightError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let head = format!(
            "HTTP/1.1 {} {}{CRLF}Content-Type: text/plain; charset=utf-8{CRLF}Content-Length: {}{CRLF}Connection: close{CRLF}{CRLF}",
            item.status,
            item.reason,
            item.body.len()
        );
        dst.reserve(head.len() + item.body.len());
        dst.extend_from_slice(head.as_bytes());
        dst.extend_from_slice(item.body.as_bytes());
        Ok(())
    }
}

fn parse_head(text: &str) -> Result<RequestHead, InflightError> {
    let mut lines = text.split(CRLF);
    let request_line = lines.next().unwrap_or_default();

    let mut parts = request_line.split(' ');
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(InflightError::MalformedRequest(format!(
            "invalid request line '{request_line}'"
        )));
    };

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(InflightError::MalformedRequest(format!(
            "invalid method '{method}'"
        )));
    }
    if !target.starts_with('/') && target != "*" {
        return Err(InflightError::MalformedRequest(format!(
            "invalid request target '{target}'"
        )));
    }
    let version = match version {
        "HTTP/1.1" => 1,
        "HTTP/1.0" => 0,
        other => {
            return Err(InflightError::MalformedRequest(format!(
                "unsupported protocol version '{other}'"
            )));
        }
    };

    let mut headers = Vec::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            return Err(InflightError::MalformedRequest(format!(
                "header line without ':' ('{line}')"
            )));
        };
        if name.is_empty() || name.ends_with(' ') {
            return Err(InflightError::MalformedRequest(format!(
                "invalid header name '{name}'"
            )));
        }
        headers.push((name.to_string(), value.trim().to_string()));
    }

    let path = target.split('?').next().unwrap_or(target).to_string();
    Ok(RequestHead {
        method: method.to_string(),
        path,
        version,
        headers,
    })
}
