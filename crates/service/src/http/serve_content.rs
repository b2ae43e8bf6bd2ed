//! Serve a seekable byte stream over HTTP.
//!
//! Handles the parts of a response that only depend on the bytes and their
//! identity: content length, strong `ETag` validation through
//! `If-None-Match`, single byte ranges (optionally guarded by `If-Range`)
//! and immutable caching headers. Bodies are streamed in bounded chunks.
//!
//! Multiple ranges in one request are answered with the full content.

use std::io::{self, SeekFrom};

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use common::prelude::SeekableStream;

/// Content is addressed by its hash, so it can be cached for as long as
///  clients are willing to keep it
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=29030400, immutable";

/// Upper bound on a single body frame
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

// RFC 5987 attr-char, everything else is percent-encoded in filename*
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, thiserror::Error)]
pub enum ServeContentError {
    #[error("failed to seek content stream: {0}")]
    Seek(#[source] io::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// What the response says about the content besides its bytes
#[derive(Debug, Clone)]
pub struct ContentInfo<'a> {
    /// name offered to the client in `Content-Disposition`
    pub name: &'a str,
    pub content_type: &'a str,
    /// strong validator, without quotes
    pub etag: &'a str,
}

/// A satisfiable byte range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// the header could not be parsed
    Invalid,
    /// the range lies entirely outside the content
    Unsatisfiable,
}

/// Parse a `Range` header against content of `size` bytes.
///  `Ok(None)` means the full content should be sent.
pub fn parse_range(value: &str, size: u64) -> Result<Option<ByteRange>, RangeError> {
    let specs = value
        .trim()
        .strip_prefix("bytes=")
        .ok_or(RangeError::Invalid)?;

    let mut specs = specs.split(',').map(str::trim).filter(|s| !s.is_empty());
    let spec = specs.next().ok_or(RangeError::Invalid)?;
    if specs.next().is_some() {
        return Ok(None);
    }

    let (start, end) = spec.split_once('-').ok_or(RangeError::Invalid)?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // suffix range: the last n bytes
        let suffix: u64 = end.parse().map_err(|_| RangeError::Invalid)?;
        if suffix == 0 || size == 0 {
            return Err(RangeError::Unsatisfiable);
        }
        return Ok(Some(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        }));
    }

    let start: u64 = start.parse().map_err(|_| RangeError::Invalid)?;
    let end = if end.is_empty() {
        None
    } else {
        let end: u64 = end.parse().map_err(|_| RangeError::Invalid)?;
        if end < start {
            return Err(RangeError::Invalid);
        }
        Some(end)
    };

    if start >= size {
        return Err(RangeError::Unsatisfiable);
    }
    let last = size - 1;
    Ok(Some(ByteRange {
        start,
        end: end.map_or(last, |end| end.min(last)),
    }))
}

/// Respond with `stream`, honouring conditional and range headers
pub async fn serve_content(
    method: &Method,
    headers: &HeaderMap,
    info: ContentInfo<'_>,
    mut stream: Box<dyn SeekableStream>,
) -> Result<Response, ServeContentError> {
    let size = stream
        .seek(SeekFrom::End(0))
        .await
        .map_err(ServeContentError::Seek)?;
    stream
        .seek(SeekFrom::Start(0))
        .await
        .map_err(ServeContentError::Seek)?;

    let etag = format!("\"{}\"", info.etag);
    let mut builder = Response::builder()
        .header(header::ETAG, HeaderValue::from_str(&etag)?)
        .header(
            header::CACHE_CONTROL,
            HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
        );

    if if_none_match(headers, &etag) {
        let response = builder
            .status(StatusCode::NOT_MODIFIED)
            .body(Body::empty())?;
        return Ok(response);
    }

    builder = builder
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"))
        .header(header::CONTENT_TYPE, HeaderValue::from_str(info.content_type)?);
    if !info.name.is_empty() {
        builder = builder.header(header::CONTENT_DISPOSITION, content_disposition(info.name)?);
    }

    let range = match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(value) if if_range(headers, &etag) => parse_range(value, size),
        _ => Ok(None),
    };

    let (status, start, length) = match range {
        Ok(Some(range)) => {
            builder = builder.header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, size),
            );
            (StatusCode::PARTIAL_CONTENT, range.start, range.length())
        }
        Ok(None) => (StatusCode::OK, 0, size),
        Err(e) => {
            tracing::debug!(?e, size, "rejecting range request");
            let response = builder
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", size))
                .body(Body::empty())?;
            return Ok(response);
        }
    };

    builder = builder
        .status(status)
        .header(header::CONTENT_LENGTH, length);

    if *method == Method::HEAD || length == 0 {
        return Ok(builder.body(Body::empty())?);
    }

    if start > 0 {
        stream
            .seek(SeekFrom::Start(start))
            .await
            .map_err(ServeContentError::Seek)?;
    }

    Ok(builder.body(body_from(stream, length))?)
}

fn body_from(stream: Box<dyn SeekableStream>, length: u64) -> Body {
    Body::from_stream(futures::stream::try_unfold(
        (stream, length),
        |(stream, remaining)| next_chunk(stream, remaining),
    ))
}

type ChunkState = (Box<dyn SeekableStream>, u64);

async fn next_chunk(
    mut stream: Box<dyn SeekableStream>,
    remaining: u64,
) -> io::Result<Option<(Bytes, ChunkState)>> {
    if remaining == 0 {
        return Ok(None);
    }

    let mut buf = vec![0u8; remaining.min(STREAM_CHUNK_SIZE as u64) as usize];
    let n = match stream.read(&mut buf).await {
        Ok(0) => {
            let e = io::Error::new(io::ErrorKind::UnexpectedEof, "content ended early");
            tracing::error!(remaining, "content stream failed: {}", e);
            return Err(e);
        }
        Ok(n) => n,
        Err(e) => {
            tracing::error!(remaining, "content stream failed: {}", e);
            return Err(e);
        }
    };
    buf.truncate(n);

    Ok(Some((Bytes::from(buf), (stream, remaining - n as u64))))
}

// weak comparison, as If-None-Match requires
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}

// a range is only honoured when If-Range is absent or names this exact entity
fn if_range(headers: &HeaderMap, etag: &str) -> bool {
    match headers.get(header::IF_RANGE) {
        None => true,
        Some(value) => value.to_str().map(|v| v.trim() == etag).unwrap_or(false),
    }
}

fn content_disposition(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let value = if name.bytes().all(|b| b.is_ascii_graphic() || b == b' ') {
        let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("inline; filename=\"{}\"", escaped)
    } else {
        format!("inline; filename*=UTF-8''{}", utf8_percent_encode(name, ATTR_CHAR))
    };
    HeaderValue::from_str(&value)
}
