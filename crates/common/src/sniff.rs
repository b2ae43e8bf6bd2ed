//! Deterministic content-type detection.
//!
//! Only the leading bytes of the content are consulted. File names and
//! client supplied hints never factor in, so the same bytes always produce
//! the same type.

use mime::Mime;

/// How many leading bytes callers should read before calling [`detect`]
pub const SNIFF_LEN: usize = 3072;

const TEXT_HTML_UTF8: &str = "text/html; charset=utf-8";
const TEXT_XML_UTF8: &str = "text/xml; charset=utf-8";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

// tags that mark the start of an html document, matched case-insensitively
//  and only when followed by a space or '>'
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

// byte order marks, which signature matching does not cover
const TEXT_BOMS: &[(&[u8], &str)] = &[
    (b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
];

/// Detect the content type of `data`.
///  Markup is recognised first, then binary signatures. Unknown binary
///  content is `application/octet-stream`; anything free of control bytes
///  (including empty input) is UTF-8 plain text.
pub fn detect(data: &[u8]) -> Mime {
    parse(detect_str(data))
}

fn detect_str(data: &[u8]) -> &'static str {
    let trimmed = skip_whitespace(data);

    if HTML_TAGS.iter().any(|tag| html_tag_at(trimmed, tag)) {
        return TEXT_HTML_UTF8;
    }
    if trimmed.starts_with(b"<?xml") {
        return TEXT_XML_UTF8;
    }
    if starts_with_ignore_case(trimmed, b"<svg") {
        return "image/svg+xml";
    }

    if let Some((_, ctype)) = TEXT_BOMS.iter().find(|(bom, _)| data.starts_with(bom)) {
        return *ctype;
    }

    if let Some(kind) = infer::get(data) {
        return kind.mime_type();
    }

    if data.iter().all(|&b| !is_binary_byte(b)) {
        return TEXT_PLAIN_UTF8;
    }

    "application/octet-stream"
}

fn parse(ctype: &str) -> Mime {
    ctype
        .parse::<Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|&b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && data[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn html_tag_at(data: &[u8], tag: &[u8]) -> bool {
    starts_with_ignore_case(data, tag) && matches!(data.get(tag.len()), Some(b' ' | b'>'))
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
