//! End-to-end tests for the gateway routes, driven through the full app
mod common;

use std::io::{self, Cursor, SeekFrom};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use http::{header, Method, StatusCode};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use ::common::linked_data::{cid_for, LD_RAW_CODEC};
use ::common::prelude::{Dag, DagNode, DagStore, DirEntry, SeekableStream, StoreError};
use ::common::linked_data::Cid;

use common::{body_bytes, body_json, body_text, content_type, Gateway, PAGE_HTML, SITE_INDEX};

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle} not found in listing"))
}

#[tokio::test]
async fn test_listing_keeps_dag_order() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let base = format!("/ipfs/{}/listing", fixture.root);

    let response = gateway.get(&base).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(content_type(&response).starts_with("text/html"));

    let page = body_text(response).await;
    assert_eq!(page.matches("class=\"entry\"").count(), 3);
    let zeta = position(&page, &format!("href=\"{base}/zeta.txt\""));
    let alpha = position(&page, &format!("href=\"{base}/alpha\""));
    let spaced = position(&page, &format!("href=\"{base}/with%20space.txt\""));
    assert!(zeta < alpha && alpha < spaced);
    assert!(page.contains(&fixture.listing.to_string()));
}

#[tokio::test]
async fn test_listing_links_follow_the_request_prefix() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    for prefix in ["/gw", "/gw/ipfs"] {
        let base = format!("{prefix}/{}/listing", fixture.root);
        let response = gateway.get(&base).await;
        assert_eq!(response.status(), StatusCode::OK, "{prefix}");
        let page = body_text(response).await;
        assert!(page.contains(&format!("href=\"{base}/zeta.txt\"")), "{prefix}");
    }
}

#[tokio::test]
async fn test_trailing_slash_is_trimmed() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway
        .get(&format!("/ipfs/{}/listing/", fixture.root))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(&format!("href=\"/ipfs/{}/listing/zeta.txt\"", fixture.root)));
}

#[tokio::test]
async fn test_index_html_is_served_for_directories() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}/site", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html");
    assert_eq!(
        response.headers()[header::ETAG],
        format!("\"{}\"", fixture.site_index).as_str()
    );
    assert_eq!(body_bytes(response).await, SITE_INDEX);
}

#[tokio::test]
async fn test_index_html_directory_is_listed() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let base = format!("/ipfs/{}/fake_index", fixture.root);

    let response = gateway.get(&base).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(&format!("href=\"{base}/index.html\"")));
    assert!(page.contains(&format!("href=\"{base}/notes.txt\"")));
}

#[tokio::test]
async fn test_html_detection_drops_charset() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway
        .get(&format!("/ipfs/{}/page.html", fixture.root))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"page.html\""
    );
    assert_eq!(body_bytes(response).await, PAGE_HTML);
}

#[tokio::test]
async fn test_bare_identifier_serves_the_node() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}", fixture.page)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, PAGE_HTML);
}

#[tokio::test]
async fn test_chunked_file_streams_in_full() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}/big.bin", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/octet-stream");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "200");
    assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
    assert_eq!(body_bytes(response).await, fixture.big_bytes);
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let uri = format!("/ipfs/{}/big.bin", fixture.root);

    let first = gateway.get(&uri).await;
    let first_type = content_type(&first).to_string();
    let first_body = body_bytes(first).await;

    let second = gateway.get(&uri).await;
    assert_eq!(content_type(&second), first_type);
    assert_eq!(body_bytes(second).await, first_body);
}

#[tokio::test]
async fn test_range_requests() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let uri = format!("/ipfs/{}/big.bin", fixture.root);

    let response = gateway
        .send(Method::GET, &uri, &[("range", "bytes=10-39")])
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 10-39/200");
    assert_eq!(body_bytes(response).await, &fixture.big_bytes[10..40]);

    let response = gateway
        .send(Method::GET, &uri, &[("range", "bytes=-20")])
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(response).await, &fixture.big_bytes[180..]);

    let response = gateway
        .send(Method::GET, &uri, &[("range", "bytes=500-")])
        .await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */200");

    // several ranges fall back to the whole body
    let response = gateway
        .send(Method::GET, &uri, &[("range", "bytes=0-1,5-6")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, fixture.big_bytes);
}

#[tokio::test]
async fn test_if_none_match_returns_not_modified() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let uri = format!("/ipfs/{}/big.bin", fixture.root);
    let etag = format!("\"{}\"", fixture.big);

    let response = gateway
        .send(Method::GET, &uri, &[("if-none-match", etag.as_str())])
        .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(response).await.is_empty());

    let response = gateway
        .send(Method::GET, &uri, &[("if-none-match", "\"something-else\"")])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_head_has_headers_but_no_body() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway
        .send(Method::HEAD, &format!("/ipfs/{}/big.bin", fixture.root), &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "200");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_symlinks_are_rejected() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    for path in ["link", "link/zeta.txt"] {
        let response = gateway
            .get(&format!("/ipfs/{}/{path}", fixture.root))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["reason"], "unsupported_node_kind", "{path}");
    }
}

#[tokio::test]
async fn test_missing_paths() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    for path in ["nope", "listing/nope", "big.bin/inside"] {
        let response = gateway
            .get(&format!("/ipfs/{}/{path}", fixture.root))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], 404);
        assert_eq!(body["error"]["reason"], "path_not_found", "{path}");
    }
}

#[tokio::test]
async fn test_unknown_root_is_not_found() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);
    let absent = cid_for(LD_RAW_CODEC, b"never stored").unwrap();

    let response = gateway.get(&format!("/ipfs/{absent}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["reason"], "not_found");
}

#[tokio::test]
async fn test_invalid_identifiers() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    for uri in ["/ipfs/not-a-cid", "/ipfs/not-a-cid/file", "/ipfs", "/gw", "/gw/ipfs"] {
        let response = gateway.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["reason"], "invalid_identifier", "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_codec_is_a_server_error() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}/weird", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["reason"], "unknown_node_kind");
}

#[tokio::test]
async fn test_corrupt_file_node_is_bad_gateway() {
    let fixture = common::setup_fixture();
    fixture.builder.corrupt(&fixture.big, b"tampered");
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}/big.bin", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["reason"], "fetch_failed");
}

#[tokio::test]
async fn test_corrupt_leading_chunk_fails_the_sniff() {
    let fixture = common::setup_fixture();
    let first_chunk = cid_for(LD_RAW_CODEC, &fixture.big_bytes[..common::CHUNK_SIZE]).unwrap();
    fixture.builder.corrupt(&first_chunk, b"tampered");
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get(&format!("/ipfs/{}/big.bin", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"]["reason"], "content_read_failed");
}

#[tokio::test]
async fn test_unmatched_routes_use_the_error_envelope() {
    let fixture = common::setup_fixture();
    let gateway = Gateway::for_fixture(&fixture);

    let response = gateway.get("/nowhere/at/all").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 404);
    assert_eq!(body["error"]["reason"], "route_not_found");
}

/// Delays every lookup well past any reasonable deadline
struct SlowDag {
    inner: Dag,
    delay: Duration,
}

#[async_trait]
impl DagStore for SlowDag {
    async fn get_node(&self, cid: &Cid) -> Result<DagNode, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_node(cid).await
    }

    async fn get_child(&self, dir: &DagNode, name: &str) -> Result<DagNode, StoreError> {
        self.inner.get_child(dir, name).await
    }

    async fn list_children(&self, dir: &DagNode) -> Result<Vec<DirEntry>, StoreError> {
        self.inner.list_children(dir).await
    }

    async fn open_stream(&self, file: &DagNode) -> Result<Box<dyn SeekableStream>, StoreError> {
        self.inner.open_stream(file).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_hits_the_fetch_deadline() {
    let fixture = common::setup_fixture();
    let slow = SlowDag {
        inner: fixture.builder.dag(),
        delay: Duration::from_secs(600),
    };
    let gateway = Gateway::with_timeout(Arc::new(slow), Duration::from_secs(1));

    let response = gateway.get(&format!("/ipfs/{}/page.html", fixture.root)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["reason"], "fetch_failed");
}

/// Every read fails with an error that did not come from the block store
struct UnreadableStream;

impl AsyncRead for UnreadableStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::other("device unplugged")))
    }
}

impl AsyncSeek for UnreadableStream {
    fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(0))
    }
}

/// Reads normally but refuses to move the cursor
struct ForwardOnlyStream(Cursor<Vec<u8>>);

impl AsyncRead for ForwardOnlyStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_read(cx, buf)
    }
}

impl AsyncSeek for ForwardOnlyStream {
    fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "stream is forward only"))
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(0))
    }
}

enum StreamFault {
    Read,
    Seek,
}

/// Resolves normally, but hands out broken file streams
struct FaultyStreams {
    inner: Dag,
    fault: StreamFault,
}

#[async_trait]
impl DagStore for FaultyStreams {
    async fn get_node(&self, cid: &Cid) -> Result<DagNode, StoreError> {
        self.inner.get_node(cid).await
    }

    async fn get_child(&self, dir: &DagNode, name: &str) -> Result<DagNode, StoreError> {
        self.inner.get_child(dir, name).await
    }

    async fn list_children(&self, dir: &DagNode) -> Result<Vec<DirEntry>, StoreError> {
        self.inner.list_children(dir).await
    }

    async fn open_stream(&self, _file: &DagNode) -> Result<Box<dyn SeekableStream>, StoreError> {
        Ok(match self.fault {
            StreamFault::Read => Box::new(UnreadableStream),
            StreamFault::Seek => Box::new(ForwardOnlyStream(Cursor::new(PAGE_HTML.to_vec()))),
        })
    }
}

async fn get_page_with(fault: StreamFault) -> (StatusCode, String, Vec<u8>) {
    let fixture = common::setup_fixture();
    let store = FaultyStreams {
        inner: fixture.builder.dag(),
        fault,
    };
    let gateway = Gateway::new(Arc::new(store));

    let response = gateway.get(&format!("/ipfs/{}/page.html", fixture.root)).await;
    let status = response.status();
    let ctype = content_type(&response).to_string();
    (status, ctype, body_bytes(response).await)
}

#[tokio::test]
async fn test_unreadable_stream_is_content_read_failure() {
    let (status, ctype, body) = get_page_with(StreamFault::Read).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ctype, "application/json");

    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["error"]["reason"], "content_read_failed");
}

#[tokio::test]
async fn test_failed_rewind_is_stream_not_seekable() {
    let (status, ctype, body) = get_page_with(StreamFault::Seek).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ctype, "application/json");

    // the sniffed prefix never reaches the client
    assert!(!body.windows(9).any(|w| w == b"<!DOCTYPE"));
    let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(envelope["error"]["reason"], "stream_not_seekable");
}
