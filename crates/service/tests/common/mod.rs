//! Shared test utilities for gateway integration tests
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{Method, Request, Response};
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use ::common::linked_data::Cid;
use ::common::prelude::DagStore;
use ::common::testkit::DagBuilder;
use service::http::{app, Config as HttpConfig};
use service::ServiceState;

pub const CHUNK_SIZE: usize = 16;

pub const PAGE_HTML: &[u8] = b"<!DOCTYPE html>\n<html><head><title>t</title></head><body>hi</body></html>\n";
pub const SITE_INDEX: &[u8] = b"<!doctype html><html><body>site home</body></html>";

pub struct Fixture {
    pub builder: DagBuilder,
    pub root: Cid,
    pub listing: Cid,
    pub big: Cid,
    pub big_bytes: Vec<u8>,
    pub page: Cid,
    pub site_index: Cid,
}

/// Build the tree every gateway test runs against:
///
/// ```text
/// root/
///   listing/          zeta.txt, alpha/, with space.txt   (in that order)
///   site/             index.html, style.css
///   fake_index/       index.html/ (a directory), notes.txt
///   link -> listing   symlink
///   big.bin           chunked binary file
///   page.html         raw leaf starting with a doctype
///   weird             block under an unknown codec
/// ```
pub fn setup_fixture() -> Fixture {
    let builder = DagBuilder::new().with_chunk_size(CHUNK_SIZE);

    let zeta = builder.raw(b"last letter\n").unwrap();
    let alpha = builder.dir(Vec::<(&str, Cid)>::new()).unwrap();
    let spaced = builder.raw(b"spaces in names\n").unwrap();
    let listing = builder
        .dir([("zeta.txt", zeta), ("alpha", alpha), ("with space.txt", spaced)])
        .unwrap();

    let site_index = builder.file(SITE_INDEX).unwrap();
    let style = builder.raw(b"body { color: red; }\n").unwrap();
    let site = builder
        .dir([("index.html", site_index), ("style.css", style)])
        .unwrap();

    let index_dir = builder.dir([("inner.txt", zeta)]).unwrap();
    let notes = builder.raw(b"notes\n").unwrap();
    let fake_index = builder
        .dir([("index.html", index_dir), ("notes.txt", notes)])
        .unwrap();

    let link = builder.symlink("listing").unwrap();

    let big_bytes: Vec<u8> = (0..200u32).map(|i| (i * 7 % 251) as u8).collect();
    let big = builder.file(&big_bytes).unwrap();

    let page = builder.raw(PAGE_HTML).unwrap();
    let weird = builder.foreign(0x70, b"\x12\x00not unixfs").unwrap();

    let root = builder
        .dir([
            ("listing", listing),
            ("site", site),
            ("fake_index", fake_index),
            ("link", link),
            ("big.bin", big),
            ("page.html", page),
            ("weird", weird),
        ])
        .unwrap();

    Fixture {
        builder,
        root,
        listing,
        big,
        big_bytes,
        page,
        site_index,
    }
}

pub struct Gateway {
    app: NormalizePath<Router>,
}

impl Gateway {
    pub fn new(dag: Arc<dyn DagStore>) -> Self {
        Self::with_timeout(dag, Duration::from_secs(30))
    }

    pub fn with_timeout(dag: Arc<dyn DagStore>, fetch_timeout: Duration) -> Self {
        let state = ServiceState::new(dag, fetch_timeout);
        let config = HttpConfig::new(([127, 0, 0, 1], 0).into(), tracing::Level::DEBUG);
        Self {
            app: app(&config, state),
        }
    }

    pub fn for_fixture(fixture: &Fixture) -> Self {
        Self::new(Arc::new(fixture.builder.dag()))
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Method::GET, uri, &[]).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> Response<Body> {
        let mut request = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let request = request.body(Body::empty()).unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn content_type(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
