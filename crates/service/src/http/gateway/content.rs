use std::io::{self, SeekFrom};

use axum::response::Response;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use common::prelude::DagNode;
use common::sniff::{self, SNIFF_LEN};

use super::{GatewayError, GatewayRequest, RequestContext};
use crate::http::serve_content::{serve_content, ContentInfo};

/// Stream a file-like node: sniff its type from the leading bytes, rewind,
///  then hand the stream to [`serve_content`]
pub async fn serve(
    ctx: &RequestContext,
    file: &DagNode,
    name: &str,
    request: GatewayRequest<'_>,
) -> Result<Response, GatewayError> {
    let mut stream = ctx
        .bounded(ctx.dag().open_stream(file))
        .await?
        .map_err(|e| GatewayError::FetchFailed(e.to_string()))?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    ctx.bounded((&mut stream).take(SNIFF_LEN as u64).read_to_end(&mut head))
        .await?
        .map_err(read_error)?;
    let content_type = content_type_for(&head);

    stream
        .seek(SeekFrom::Start(0))
        .await
        .map_err(|e| GatewayError::StreamNotSeekable(e.to_string()))?;

    let etag = file.cid().to_string();
    let info = ContentInfo {
        name,
        content_type: &content_type,
        etag: &etag,
    };
    Ok(serve_content(request.method, request.headers, info, stream).await?)
}

/// The sniffed type, with any parameters dropped from `text/html`
pub fn content_type_for(head: &[u8]) -> String {
    let detected = sniff::detect(head);
    if detected.essence_str() == mime::TEXT_HTML.essence_str() {
        return mime::TEXT_HTML.to_string();
    }
    detected.to_string()
}

// store failures reach the sniff as io errors from the reader and are
// reported the same as any other read failure
fn read_error(e: io::Error) -> GatewayError {
    GatewayError::ContentReadFailed(e.to_string())
}
