use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use url::Url;

use common::prelude::{DagNode, StoreError};

use super::{content, GatewayError, GatewayRequest, RequestContext};

/// Served in place of a listing when a directory contains it
pub const INDEX_FILE: &str = "index.html";

/// One row of a directory listing
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub name: String,
    pub href: String,
    pub cid: String,
}

#[derive(Template)]
#[template(path = "pages/gateway/directory.html")]
pub struct DirectoryTemplate {
    pub path: String,
    pub cid: String,
    pub entries: Vec<ListingEntry>,
}

/// Serve the directory's `index.html` if it has a file by that name,
///  otherwise an HTML listing of its children in DAG order
pub async fn render(
    ctx: &RequestContext,
    dir: &DagNode,
    request: GatewayRequest<'_>,
) -> Result<Response, GatewayError> {
    match ctx.bounded(ctx.dag().get_child(dir, INDEX_FILE)).await? {
        Ok(index) if index.kind().is_file() => {
            return content::serve(ctx, &index, INDEX_FILE, request).await;
        }
        Ok(index) => {
            tracing::debug!(
                kind = ?index.kind(),
                "{} in {} is not a file, listing instead",
                INDEX_FILE,
                dir.cid()
            );
        }
        Err(StoreError::ChildNotFound(_)) => {}
        Err(e) => return Err(GatewayError::FetchFailed(e.to_string())),
    }

    let children = ctx
        .bounded(ctx.dag().list_children(dir))
        .await?
        .map_err(|e| GatewayError::FetchFailed(e.to_string()))?;

    let entries = children
        .into_iter()
        .map(|child| -> Result<ListingEntry, GatewayError> {
            Ok(ListingEntry {
                href: child_href(request.uri_path, &child.name)?,
                cid: child.cid.to_string(),
                name: child.name,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let template = DirectoryTemplate {
        path: request.uri_path.to_string(),
        cid: dir.cid().to_string(),
        entries,
    };
    Ok(Html(template.render()?).into_response())
}

/// Join `name` onto the request path as a single percent-encoded segment
pub fn child_href(request_path: &str, name: &str) -> Result<String, GatewayError> {
    let mut url = Url::parse("http://gateway.local/").map_err(anyhow::Error::from)?;
    url.set_path(request_path);
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("cannot build a link below {}", request_path))?
        .pop_if_empty()
        .push(name);
    Ok(url.path().to_string())
}
