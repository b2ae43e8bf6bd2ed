use axum::response::Response;

use common::prelude::Kind;

use super::{content, directory, GatewayError, GatewayRequest, RequestContext, Resolved};

/// Branch on the resolved node's kind. Each kind has exactly one outcome.
pub async fn dispatch(
    ctx: &RequestContext,
    resolved: &Resolved,
    request: GatewayRequest<'_>,
) -> Result<Response, GatewayError> {
    match resolved.node.kind() {
        Kind::RegularFile | Kind::RawLeaf => {
            content::serve(ctx, &resolved.node, &resolved.name(), request).await
        }
        Kind::Directory => directory::render(ctx, &resolved.node, request).await,
        // links are never followed
        Kind::Symlink => Err(GatewayError::UnsupportedNodeKind(format!(
            "{} is a symlink",
            resolved.display_path()
        ))),
        Kind::Unsupported => Err(GatewayError::UnknownNodeKind(format!(
            "{} has an encoding the gateway does not understand",
            resolved.display_path()
        ))),
    }
}
