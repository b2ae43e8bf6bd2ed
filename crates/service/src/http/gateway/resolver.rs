use common::prelude::{parse_cid, Cid, DagNode, Kind, StoreError};

use super::{GatewayError, RequestContext};

/// The node a request path points at
#[derive(Debug, Clone)]
pub struct Resolved {
    /// the identifier the path started from
    pub root: Cid,
    pub node: DagNode,
    /// path segments walked below the root, empty ones dropped
    pub segments: Vec<String>,
}

impl Resolved {
    /// Name to present the resolved node under: the last path segment,
    ///  or the root identifier for a bare CID
    pub fn name(&self) -> String {
        match self.segments.last() {
            Some(name) => name.clone(),
            None => self.root.to_string(),
        }
    }

    pub fn display_path(&self) -> String {
        display_path(&self.root, &self.segments)
    }
}

/// Parse `<cid>[/<segment>...]` and walk the DAG to the node it names
pub async fn resolve(ctx: &RequestContext, raw_path: &str) -> Result<Resolved, GatewayError> {
    let mut parts = raw_path.split('/').filter(|s| !s.is_empty());

    let first = parts
        .next()
        .ok_or_else(|| GatewayError::InvalidIdentifier("no content identifier in path".into()))?;
    let root = parse_cid(first).map_err(|e| GatewayError::InvalidIdentifier(e.to_string()))?;
    let segments: Vec<String> = parts.map(str::to_string).collect();

    let mut node = ctx
        .bounded(ctx.dag().get_node(&root))
        .await?
        .map_err(|e| match e {
            StoreError::NotFound(cid) => GatewayError::NotFound(cid.to_string()),
            other => GatewayError::FetchFailed(other.to_string()),
        })?;

    for (depth, name) in segments.iter().enumerate() {
        let walked = || display_path(&root, &segments[..depth]);
        match node.kind() {
            Kind::Directory => {}
            Kind::Symlink => {
                return Err(GatewayError::UnsupportedNodeKind(format!(
                    "{} is a symlink",
                    walked()
                )))
            }
            Kind::RegularFile | Kind::RawLeaf | Kind::Unsupported => {
                return Err(GatewayError::PathNotFound(format!(
                    "{} is not a directory",
                    walked()
                )))
            }
        }

        node = ctx
            .bounded(ctx.dag().get_child(&node, name))
            .await?
            .map_err(|e| child_error(e, &display_path(&root, &segments[..=depth])))?;
    }

    Ok(Resolved {
        root,
        node,
        segments,
    })
}

fn child_error(e: StoreError, path: &str) -> GatewayError {
    match e {
        StoreError::ChildNotFound(_) | StoreError::NotADirectory(_) => {
            GatewayError::PathNotFound(path.to_string())
        }
        // linked from a directory but missing from the store
        StoreError::NotFound(_) | StoreError::Fetch(_) => {
            GatewayError::FetchFailed(format!("{}: {}", path, e))
        }
        StoreError::NotAFile(_) => GatewayError::Internal(anyhow::anyhow!("{}: {}", path, e)),
    }
}

fn display_path(root: &Cid, segments: &[String]) -> String {
    std::iter::once(root.to_string())
        .chain(segments.iter().cloned())
        .collect::<Vec<_>>()
        .join("/")
}
