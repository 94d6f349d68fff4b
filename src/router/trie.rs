//! The route tree: a trie keyed by path segment.

use std::collections::HashMap;

use super::Handler;

/// One node per path segment. A node holds a handler only if a route
/// terminates at it; intermediate nodes have `handler: None`.
#[derive(Default)]
pub(crate) struct RouteNode {
    pub handler: Option<Handler>,
    pub children: HashMap<String, RouteNode>,
}

impl RouteNode {
    /// Walk to the node for `segments`, creating missing nodes on the way.
    pub fn insert(&mut self, segments: &[&str]) -> &mut RouteNode {
        let mut node = self;
        for segment in segments {
            node = node.children.entry((*segment).to_string()).or_default();
        }
        node
    }

    /// Walk to the node for `segments` without creating anything.
    pub fn find(&self, segments: &[&str]) -> Option<&RouteNode> {
        let mut node = self;
        for segment in segments {
            node = node.children.get(*segment)?;
        }
        Some(node)
    }

    pub fn find_mut(&mut self, segments: &[&str]) -> Option<&mut RouteNode> {
        let mut node = self;
        for segment in segments {
            node = node.children.get_mut(*segment)?;
        }
        Some(node)
    }
}

/// Split a path into its non-empty `/`-delimited segments.
///
/// Discarding empty segments makes `/path` and `/path/` route identically.
pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Extract the path-only component of a request target.
///
/// Requests may carry anything from a bare path to a full absolute URL;
/// query and fragment are stripped in either case.
pub(crate) fn path_of(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = &url[scheme_end + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "/",
            }
        }
        None => url,
    };
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    &rest[..end]
}
