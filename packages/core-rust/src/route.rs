//! Route rules and inbound path matching.
//!
//! A rule is derived once from a [`ResourceName`]: every segment contributes a
//! static part (the token itself) followed by a parameter part bound under
//! the same token. `articles.comments` therefore becomes
//! `/articles/:articles/comments/:comments`, where the trailing parameter is
//! optional (its absence addresses the collection).

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};

use crate::name::ResourceName;
use crate::request::{Params, Query};
use crate::verb::Cardinality;

/// Maximum number of path segments accepted for matching.
pub const MAX_PATH_SEGMENTS: usize = 50;

/// Kind of a [`RoutePart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartKind {
    /// Must equal the token exactly.
    Static,
    /// Binds whatever segment sits at this position under the token name.
    Param,
}

/// One position of a [`RouteRule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePart {
    pub token: String,
    pub kind: PartKind,
}

impl RoutePart {
    fn fixed(token: &str) -> Self {
        Self {
            token: token.to_string(),
            kind: PartKind::Static,
        }
    }

    fn param(token: &str) -> Self {
        Self {
            token: token.to_string(),
            kind: PartKind::Param,
        }
    }
}

/// Matchable pattern derived from a resource name.
///
/// Invariant: `parts.len() == 2 * name.depth()`, alternating static/param.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    name: ResourceName,
    parts: Vec<RoutePart>,
}

/// Successful structural match of a path against a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub params: Params,
    pub cardinality: Cardinality,
}

impl RouteRule {
    /// Derives the rule for `name`.
    #[must_use]
    pub fn derive(name: &ResourceName) -> Self {
        let parts = name
            .segments()
            .iter()
            .flat_map(|segment| [RoutePart::fixed(segment), RoutePart::param(segment)])
            .collect();

        Self {
            name: name.clone(),
            parts,
        }
    }

    #[must_use]
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    #[must_use]
    pub fn parts(&self) -> &[RoutePart] {
        &self.parts
    }

    /// Matches already-split path segments against this rule.
    ///
    /// Every static part needs an equal segment at its position. Parameter
    /// parts always match and bind when a segment is present. Afterwards
    /// the segment count must equal the part count when the trailing
    /// parameter was bound, or the part count minus one when it was not.
    #[must_use]
    pub fn match_segments<S: AsRef<str>>(&self, segments: &[S]) -> Option<RouteMatch> {
        let mut params = Params::new();

        for (idx, part) in self.parts.iter().enumerate() {
            match (segments.get(idx).map(AsRef::as_ref), part.kind) {
                (Some(segment), PartKind::Param) => {
                    params.insert(part.token.clone(), segment.to_string());
                }
                (Some(segment), PartKind::Static) => {
                    if segment != part.token {
                        return None;
                    }
                }
                (None, PartKind::Param) => {}
                (None, PartKind::Static) => return None,
            }
        }

        let bound = segments.len() >= self.parts.len();
        let expected = if bound {
            self.parts.len()
        } else {
            self.parts.len() - 1
        };

        if segments.len() != expected {
            return None;
        }

        let cardinality = if bound {
            Cardinality::Member
        } else {
            Cardinality::Collection
        };

        Some(RouteMatch {
            params,
            cardinality,
        })
    }
}

/// Errors from splitting an inbound path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path has {count} segments, at most {MAX_PATH_SEGMENTS} are accepted")]
    TooManySegments { count: usize },

    #[error("malformed query string: {0}")]
    MalformedQuery(String),
}

/// An inbound path split into segments plus its decoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    pub segments: Vec<String>,
    pub query: Query,
}

impl ParsedPath {
    /// Strips one leading and one trailing `/`, splits off the query string,
    /// and splits the remainder on `/`. Each segment is percent-decoded after
    /// splitting, so an encoded `/` stays inside its segment.
    ///
    /// # Errors
    ///
    /// [`PathError::TooManySegments`] above [`MAX_PATH_SEGMENTS`] segments, and
    /// [`PathError::MalformedQuery`] when the query string cannot be decoded.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        let (path, raw_query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);

        let segments: Vec<String> = path
            .split('/')
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        if segments.len() > MAX_PATH_SEGMENTS {
            return Err(PathError::TooManySegments {
                count: segments.len(),
            });
        }

        let query = match raw_query {
            Some(raw) if !raw.is_empty() => {
                serde_urlencoded::from_str::<Vec<(String, String)>>(raw)
                    .map_err(|e| PathError::MalformedQuery(e.to_string()))?
                    .into_iter()
                    .collect()
            }
            _ => Query::new(),
        };

        Ok(Self { segments, query })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn rule(name: &str) -> RouteRule {
        RouteRule::derive(&ResourceName::parse(name).unwrap())
    }

    fn segments(path: &str) -> Vec<String> {
        ParsedPath::parse(path).unwrap().segments
    }

    #[test]
    fn derives_two_parts_per_segment() {
        assert_eq!(rule("test").parts().len(), 2);
        assert_eq!(rule("test.subtest").parts().len(), 4);

        let parts = rule("articles.comments");
        let kinds: Vec<_> = parts.parts().iter().map(|p| (p.token.as_str(), p.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("articles", PartKind::Static),
                ("articles", PartKind::Param),
                ("comments", PartKind::Static),
                ("comments", PartKind::Param),
            ]
        );
    }

    #[test]
    fn collection_path_matches_without_trailing_id() {
        let m = rule("articles").match_segments(&segments("/articles")).unwrap();
        assert_eq!(m.cardinality, Cardinality::Collection);
        assert!(m.params.is_empty());
    }

    #[test]
    fn member_path_binds_trailing_id() {
        let m = rule("articles").match_segments(&segments("/articles/123")).unwrap();
        assert_eq!(m.cardinality, Cardinality::Member);
        assert_eq!(m.params["articles"], "123");
    }

    #[test]
    fn nested_path_binds_every_parent_id() {
        let r = rule("articles.comments.upvotes");

        let m = r
            .match_segments(&segments("/articles/123/comments/456/upvotes"))
            .unwrap();
        assert_eq!(m.cardinality, Cardinality::Collection);
        assert_eq!(m.params["articles"], "123");
        assert_eq!(m.params["comments"], "456");
        assert!(!m.params.contains_key("upvotes"));

        let m = r
            .match_segments(&segments("/articles/123/comments/456/upvotes/789"))
            .unwrap();
        assert_eq!(m.cardinality, Cardinality::Member);
        assert_eq!(m.params["upvotes"], "789");
    }

    #[test]
    fn shorter_rule_rejects_longer_path() {
        assert!(rule("articles")
            .match_segments(&segments("/articles/123/comments"))
            .is_none());
    }

    #[test]
    fn longer_rule_rejects_parent_path() {
        // `/articles/123` leaves the `comments` static part unmatched
        assert!(rule("articles.comments")
            .match_segments(&segments("/articles/123"))
            .is_none());
        // a missing parent id shifts the static part out of place
        assert!(rule("articles.comments")
            .match_segments(&segments("/articles/comments"))
            .is_none());
    }

    #[test]
    fn static_mismatch_fails() {
        assert!(rule("articles").match_segments(&segments("/unknown")).is_none());
    }

    #[test]
    fn parse_strips_single_slashes_and_splits_query() {
        let parsed = ParsedPath::parse("/articles/123/?sort=desc&page=2").unwrap();
        assert_eq!(parsed.segments, ["articles", "123"]);
        assert_eq!(parsed.query["sort"], "desc");
        assert_eq!(parsed.query["page"], "2");

        let parsed = ParsedPath::parse("articles").unwrap();
        assert_eq!(parsed.segments, ["articles"]);
        assert!(parsed.query.is_empty());
    }

    #[test]
    fn parse_decodes_query_values() {
        let parsed = ParsedPath::parse("/articles?q=hello%20world&q=last").unwrap();
        assert_eq!(parsed.query["q"], "last");
    }

    #[test]
    fn parse_decodes_segments_after_splitting() {
        assert_eq!(
            segments("/articles/hello%20world/comments/caf%C3%A9%2F1"),
            ["articles", "hello world", "comments", "café/1"]
        );
    }

    #[test]
    fn parse_rejects_too_many_segments() {
        let path = vec!["a"; MAX_PATH_SEGMENTS + 1].join("/");
        assert_eq!(
            ParsedPath::parse(&path).unwrap_err(),
            PathError::TooManySegments {
                count: MAX_PATH_SEGMENTS + 1
            }
        );

        let path = vec!["a"; MAX_PATH_SEGMENTS].join("/");
        assert!(ParsedPath::parse(&path).is_ok());
    }

    proptest! {
        #[test]
        fn rule_part_count_is_twice_the_depth(segs in prop::collection::vec("[a-z]{1,8}", 1..6)) {
            let name = ResourceName::parse(&segs.join(".")).unwrap();
            let rule = RouteRule::derive(&name);
            prop_assert_eq!(rule.parts().len(), 2 * segs.len());
        }

        #[test]
        fn derived_member_and_collection_paths_match(
            segs in prop::collection::vec("[a-z]{1,8}", 1..6),
            ids in prop::collection::vec("[0-9]{1,4}", 6),
        ) {
            let name = ResourceName::parse(&segs.join(".")).unwrap();
            let rule = RouteRule::derive(&name);

            let mut path: Vec<String> = Vec::new();
            for (seg, id) in segs.iter().zip(&ids) {
                path.push(seg.clone());
                path.push(id.clone());
            }

            let member = rule.match_segments(&path).unwrap();
            prop_assert_eq!(member.cardinality, Cardinality::Member);

            path.pop();
            let collection = rule.match_segments(&path).unwrap();
            prop_assert_eq!(collection.cardinality, Cardinality::Collection);
        }
    }
}
