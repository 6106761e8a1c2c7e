//! Locating image references in a values tree.

use crate::fieldpath::{Path, PathElement};
use crate::value::{Map, Value};
use std::collections::btree_map;
use std::iter::Enumerate;
use std::slice;

/// Key of a structured image block that names the image.
pub const REPOSITORY_KEY: &str = "repository";

/// Key of a structured image block that holds the version.
pub const TAG_KEY: &str = "tag";

/// Match is one occurrence of the target image in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// A map whose `repository` equals the image name. `path` points at the map.
    Structured { path: Path },
    /// A map value of the form `<image>:<version>`. `path` points at the map
    /// holding `key`; `value` is the string seen when the match was made.
    Inline {
        path: Path,
        key: String,
        value: String,
    },
}

impl Match {
    /// Path of the map the match rewrites.
    pub fn path(&self) -> &Path {
        match self {
            Match::Structured { path } => path,
            Match::Inline { path, .. } => path,
        }
    }

    /// Path of the node that holds the version: `tag` for structured blocks,
    /// the matched key for inline references.
    pub fn location(&self) -> Path {
        match self {
            Match::Structured { path } => path.with(PathElement::field_name(TAG_KEY)),
            Match::Inline { path, key, .. } => path.with(PathElement::field_name(key.clone())),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Match::Structured { .. })
    }
}

enum Frame<'a> {
    Map(btree_map::Iter<'a, String, Value>),
    List(Enumerate<slice::Iter<'a, Value>>),
}

/// Finds every place in `tree` that references `image_name`, in pre-order.
///
/// A map is a structured match when its `repository` is exactly `image_name`.
/// Independently, each string value of a map that starts with `image_name:` is
/// an inline match; any other map or list value is descended into. One map can
/// therefore yield a structured match and inline matches at the same time.
///
/// The walk keeps its own stack, so deeply nested trees do not exhaust the
/// call stack.
pub fn find_matches(tree: &Value, image_name: &str) -> Vec<Match> {
    let prefix = format!("{}:", image_name);
    let mut matches = Vec::new();
    let mut path = Path::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    match tree {
        Value::Map(map) => {
            check_structured(map, image_name, &path, &mut matches);
            stack.push(Frame::Map(map.fields.iter()));
        }
        Value::List(items) => stack.push(Frame::List(items.iter().enumerate())),
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {}
    }

    while let Some(frame) = stack.last_mut() {
        let (element, child) = match frame {
            Frame::Map(iter) => match iter.next() {
                Some((key, Value::String(s))) if s.starts_with(&prefix) => {
                    matches.push(Match::Inline {
                        path: path.clone(),
                        key: key.clone(),
                        value: s.clone(),
                    });
                    continue;
                }
                Some((key, child)) => (PathElement::FieldName(key.clone()), child),
                None => {
                    stack.pop();
                    path.pop();
                    continue;
                }
            },
            Frame::List(iter) => match iter.next() {
                Some((i, child)) => (PathElement::Index(i), child),
                None => {
                    stack.pop();
                    path.pop();
                    continue;
                }
            },
        };

        match child {
            Value::Map(map) => {
                path.push(element);
                check_structured(map, image_name, &path, &mut matches);
                stack.push(Frame::Map(map.fields.iter()));
            }
            Value::List(items) => {
                path.push(element);
                stack.push(Frame::List(items.iter().enumerate()));
            }
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => {}
        }
    }

    matches
}

fn check_structured(map: &Map, image_name: &str, path: &Path, matches: &mut Vec<Match>) {
    if map.get_str(REPOSITORY_KEY) == Some(image_name) {
        matches.push(Match::Structured { path: path.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    fn p(elements: &[&str]) -> Path {
        elements.iter().map(|e| PathElement::field_name(*e)).collect()
    }

    #[test]
    fn test_structured_block() {
        let tree = from_yaml("image:\n  repository: ghcr.io/my-org/web-app\n  tag: 1.2.3\n").unwrap();
        let matches = find_matches(&tree, "ghcr.io/my-org/web-app");
        assert_eq!(matches, vec![Match::Structured { path: p(&["image"]) }]);
        assert_eq!(matches[0].location(), p(&["image", "tag"]));
    }

    #[test]
    fn test_structured_block_without_tag() {
        let tree = from_yaml("image:\n  repository: nginx\n").unwrap();
        assert_eq!(find_matches(&tree, "nginx").len(), 1);
    }

    #[test]
    fn test_repository_must_be_exact() {
        let tree = from_yaml("image:\n  repository: ghcr.io/my-org/web-app-v2\n").unwrap();
        assert!(find_matches(&tree, "ghcr.io/my-org/web-app").is_empty());

        let tree = from_yaml("image:\n  repository: 42\n").unwrap();
        assert!(find_matches(&tree, "42").is_empty());
    }

    #[test]
    fn test_inline_reference() {
        let tree = from_yaml(
            "images:\n  api: ghcr.io/my-org/api:1.3.8\n  nginx: nginx:1.25.0\n",
        )
        .unwrap();
        let matches = find_matches(&tree, "ghcr.io/my-org/api");
        assert_eq!(
            matches,
            vec![Match::Inline {
                path: p(&["images"]),
                key: "api".into(),
                value: "ghcr.io/my-org/api:1.3.8".into(),
            }]
        );
    }

    #[test]
    fn test_inline_requires_colon_after_name() {
        let tree = from_yaml("images:\n  a: ghcr.io/my-org/api-gateway:1.0.0\n  b: ghcr.io/my-org/api\n").unwrap();
        assert!(find_matches(&tree, "ghcr.io/my-org/api").is_empty());
    }

    #[test]
    fn test_mixed_conventions_in_one_map() {
        let tree = from_yaml(
            "app:\n  repository: ghcr.io/x/y\n  tag: 1.0.0\n  mirror: ghcr.io/x/y:1.0.0\n",
        )
        .unwrap();
        let matches = find_matches(&tree, "ghcr.io/x/y");
        assert_eq!(matches.len(), 2);
        assert!(matches[0].is_structured());
        assert_eq!(matches[1].location(), p(&["app", "mirror"]));
    }

    #[test]
    fn test_walks_lists_in_preorder() {
        let tree = from_yaml(
            r#"
containers:
  - name: first
    image:
      repository: busybox
      tag: 1.0.0
  - name: second
    image: busybox:1.0.0
  - [nested, {repository: busybox}]
tail: busybox:2.0.0
"#,
        )
        .unwrap();
        let locations: Vec<String> = find_matches(&tree, "busybox")
            .iter()
            .map(|m| m.location().to_string())
            .collect();
        assert_eq!(
            locations,
            vec![
                ".containers[0].image.tag",
                ".containers[1].image",
                ".containers[2][1].tag",
                ".tail",
            ]
        );
    }

    #[test]
    fn test_strings_in_lists_are_not_inline_matches() {
        let tree = from_yaml("images:\n  - busybox:1.0.0\n").unwrap();
        assert!(find_matches(&tree, "busybox").is_empty());
    }

    #[test]
    fn test_root_is_structured_block() {
        let tree = from_yaml("repository: redis\ntag: 6.2.5\n").unwrap();
        assert_eq!(find_matches(&tree, "redis"), vec![Match::Structured { path: Path::new() }]);
    }

    #[test]
    fn test_scalar_root_and_no_match() {
        assert!(find_matches(&Value::from("redis:1.0.0"), "redis").is_empty());
        assert!(find_matches(&Value::Null, "redis").is_empty());

        let tree = from_yaml("image:\n  repository: nginx\n").unwrap();
        assert!(find_matches(&tree, "redis").is_empty());
    }

    #[test]
    fn test_deep_nesting() {
        let mut tree = Value::from("deep/img:0.1.0");
        for i in 0..10_000 {
            let mut map = Map::new();
            map.set(format!("k{}", i % 3), tree);
            tree = if i % 2 == 0 { Value::Map(map) } else { Value::List(vec![Value::Map(map)]) };
        }
        let matches = find_matches(&tree, "deep/img");
        assert_eq!(matches.len(), 1);
        assert!(matches[0].path().resolve(&tree).is_some_and(Value::is_map));
        // Dropping a tree this deep would recurse; leak it instead.
        std::mem::forget(tree);
    }
}
