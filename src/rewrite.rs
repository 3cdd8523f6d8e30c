//! Cycle-safe, copy-on-write rewriting of string leaves in a content tree.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::content::{ContentNode, MappingRef, SequenceRef};

/// Transformation applied to every string leaf reached by [`rewrite_tree`].
pub trait LeafTransform {
    /// Error aborting the rewrite.
    type Error;

    /// Rewrite `value`, stored under `key` in a mapping or under no key in a sequence.
    ///
    /// Returning `Ok(None)` keeps the original leaf.
    fn transform_leaf(&mut self, value: &str, key: Option<&str>)
    -> Result<Option<String>, Self::Error>;
}

impl<F, E> LeafTransform for F
where
    F: FnMut(&str, Option<&str>) -> Result<String, E>,
{
    type Error = E;

    fn transform_leaf(&mut self, value: &str, key: Option<&str>) -> Result<Option<String>, E> {
        let rewritten = (self)(value, key)?;
        Ok((rewritten != value).then_some(rewritten))
    }
}

/// Rewrite every string leaf reachable from `node`, returning the rewritten tree.
///
/// The input is never mutated. Mappings whose values are all unchanged are returned as the
/// same container; a changed mapping yields exactly one shallow copy. Sequences are always
/// shallow-copied. A container reached again while it is still being rewritten (a cycle) is
/// returned as-is, so the back-reference in the result points at the original container.
pub fn rewrite_tree<T: LeafTransform>(
    node: &ContentNode,
    transform: &mut T,
) -> Result<ContentNode, T::Error> {
    TreeRewriter {
        transform,
        active_path: HashSet::new(),
    }
    .rewrite(node, None)
}

struct TreeRewriter<'t, T> {
    transform: &'t mut T,
    active_path: HashSet<usize>,
}

impl<T: LeafTransform> TreeRewriter<'_, T> {
    fn rewrite(&mut self, node: &ContentNode, key: Option<&str>) -> Result<ContentNode, T::Error> {
        match node {
            ContentNode::String(value) => match self.transform.transform_leaf(value, key)? {
                Some(rewritten) if *rewritten != **value => Ok(ContentNode::string(rewritten)),
                _ => Ok(node.clone()),
            },
            ContentNode::Sequence(items) => self.within(node, |this| this.rewrite_sequence(items)),
            ContentNode::Mapping(map) => self.within(node, |this| this.rewrite_mapping(map)),
            ContentNode::Null | ContentNode::Bool(_) | ContentNode::Number(_) => Ok(node.clone()),
        }
    }

    fn within(
        &mut self,
        node: &ContentNode,
        visit: impl FnOnce(&mut Self) -> Result<ContentNode, T::Error>,
    ) -> Result<ContentNode, T::Error> {
        let Some(id) = node.container_id() else {
            return Ok(node.clone());
        };
        if !self.active_path.insert(id) {
            return Ok(node.clone());
        }

        let result = visit(self);
        self.active_path.remove(&id);
        result
    }

    fn rewrite_sequence(&mut self, items: &SequenceRef) -> Result<ContentNode, T::Error> {
        let items = items.borrow();
        let mut rewritten = Vec::with_capacity(items.len());
        for item in items.iter() {
            rewritten.push(self.rewrite(item, None)?);
        }
        Ok(ContentNode::Sequence(Rc::new(RefCell::new(rewritten))))
    }

    fn rewrite_mapping(&mut self, map: &MappingRef) -> Result<ContentNode, T::Error> {
        let entries = map.borrow();
        let mut working = None;

        for (key, value) in entries.iter() {
            let rewritten = self.rewrite(value, Some(key.as_str()))?;
            if !rewritten.is_same(value) {
                working
                    .get_or_insert_with(|| entries.clone())
                    .insert(key.clone(), rewritten);
            }
        }

        Ok(match working {
            Some(copy) => ContentNode::Mapping(Rc::new(RefCell::new(copy))),
            None => ContentNode::Mapping(Rc::clone(map)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use serde_json::json;

    use super::*;

    fn upper(value: &str, _key: Option<&str>) -> Result<String, Infallible> {
        Ok(value.to_uppercase())
    }

    fn children(node: &ContentNode) -> Vec<ContentNode> {
        match node {
            ContentNode::Sequence(items) => items.borrow().clone(),
            ContentNode::Mapping(map) => map.borrow().values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    fn collect_containers(node: &ContentNode, seen: &mut HashSet<usize>) {
        if let Some(id) = node.container_id() {
            if seen.insert(id) {
                for child in children(node) {
                    collect_containers(&child, seen);
                }
            }
        }
    }

    fn count_new_containers(node: &ContentNode, original: &HashSet<usize>) -> usize {
        match node.container_id() {
            Some(id) if !original.contains(&id) => {
                1 + children(node)
                    .iter()
                    .map(|child| count_new_containers(child, original))
                    .sum::<usize>()
            }
            _ => 0,
        }
    }

    #[test]
    fn rewrites_strings_in_mappings_and_sequences() {
        let tree = ContentNode::from(json!({
            "title": "home",
            "links": ["a", { "label": "b" }],
            "weight": 2,
        }));

        let rewritten = rewrite_tree(&tree, &mut upper).unwrap();
        assert_eq!(
            rewritten.to_json().unwrap(),
            json!({ "title": "HOME", "links": ["A", { "label": "B" }], "weight": 2 })
        );
        assert_eq!(
            tree.to_json().unwrap(),
            json!({ "title": "home", "links": ["a", { "label": "b" }], "weight": 2 })
        );
    }

    #[test]
    fn passes_keys_to_the_transform() {
        let tree = ContentNode::from(json!({ "body": "x", "items": ["y"] }));
        let mut seen = Vec::new();
        let mut record = |value: &str, key: Option<&str>| -> Result<String, Infallible> {
            seen.push((value.to_string(), key.map(str::to_string)));
            Ok(value.to_string())
        };

        rewrite_tree(&tree, &mut record).unwrap();
        seen.sort();
        assert_eq!(seen, vec![
            ("x".to_string(), Some("body".to_string())),
            ("y".to_string(), None),
        ]);
    }

    #[test]
    fn unchanged_mappings_keep_their_identity() {
        let nested = ContentNode::mapping([("name", ContentNode::string("UPPER"))]);
        let tree = ContentNode::mapping([
            ("count", ContentNode::from(json!(4))),
            ("nested", nested.clone()),
            ("flag", ContentNode::Bool(true)),
        ]);

        let rewritten = rewrite_tree(&tree, &mut upper).unwrap();
        assert!(rewritten.ptr_eq(&tree));
        assert!(rewritten.get("nested").unwrap().ptr_eq(&nested));
    }

    #[test]
    fn changed_mappings_share_unchanged_children() {
        let untouched = ContentNode::mapping([("id", ContentNode::string("KEEP"))]);
        let tree = ContentNode::mapping([
            ("a", ContentNode::string("x")),
            ("b", ContentNode::string("y")),
            ("keep", untouched.clone()),
        ]);

        let rewritten = rewrite_tree(&tree, &mut upper).unwrap();
        assert!(!rewritten.ptr_eq(&tree));
        assert!(rewritten.get("keep").unwrap().ptr_eq(&untouched));
        assert_eq!(rewritten.get("a").unwrap().as_str(), Some("X"));
        assert_eq!(rewritten.get("b").unwrap().as_str(), Some("Y"));
        assert_eq!(tree.get("a").unwrap().as_str(), Some("x"));
    }

    #[test]
    fn sequences_are_always_copied() {
        let tree = ContentNode::sequence([ContentNode::Null]);
        let rewritten = rewrite_tree(&tree, &mut upper).unwrap();
        assert!(!rewritten.ptr_eq(&tree));
        assert_eq!(rewritten.to_json().unwrap(), json!([null]));
    }

    #[test]
    fn root_strings_are_transformed() {
        let rewritten = rewrite_tree(&ContentNode::string("root"), &mut upper).unwrap();
        assert_eq!(rewritten.as_str(), Some("ROOT"));
    }

    #[test]
    fn direct_self_reference_terminates() {
        let root = ContentNode::mapping([("title", ContentNode::string("loop"))]);
        root.insert("self", root.clone());

        let rewritten = rewrite_tree(&root, &mut upper).unwrap();
        assert_eq!(rewritten.get("title").unwrap().as_str(), Some("LOOP"));
        assert!(rewritten.get("self").unwrap().ptr_eq(&root));
    }

    #[test]
    fn transitive_cycles_terminate_without_growing() {
        let parent = ContentNode::mapping([("name", ContentNode::string("parent"))]);
        let child = ContentNode::mapping([("name", ContentNode::string("child"))]);
        let children = ContentNode::sequence([child.clone()]);
        parent.insert("children", children);
        child.insert("parent", parent.clone());

        let rewritten = rewrite_tree(&parent, &mut upper).unwrap();

        let rewritten_child = rewritten.get("children").unwrap().at(0).unwrap();
        assert_eq!(rewritten_child.get("name").unwrap().as_str(), Some("CHILD"));
        assert!(rewritten_child.get("parent").unwrap().ptr_eq(&parent));

        let mut original = HashSet::new();
        collect_containers(&parent, &mut original);
        assert_eq!(original.len(), 3);
        assert_eq!(count_new_containers(&rewritten, &original), 3);
    }

    #[test]
    fn shared_siblings_are_rewritten_on_every_path() {
        let shared = ContentNode::mapping([("label", ContentNode::string("shared"))]);
        let tree = ContentNode::mapping([("first", shared.clone()), ("second", shared)]);

        let rewritten = rewrite_tree(&tree, &mut upper).unwrap();
        assert_eq!(
            rewritten.to_json().unwrap(),
            json!({ "first": { "label": "SHARED" }, "second": { "label": "SHARED" } })
        );
    }

    #[test]
    fn transform_errors_propagate() {
        let tree = ContentNode::from(json!({ "ok": "a", "zz": ["bad"] }));
        let mut failing = |value: &str, _key: Option<&str>| -> Result<String, String> {
            if value == "bad" {
                Err(format!("rejected {value}"))
            } else {
                Ok(value.to_string())
            }
        };

        assert_eq!(
            rewrite_tree(&tree, &mut failing).unwrap_err(),
            "rejected bad".to_string()
        );
    }
}
