//! Shared, possibly cyclic content tree produced from CMS exports.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::ContentError;

/// Shared handle to an ordered sequence of nodes.
pub type SequenceRef = Rc<RefCell<Vec<ContentNode>>>;
/// Shared handle to a keyed mapping of nodes.
pub type MappingRef = Rc<RefCell<BTreeMap<String, ContentNode>>>;

/// A value inside a content export.
///
/// Containers are reference counted so the same sequence or mapping can appear at several
/// places in the tree, including inside itself. Cloning a node never copies a container.
#[derive(Clone)]
pub enum ContentNode {
    /// JSON `null`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(Number),
    /// String scalar, the only kind of leaf that is ever rewritten.
    String(Rc<str>),
    /// Ordered sequence of nodes.
    Sequence(SequenceRef),
    /// Mapping from string keys to nodes.
    Mapping(MappingRef),
}

impl ContentNode {
    /// Create a string leaf.
    pub fn string(value: impl Into<Rc<str>>) -> Self {
        Self::String(value.into())
    }

    /// Create a new sequence container.
    pub fn sequence(items: impl IntoIterator<Item = ContentNode>) -> Self {
        Self::Sequence(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Create a new mapping container.
    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, ContentNode)>) -> Self {
        Self::Mapping(Rc::new(RefCell::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )))
    }

    /// Insert a value into a mapping in place, returning `false` for non-mappings.
    ///
    /// Every holder of the mapping observes the insertion, which is how cyclic shapes are
    /// built.
    pub fn insert(&self, key: impl Into<String>, value: ContentNode) -> bool {
        match self {
            Self::Mapping(map) => {
                map.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Append a value to a sequence in place, returning `false` for non-sequences.
    pub fn push(&self, value: ContentNode) -> bool {
        match self {
            Self::Sequence(items) => {
                items.borrow_mut().push(value);
                true
            }
            _ => false,
        }
    }

    /// Look up a mapping entry.
    pub fn get(&self, key: &str) -> Option<ContentNode> {
        match self {
            Self::Mapping(map) => map.borrow().get(key).cloned(),
            _ => None,
        }
    }

    /// Look up a sequence element.
    pub fn at(&self, index: usize) -> Option<ContentNode> {
        match self {
            Self::Sequence(items) => items.borrow().get(index).cloned(),
            _ => None,
        }
    }

    /// Borrow the string value of a leaf.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_ref()),
            _ => None,
        }
    }

    /// Address of the container backing this node, if it is one.
    pub fn container_id(&self) -> Option<usize> {
        match self {
            Self::Sequence(items) => Some(Rc::as_ptr(items) as *const () as usize),
            Self::Mapping(map) => Some(Rc::as_ptr(map) as *const () as usize),
            _ => None,
        }
    }

    /// Whether both nodes are the same container, compared by identity.
    pub fn ptr_eq(&self, other: &ContentNode) -> bool {
        match (self, other) {
            (Self::Sequence(a), Self::Sequence(b)) => Rc::ptr_eq(a, b),
            (Self::Mapping(a), Self::Mapping(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether a rewritten node can stand in for the original without copying its parent.
    ///
    /// Containers compare by identity and scalars by value.
    pub fn is_same(&self, other: &ContentNode) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => self.ptr_eq(other),
        }
    }

    /// Convert the tree into plain JSON.
    ///
    /// Shared containers are expanded at every place they occur. A container that contains
    /// itself cannot be expressed and fails with [`ContentError::CyclicReference`].
    pub fn to_json(&self) -> Result<Value, ContentError> {
        let mut active = HashSet::new();
        self.to_json_inner(&mut active)
    }

    fn to_json_inner(&self, active: &mut HashSet<usize>) -> Result<Value, ContentError> {
        match self {
            Self::Null => Ok(Value::Null),
            Self::Bool(value) => Ok(Value::Bool(*value)),
            Self::Number(value) => Ok(Value::Number(value.clone())),
            Self::String(value) => Ok(Value::String(value.to_string())),
            Self::Sequence(items) => with_active_container(active, Rc::as_ptr(items), |active| {
                items
                    .borrow()
                    .iter()
                    .map(|item| item.to_json_inner(active))
                    .collect::<Result<Vec<Value>, ContentError>>()
                    .map(Value::Array)
            }),
            Self::Mapping(map) => with_active_container(active, Rc::as_ptr(map), |active| {
                let mut object = Map::new();
                for (key, value) in map.borrow().iter() {
                    object.insert(key.clone(), value.to_json_inner(active)?);
                }
                Ok(Value::Object(object))
            }),
        }
    }
}

fn with_active_container<T, C>(
    active: &mut HashSet<usize>,
    container: *const C,
    visit: impl FnOnce(&mut HashSet<usize>) -> Result<T, ContentError>,
) -> Result<T, ContentError> {
    let id = container as *const () as usize;
    if !active.insert(id) {
        return Err(ContentError::CyclicReference);
    }
    let result = visit(active);
    active.remove(&id);
    result
}

impl From<Value> for ContentNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(value) => Self::Number(value),
            Value::String(value) => Self::string(value),
            Value::Array(items) => Self::sequence(items.into_iter().map(Self::from)),
            Value::Object(map) => {
                Self::mapping(map.into_iter().map(|(key, value)| (key, Self::from(value))))
            }
        }
    }
}

impl From<&str> for ContentNode {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl<'de> Deserialize<'de> for ContentNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for ContentNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl fmt::Debug for ContentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(value) => write!(f, "Bool({value})"),
            Self::Number(value) => write!(f, "Number({value})"),
            Self::String(value) => write!(f, "String({value:?})"),
            Self::Sequence(items) => write!(
                f,
                "Sequence({:#x}, {} items)",
                self.container_id().unwrap_or_default(),
                items.borrow().len()
            ),
            Self::Mapping(map) => write!(
                f,
                "Mapping({:#x}, {} keys)",
                self.container_id().unwrap_or_default(),
                map.borrow().len()
            ),
        }
    }
}
