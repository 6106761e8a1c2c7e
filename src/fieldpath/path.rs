//! Path element and path types.

use crate::value::{Map, Value};

/// PathElement represents one level of path navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathElement {
    /// Field name for map fields.
    FieldName(String),
    /// Index into a list.
    Index(usize),
}

impl PathElement {
    /// Creates a new field name path element.
    pub fn field_name(name: impl Into<String>) -> Self {
        PathElement::FieldName(name.into())
    }

    /// Creates a new index path element.
    pub fn index(i: usize) -> Self {
        PathElement::Index(i)
    }

    fn step<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        match (self, value) {
            (PathElement::FieldName(name), Value::Map(m)) => m.get(name),
            (PathElement::Index(i), Value::List(l)) => l.get(*i),
            _ => None,
        }
    }

    fn step_mut<'a>(&self, value: &'a mut Value) -> Option<&'a mut Value> {
        match (self, value) {
            (PathElement::FieldName(name), Value::Map(m)) => m.get_mut(name),
            (PathElement::Index(i), Value::List(l)) => l.get_mut(*i),
            _ => None,
        }
    }
}

/// Path represents the location of a node, as a sequence of steps from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// Creates a new empty path, which refers to the root.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a path from a vector of elements.
    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Path { elements }
    }

    /// Returns the number of elements in the path.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends a path element.
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// Removes and returns the last path element.
    pub fn pop(&mut self) -> Option<PathElement> {
        self.elements.pop()
    }

    /// Returns the last path element.
    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    /// Creates a new path with the given element appended.
    pub fn with(&self, element: PathElement) -> Self {
        let mut new_path = self.clone();
        new_path.push(element);
        new_path
    }

    /// Follows the path from `root`. Returns None as soon as a step does not exist.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.elements
            .iter()
            .try_fold(root, |node, element| element.step(node))
    }

    /// Mutable counterpart of [`Path::resolve`].
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        self.elements
            .iter()
            .try_fold(root, |node, element| element.step_mut(node))
    }

    /// Resolves the path and returns the node only if it is a map.
    pub fn resolve_map_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Map> {
        self.resolve_mut(root).and_then(Value::as_map_mut)
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for PathElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathElement::FieldName(name) => write!(f, ".{}", name),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.elements.is_empty() {
            return write!(f, ".");
        }
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}
