//! Structured node reader/writer over JSON documents.
//!
//! Map persistence is written as named nodes containing scalar keys, child
//! nodes, and homogeneous node lists. The writer builds a
//! [`serde_json::Value`] tree; the reader walks one. Keeping the two sides
//! symmetric means the file format is defined once, in the code that calls
//! them, rather than in a pile of serde derives with format attributes.

use serde_json::{Map as JsonMap, Value};

use crate::error::MapError;

/// Builds a JSON document as a stack of named nodes.
#[derive(Debug)]
pub struct NodeWriter {
    stack: Vec<(String, JsonMap<String, Value>)>,
}

impl NodeWriter {
    /// Starts a document with a single open root node.
    #[must_use]
    pub fn new(root: &str) -> Self {
        Self {
            stack: vec![(root.to_owned(), JsonMap::new())],
        }
    }

    fn current(&mut self) -> &mut JsonMap<String, Value> {
        // The root frame is pushed in `new` and only removed by `finish`.
        &mut self.stack.last_mut().expect("writer stack is never empty").1
    }

    /// Writes a string value under `key` in the open node.
    pub fn write_str(&mut self, key: &str, value: &str) {
        self.current().insert(key.to_owned(), Value::from(value));
    }

    /// Writes a float value under `key` in the open node.
    pub fn write_f32(&mut self, key: &str, value: f32) {
        self.current().insert(key.to_owned(), Value::from(value));
    }

    /// Writes a boolean value under `key` in the open node.
    pub fn write_bool(&mut self, key: &str, value: bool) {
        self.current().insert(key.to_owned(), Value::from(value));
    }

    /// Writes an unsigned value under `key` in the open node.
    pub fn write_u32(&mut self, key: &str, value: u32) {
        self.current().insert(key.to_owned(), Value::from(value));
    }

    /// Opens a child node. Must be balanced by [`end_node`](Self::end_node)
    /// with the same name.
    pub fn begin_node(&mut self, name: &str) {
        self.stack.push((name.to_owned(), JsonMap::new()));
    }

    /// Closes the open child node, attaching it to its parent.
    ///
    /// # Errors
    ///
    /// [`MapError::UnbalancedNode`] if `name` does not match the open node
    /// or only the root is open.
    pub fn end_node(&mut self, name: &str) -> Result<(), MapError> {
        if self.stack.len() < 2 || self.stack.last().map(|(n, _)| n.as_str()) != Some(name) {
            let open = self
                .stack
                .last()
                .map_or_else(String::new, |(n, _)| n.clone());
            return Err(MapError::UnbalancedNode {
                open,
                found: name.to_owned(),
            });
        }
        let (node_name, node) = self.stack.pop().expect("checked above");
        self.current().insert(node_name, Value::Object(node));
        Ok(())
    }

    /// Writes a list node: one child object per item, produced by `f`.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `f`.
    pub fn write_many<T>(
        &mut self,
        name: &str,
        items: impl IntoIterator<Item = T>,
        mut f: impl FnMut(&mut Self, T) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        let mut records = Vec::new();
        for item in items {
            self.stack.push((name.to_owned(), JsonMap::new()));
            f(self, item)?;
            let (_, record) = self.stack.pop().expect("pushed above");
            records.push(Value::Object(record));
        }
        self.current().insert(name.to_owned(), Value::Array(records));
        Ok(())
    }

    /// Finishes the document, returning `{root: {...}}`.
    ///
    /// # Errors
    ///
    /// [`MapError::UnbalancedNode`] if a child node is still open.
    pub fn finish(mut self) -> Result<Value, MapError> {
        if self.stack.len() != 1 {
            let open = self
                .stack
                .last()
                .map_or_else(String::new, |(n, _)| n.clone());
            return Err(MapError::UnbalancedNode {
                open,
                found: String::new(),
            });
        }
        let (root_name, root) = self.stack.pop().expect("checked above");
        let mut doc = JsonMap::new();
        doc.insert(root_name, Value::Object(root));
        Ok(Value::Object(doc))
    }
}

/// Reads a JSON document written by [`NodeWriter`].
#[derive(Debug, Clone, Copy)]
pub struct NodeReader<'a> {
    node: &'a JsonMap<String, Value>,
}

impl<'a> NodeReader<'a> {
    /// Opens the named root node of a document.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingNode`] if the root is absent or not an object.
    pub fn from_root(doc: &'a Value, root: &str) -> Result<Self, MapError> {
        let node = doc
            .get(root)
            .and_then(Value::as_object)
            .ok_or_else(|| MapError::MissingNode(root.to_owned()))?;
        Ok(Self { node })
    }

    /// Opens a required child node.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingNode`] if the child is absent or not an object.
    pub fn node(&self, name: &str) -> Result<Self, MapError> {
        self.opt_node(name)
            .ok_or_else(|| MapError::MissingNode(name.to_owned()))
    }

    /// Opens a child node if one is present.
    #[must_use]
    pub fn opt_node(&self, name: &str) -> Option<Self> {
        self.node
            .get(name)
            .and_then(Value::as_object)
            .map(|node| Self { node })
    }

    fn value(&self, key: &str) -> Result<&'a Value, MapError> {
        self.node
            .get(key)
            .ok_or_else(|| MapError::MissingKey(key.to_owned()))
    }

    /// Reads a required string.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingKey`] or [`MapError::TypeMismatch`].
    pub fn read_str(&self, key: &str) -> Result<&'a str, MapError> {
        self.value(key)?
            .as_str()
            .ok_or_else(|| MapError::TypeMismatch {
                key: key.to_owned(),
                expected: "string",
            })
    }

    /// Reads a required float.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingKey`] or [`MapError::TypeMismatch`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_f32(&self, key: &str) -> Result<f32, MapError> {
        self.value(key)?
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| MapError::TypeMismatch {
                key: key.to_owned(),
                expected: "number",
            })
    }

    /// Reads a required boolean.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingKey`] or [`MapError::TypeMismatch`].
    pub fn read_bool(&self, key: &str) -> Result<bool, MapError> {
        self.value(key)?
            .as_bool()
            .ok_or_else(|| MapError::TypeMismatch {
                key: key.to_owned(),
                expected: "boolean",
            })
    }

    /// Reads a required unsigned value that must fit in `u16`.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingKey`] or [`MapError::TypeMismatch`].
    pub fn read_u16(&self, key: &str) -> Result<u16, MapError> {
        self.value(key)?
            .as_u64()
            .and_then(|v| u16::try_from(v).ok())
            .ok_or_else(|| MapError::TypeMismatch {
                key: key.to_owned(),
                expected: "u16",
            })
    }

    /// Reads a required unsigned value.
    ///
    /// # Errors
    ///
    /// [`MapError::MissingKey`] or [`MapError::TypeMismatch`].
    pub fn read_u32(&self, key: &str) -> Result<u32, MapError> {
        self.value(key)?
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| MapError::TypeMismatch {
                key: key.to_owned(),
                expected: "u32",
            })
    }

    /// Reads a list node written by [`NodeWriter::write_many`]. A missing
    /// list reads as empty.
    ///
    /// # Errors
    ///
    /// [`MapError::TypeMismatch`] if the value is not an array of objects,
    /// or the first error returned by `f`.
    pub fn read_many<T>(
        &self,
        name: &str,
        mut f: impl FnMut(&NodeReader<'a>) -> Result<T, MapError>,
    ) -> Result<Vec<T>, MapError> {
        let Some(value) = self.node.get(name) else {
            return Ok(Vec::new());
        };
        let records = value.as_array().ok_or_else(|| MapError::TypeMismatch {
            key: name.to_owned(),
            expected: "array",
        })?;
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let node = record.as_object().ok_or_else(|| MapError::TypeMismatch {
                key: name.to_owned(),
                expected: "array of objects",
            })?;
            out.push(f(&Self { node })?);
        }
        Ok(out)
    }
}
