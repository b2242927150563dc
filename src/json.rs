//! JSON encoding of node trees
//!
//! Extended types encode through their codec (date-times as RFC 3339 text,
//! byte blobs as base64); decoding goes through the ordinary write path, so
//! text for an extended field is decoded and checked like any other input.

use crate::error::SchemaResult;
use crate::schema::SchemaKind;
use crate::tree::{NodeId, NodeRef, Tree};
use crate::value::Value;
use serde::ser::{Error as _, Serialize, Serializer};

/// Encode the visible part of a node as JSON.
pub fn to_json(tree: &Tree, id: NodeId) -> SchemaResult<serde_json::Value> {
    let schema = tree.schema(id)?;
    if let SchemaKind::Extend(codec) = schema.kind() {
        return codec.encode(&tree.value(id)).map_err(|e| e.at(tree.path_name(id)));
    }
    match schema.kind() {
        SchemaKind::Object(_) => {
            let mut map = serde_json::Map::new();
            for key in tree.keys(id) {
                let child = tree.field(id, &key)?;
                map.insert(key, to_json(tree, child)?);
            }
            Ok(serde_json::Value::Object(map))
        }
        SchemaKind::List { .. } | SchemaKind::Tuple(_) => {
            if tree.value(id).is_null() {
                return Ok(serde_json::Value::Null);
            }
            tree.children(id)
                .into_iter()
                .map(|child| to_json(tree, child))
                .collect::<SchemaResult<Vec<_>>>()
                .map(serde_json::Value::Array)
        }
        _ => Ok(tree.value(id).to_json()),
    }
}

pub fn to_string(tree: &Tree, id: NodeId) -> SchemaResult<String> {
    Ok(serde_json::to_string(&to_json(tree, id)?)?)
}

pub fn to_string_pretty(tree: &Tree, id: NodeId) -> SchemaResult<String> {
    Ok(serde_json::to_string_pretty(&to_json(tree, id)?)?)
}

/// Set a node from JSON. Returns whether the committed value changed.
pub fn from_json(tree: &mut Tree, id: NodeId, json: &serde_json::Value) -> SchemaResult<bool> {
    tree.set(id, Value::from_json(json))
}

pub fn from_str(tree: &mut Tree, id: NodeId, text: &str) -> SchemaResult<bool> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    from_json(tree, id, &json)
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_json(self.tree(), self.id())
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}
