use super::{NodeId, Tree};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::SchemaKind;
use crate::value::Value;

impl Tree {
    /// Number of positions a tuple node declares.
    pub fn arity(&self, id: NodeId) -> SchemaResult<usize> {
        match self.data(id)?.schema.kind() {
            SchemaKind::Tuple(items) => Ok(items.len()),
            _ => Err(SchemaError::type_mismatch("Must be a tuple or a Tuple", self.path_name(id))),
        }
    }

    /// Join two tuples into a new tree whose schema chains both templates.
    pub fn concat(&self, id: NodeId, other: &Tree, other_id: NodeId) -> SchemaResult<Tree> {
        let refuse = || {
            SchemaError::type_mismatch("can only concatenate Tuple to Tuple", self.path_name(id))
        };
        let (left, right) = (self.schema(id)?, other.schema(other_id)?);
        let schema = left.concat_tuple(&right).ok_or_else(refuse)?;
        let items = match (self.value(id), other.value(other_id)) {
            (Value::Tuple(mut a), Value::Tuple(b)) => {
                a.extend(b);
                a
            }
            _ => return Err(refuse()),
        };

        let mut joined = Tree::with_config(schema, self.config.clone())?;
        let root = joined.root();
        joined.set(root, Value::Tuple(items))?;
        Ok(joined)
    }
}
