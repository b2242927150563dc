use crate::tree::NodeRef;
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Decision function for a right: `(right_name, root, other)`.
///
/// Returning `None` leaves the decision to the parent node.
pub type RightFn =
    Arc<dyn Fn(&str, &NodeRef<'_>, Option<&Value>) -> Option<bool> + Send + Sync>;

/// A single declared right
#[derive(Clone)]
pub enum Right {
    Flag(bool),
    Func(RightFn),
}

impl Right {
    /// Evaluate the right. Only literal booleans or a function answer count;
    /// anything else is inconclusive.
    pub fn evaluate(&self, name: &str, root: &NodeRef<'_>, other: Option<&Value>) -> Option<bool> {
        match self {
            Right::Flag(flag) => Some(*flag),
            Right::Func(f) => f(name, root, other),
        }
    }

    /// The right only when it is a literal boolean
    pub fn strict(&self) -> Option<bool> {
        match self {
            Right::Flag(flag) => Some(*flag),
            Right::Func(_) => None,
        }
    }
}

impl fmt::Debug for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Right::Flag(flag) => write!(f, "Flag({flag})"),
            Right::Func(_) => write!(f, "Func(..)"),
        }
    }
}

impl From<bool> for Right {
    fn from(flag: bool) -> Self {
        Right::Flag(flag)
    }
}

/// Rights declared on one schema node, by right name
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    rights: BTreeMap<String, Right>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a right, replacing any previous entry with the same name.
    pub fn set<N: Into<String>>(&mut self, name: N, right: Right) {
        self.rights.insert(name.into(), right);
    }

    pub fn get(&self, name: &str) -> Option<&Right> {
        self.rights.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rights.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rights.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Right)> {
        self.rights.iter().map(|(name, right)| (name.as_str(), right))
    }
}
