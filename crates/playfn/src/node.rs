//! tree node representation
//!
//! Playbooks are handled as [serde_yaml::Value] trees. The variants we care about are
//! - mapping (order-preserving, unique keys)
//! - sequence
//! - scalar (string, number, boolean, null)
//!
//! Tagged values (`!something value`) are opaque leaves for our purposes, except that the
//! strings inside of them are still visited when renaming.

pub type Node = serde_yaml::Value;
pub type Mapping = serde_yaml::Mapping;
pub type Sequence = serde_yaml::Sequence;

/// The closed set of node shapes the expander distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Mapping => f.write_str("mapping"),
            NodeKind::Sequence => f.write_str("sequence"),
            NodeKind::Scalar => f.write_str("scalar"),
        }
    }
}

/// Capability checks on top of [Node]
pub trait NodeExt {
    fn kind(&self) -> NodeKind;

    fn is_scalar(&self) -> bool {
        self.kind() == NodeKind::Scalar
    }
}

impl NodeExt for Node {
    fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Null
            | Node::Bool(_)
            | Node::Number(_)
            | Node::String(_)
            | Node::Tagged(_) => NodeKind::Scalar,
        }
    }
}

/// Look up a field and treat an explicit `null` the same as a missing one
pub fn field<'n>(mapping: &'n Mapping, key: &str) -> Option<&'n Node> {
    mapping.get(key).filter(|node| !node.is_null())
}

/// Mutable variant of [field]
pub fn field_mut<'n>(mapping: &'n mut Mapping, key: &str) -> Option<&'n mut Node> {
    mapping.get_mut(key).filter(|node| !node.is_null())
}
