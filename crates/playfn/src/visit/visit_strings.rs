use super::VisitMut;
use crate::node::{Mapping, Node, Sequence};

/// Recursively visit all string scalars mutably
///
/// Mapping keys are not visited, only their values.
pub trait VisitStringsMut {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>);
}

impl VisitStringsMut for Node {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        match self {
            Node::String(string) => visitor.visit_mut(string),
            Node::Mapping(mapping) => mapping.visit_strings_mut(visitor),
            Node::Sequence(sequence) => sequence.visit_strings_mut(visitor),
            Node::Tagged(tagged) => tagged.value.visit_strings_mut(visitor),
            Node::Null | Node::Bool(_) | Node::Number(_) => {}
        }
    }
}

impl VisitStringsMut for Mapping {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        for value in self.values_mut() {
            value.visit_strings_mut(visitor);
        }
    }
}

impl VisitStringsMut for Sequence {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        for element in self.iter_mut() {
            element.visit_strings_mut(visitor);
        }
    }
}
