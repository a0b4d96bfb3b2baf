//! position of the expander within a play
use crate::error::ExpandError;
use crate::function::FunctionTable;

/// How many calls may be nested inside each other before we give up
///
/// Only reachable through (mutually) recursive functions.
pub const MAX_CALL_DEPTH: usize = 64;

/// Immutable breadcrumb passed down while expanding tasks
///
/// Every step into a sequence index or a nested section creates a new context via [Context::nest],
/// so the path of a call site is unique within its play.
#[derive(Debug, Clone)]
pub struct Context<'f> {
    functions: &'f FunctionTable,
    path: Vec<String>,
    depth: usize,
}

impl<'f> Context<'f> {
    /// Root context of a play section
    pub fn new(functions: &'f FunctionTable) -> Self {
        Self {
            functions,
            path: vec![],
            depth: 0,
        }
    }

    pub fn nest(&self, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());

        Self {
            functions: self.functions,
            path,
            depth: self.depth,
        }
    }

    /// Context for the body of a call to `function`
    pub fn enter_call(&self, function: &str) -> Result<Self, ExpandError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(ExpandError::CallDepthExceeded {
                function: function.to_string(),
                path: self.location(),
                limit: MAX_CALL_DEPTH,
            });
        }

        Ok(Self {
            depth: self.depth + 1,
            ..self.clone()
        })
    }

    pub fn functions(&self) -> &'f FunctionTable {
        self.functions
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Name for the variable `name` that is unique to the current position
    ///
    /// `name` at `0 / block / 1` becomes `name_0_block_1`.
    pub fn unique_name(&self, name: &str) -> String {
        let mut unique = String::from(name);
        for segment in &self.path {
            unique.push('_');
            unique.push_str(segment);
        }
        unique
    }

    /// Human readable position, used in error messages
    pub fn location(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }

        self.path.join("/")
    }
}

impl std::fmt::Display for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.location())
    }
}
