//! structural errors raised while expanding a playbook

use crate::node::NodeKind;

/// Everything that can abort an expansion pass
///
/// `path` fields hold the location of the offending task as rendered by
/// [crate::context::Context::location].
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExpandError {
    #[error("playbook must be a sequence of plays, found a {found}")]
    PlaybookNotSequence { found: NodeKind },
    #[error("play #{index} must be a mapping, found a {found}")]
    PlayNotMapping { index: usize, found: NodeKind },

    #[error("'functions' play keyword must be a sequence, found a {found}")]
    FunctionsNotSequence { found: NodeKind },
    #[error("function #{index} must be a mapping, found a {found}")]
    FunctionNotMapping { index: usize, found: NodeKind },
    #[error("function #{index} must have a string 'name'")]
    FunctionNameMissing { index: usize },
    #[error("function '{name}' should have a sequence of 'tasks'")]
    FunctionTasksNotSequence { name: String },
    #[error("function '{name}' must declare 'args' as a sequence of strings")]
    FunctionArgsInvalid { name: String },
    #[error("function '{name}' is declared more than once")]
    DuplicateFunction { name: String },

    #[error("'{section}' play keyword must be a sequence, found a {found}")]
    SectionNotSequence { section: String, found: NodeKind },
    #[error("task at {path} must be a mapping, found a {found}")]
    TaskNotMapping { path: String, found: NodeKind },
    #[error("task at {path} couldn't be a call and a block at the same time")]
    CallAndBlock { path: String },
    #[error("invalid call at {path}: {reason}")]
    InvalidCall { path: String, reason: &'static str },
    #[error("function '{function}' not found (called at {path})")]
    FunctionNotFound { function: String, path: String },
    #[error("calls nested deeper than {limit} levels while expanding '{function}' at {path}")]
    CallDepthExceeded {
        function: String,
        path: String,
        limit: usize,
    },
}
