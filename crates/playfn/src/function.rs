//! function declarations of a play
use crate::error::ExpandError;
use crate::node::{self, Mapping, Node, NodeExt, Sequence};

/// A named, parameterized task sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    /// Declared parameter names
    ///
    /// Informational only. Renaming is driven by the arguments given at each call site.
    pub args: Vec<String>,
    /// Task template, copied into every call site before it is expanded
    pub tasks: Sequence,
}

/// Functions declared by a single play, in declaration order
#[derive(Debug, Default)]
pub struct FunctionTable {
    functions: indexmap::IndexMap<String, Function>,
}

impl FunctionTable {
    /// Removes the `functions` keyword from `play` and parses its declarations
    ///
    /// A play without `functions` (or with `functions: ~`) yields an empty table.
    pub fn extract(play: &mut Mapping) -> Result<Self, ExpandError> {
        let mut table = Self::default();

        let Some(declarations) = play.shift_remove("functions") else {
            return Ok(table);
        };

        let declarations = match declarations {
            Node::Null => return Ok(table),
            Node::Sequence(declarations) => declarations,
            other => {
                return Err(ExpandError::FunctionsNotSequence {
                    found: other.kind(),
                })
            }
        };

        for (index, declaration) in declarations.into_iter().enumerate() {
            let mut declaration = match declaration {
                Node::Mapping(declaration) => declaration,
                other => {
                    return Err(ExpandError::FunctionNotMapping {
                        index,
                        found: other.kind(),
                    })
                }
            };

            let function = Function::from_declaration(index, &mut declaration)?;
            table.insert(function)?;
        }

        tracing::debug!(functions = ?table.names().collect::<Vec<_>>(), "function table built");
        Ok(table)
    }

    fn insert(&mut self, function: Function) -> Result<(), ExpandError> {
        if self.functions.contains_key(&function.name) {
            return Err(ExpandError::DuplicateFunction {
                name: function.name,
            });
        }

        self.functions.insert(function.name.clone(), function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Function {
    fn from_declaration(index: usize, declaration: &mut Mapping) -> Result<Self, ExpandError> {
        let Some(name) = node::field(declaration, "name").and_then(Node::as_str) else {
            return Err(ExpandError::FunctionNameMissing { index });
        };
        let name = name.to_string();

        let args = match node::field(declaration, "args") {
            None => vec![],
            Some(Node::Sequence(args)) => args
                .iter()
                .map(|arg| arg.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| ExpandError::FunctionArgsInvalid { name: name.clone() })?,
            Some(_) => return Err(ExpandError::FunctionArgsInvalid { name }),
        };

        let Some(Node::Sequence(tasks)) = declaration.shift_remove("tasks") else {
            return Err(ExpandError::FunctionTasksNotSequence { name });
        };

        Ok(Self { name, args, tasks })
    }
}
