//! playbook document (parsed [Node] tree and path to source file)
//!
//! [Playbook] tracks
//! - the source path, if the document was loaded from a file
//! - the root node of the document
//!
//! and runs the expansion pass over it.
use crate::error::ExpandError;
use crate::function::FunctionTable;
use crate::node::{Node, NodeExt};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct Playbook {
    source: Option<PathBuf>,
    root: Node,
}

impl Playbook {
    pub fn new(root: Node, source: impl Into<Option<PathBuf>>) -> Self {
        Self {
            source: source.into(),
            root,
        }
    }

    /// Parses a playbook from yaml text
    ///
    /// An empty document is an empty playbook.
    pub fn parse(text: &str, source: impl Into<Option<PathBuf>>) -> Result<Self, LoadError> {
        let root = if text.trim().is_empty() {
            Node::Null
        } else {
            serde_yaml::from_str(text)?
        };

        Ok(Self::new(root, source))
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Inlines all function calls
    ///
    /// The playbook is unchanged when an error is returned.
    pub fn expand(&mut self) -> Result<(), ExpandError> {
        crate::expand::expand_playbook(&mut self.root)
    }

    /// Function tables of every play, without modifying the playbook
    pub fn function_tables(&self) -> Result<Vec<FunctionTable>, ExpandError> {
        let Some(plays) = self.root.as_sequence() else {
            if self.root.is_null() {
                return Ok(vec![]);
            }

            return Err(ExpandError::PlaybookNotSequence {
                found: self.root.kind(),
            });
        };

        plays
            .iter()
            .enumerate()
            .map(|(index, play)| {
                let Some(play) = play.as_mapping() else {
                    return Err(ExpandError::PlayNotMapping {
                        index,
                        found: play.kind(),
                    });
                };

                FunctionTable::extract(&mut play.clone())
            })
            .collect()
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.root)
    }
}

impl Playbook {
    pub fn load_file(file_path: &Path) -> Result<Self, LoadError> {
        let file_path = file_path.canonicalize()?;
        tracing::info!(path=%file_path.display(), "loading file");

        let file_contents = std::fs::read_to_string(&file_path)?;
        Self::parse(&file_contents, Some(file_path))
    }

    pub fn load_reader(reader: impl std::io::Read) -> Result<Self, LoadError> {
        let text = std::io::read_to_string(reader)?;
        Self::parse(&text, None)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse yaml document")]
    YamlParseFailed(#[from] serde_yaml::Error),
}

impl From<Node> for Playbook {
    fn from(value: Node) -> Self {
        Playbook::new(value, None)
    }
}

/// Utility macro to create a [Playbook] from yaml text
///
/// ```
/// # use playfn::playbook;
/// let playbook = playbook!("[{hosts: all, tasks: []}]");
/// assert!(playbook.root().is_sequence());
/// ```
///
/// With a source path
/// ```
/// # use playfn::playbook;
/// let playbook = playbook!("site.yml" => "[]");
/// assert_eq!(playbook.source(), Some(std::path::Path::new("site.yml")));
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use playfn::playbook;
/// playbook!("not: [valid");
/// ```
#[macro_export]
macro_rules! playbook {
    { $text:expr } => {
        $crate::playbook::Playbook::parse($text, None).expect("playbook must parse")
    };
    { $source:expr => $text:expr } => {
        $crate::playbook::Playbook::parse($text, Some(std::path::PathBuf::from($source)))
            .expect("playbook must parse")
    };
}
