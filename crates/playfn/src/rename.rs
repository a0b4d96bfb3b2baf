//! rewriting of variable references inside template expressions
use crate::visit::{VisitMut, VisitStringsMut};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Original variable name -> replacement name
pub type RenameMap = indexmap::IndexMap<String, String>;

// `{{ expression }}` interpolations and `{% statement %}` tags, possibly spanning lines
#[allow(clippy::expect_used)]
static TEMPLATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{.+?\}\}|\{%.+?%\}").expect("constant regex pattern is valid")
});

// Quoted string literals are matched first so their contents are skipped. Word tokens carry an
// optional preceding `.` to tell attribute access apart from variables.
#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|(\.\s*)?(\w+)"#)
        .expect("constant regex pattern is valid")
});

/// Rewrites references to renamed variables in every string it visits
///
/// Only the inside of template expressions is touched. `Hello name, {{ name }}` with
/// `name -> name_0` becomes `Hello name, {{ name_0 }}`.
#[derive(derive_new::new)]
pub struct ArgumentRenamer<'r> {
    renames: &'r RenameMap,
}

impl<'r> VisitMut<String> for ArgumentRenamer<'r> {
    fn visit_mut(&mut self, value: &mut String) {
        if self.renames.is_empty() {
            return;
        }

        let rewritten = TEMPLATE_PATTERN.replace_all(value, |caps: &Captures| {
            rename_in_expression(&caps[0], self.renames)
        });

        let Cow::Owned(rewritten) = rewritten else {
            return;
        };

        if rewritten != *value {
            tracing::trace!(from = %value, to = %rewritten, "renamed variables");
            *value = rewritten;
        }
    }
}

/// Rename variables in all strings below `node`
pub(crate) fn rename_variables(node: &mut impl VisitStringsMut, renames: &RenameMap) {
    node.visit_strings_mut(&mut ArgumentRenamer::new(renames));
}

/// Replace whole-token occurrences of renamed variables in a single template expression
///
/// `hostname` is not a reference to `name`, `item.name` is an attribute, not a variable, and
/// `'name'` is string data.
pub fn rename_in_expression(expression: &str, renames: &RenameMap) -> String {
    TOKEN_PATTERN
        .replace_all(expression, |caps: &Captures| {
            let Some(token) = caps.get(2) else {
                return caps[0].to_string();
            };
            if caps.get(1).is_some() {
                return caps[0].to_string();
            }

            renames
                .get(token.as_str())
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
