//! # playfn - functions for automation playbooks
//!
//! `playfn` adds reusable, parameterized task sequences ("functions") to YAML playbooks and
//! renders them into plain playbooks that any executor understands.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `playfn` works internally.
//!
//! ### Playbook terms
//!
//! - a playbook is a sequence of `plays`
//! - a play is a mapping which may declare `functions` and carries `tasks`
//! - a task is a mapping that is either
//!   - a `call` (invoke a function with arguments)
//!   - a `block` (a nested sequence of tasks)
//!   - or anything else, which we don't look into
//!
//! ```yaml
//! - hosts: all
//!   functions:
//!     - name: greet
//!       args: [name]
//!       tasks:
//!         - debug:
//!             msg: "Hello {{ name }}"
//!   tasks:
//!     - call:
//!         function: greet
//!         args:
//!           name: World
//! ```
//!
//! ### Loading
//!
//! A playbook is parsed into a [serde_yaml::Value] tree ([node::Node]) by [playbook::Playbook].
//! At this point the document only has to be valid YAML.
//!
//! ### Function tables
//!
//! see [function::FunctionTable::extract]
//!
//! Each play is handled on its own. The `functions` keyword is removed from the play and
//! turned into a table of [function::Function]s. Nothing declared in one play is visible in another.
//!
//! ### Expansion
//!
//! see [expand::expand_playbook]
//!
//! Task sequences are walked depth first. Every `call` task is rewritten in place into a `block`
//! holding a fresh copy of the function's tasks plus `vars` binding the call's arguments.
//!
//! Arguments are renamed so that nested and sibling calls never see each other's variables. The
//! new name is the argument name followed by the position of the call site
//! ([context::Context::unique_name]):
//!
//! | **call site**                 | **argument** | **renamed to**         |
//! |-------------------------------|--------------|------------------------|
//! | `tasks[0]`                    | `name`       | `name_0`               |
//! | `tasks[2].block[1]`           | `name`       | `name_2_block_1`       |
//! | `pre_tasks[0]`                | `name`       | `name_pre_tasks_0`     |
//!
//! References inside template expressions (`{{ name }}`) of the inlined tasks are rewritten by
//! [rename::ArgumentRenamer]. The rendered example above becomes:
//!
//! ```yaml
//! - hosts: all
//!   tasks:
//!     - block:
//!         - debug:
//!             msg: "Hello {{ name_0 }}"
//!       vars:
//!         name_0: World
//! ```
//!
//! ### Output
//!
//! The expanded tree is serialized again with [serde_yaml] (or `serde_json` from the cli).
//!
pub mod context;
pub mod error;
pub mod expand;
pub mod function;
pub mod node;
pub mod playbook;
pub mod rename;
mod visit;

pub use error::ExpandError;
pub use expand::expand_playbook;
