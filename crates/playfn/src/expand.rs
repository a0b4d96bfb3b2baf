//! inlining of function calls
use crate::context::Context;
use crate::error::ExpandError;
use crate::function::{Function, FunctionTable};
use crate::node::{self, Mapping, Node, NodeExt, Sequence};
use crate::rename::{self, RenameMap};

/// Play keywords holding task sequences
///
/// `tasks` is expanded from an empty path, the others are prefixed with their keyword.
const PLAY_SECTIONS: &[&str] = &["pre_tasks", "tasks", "post_tasks", "handlers"];

/// Task keywords holding nested task sequences
const BLOCK_SECTIONS: &[&str] = &["block", "rescue", "always"];

/// Expands all function calls of a playbook
///
/// On error `playbook` is left exactly as it was.
pub fn expand_playbook(playbook: &mut Node) -> Result<(), ExpandError> {
    let mut expanded = playbook.clone();

    match &mut expanded {
        Node::Null => {}
        Node::Sequence(plays) => {
            for (index, play) in plays.iter_mut().enumerate() {
                let found = play.kind();
                let Some(play) = play.as_mapping_mut() else {
                    return Err(ExpandError::PlayNotMapping { index, found });
                };

                expand_play(index, play)?;
            }
        }
        other => {
            return Err(ExpandError::PlaybookNotSequence {
                found: other.kind(),
            })
        }
    }

    *playbook = expanded;
    Ok(())
}

/// Expands a single play with the functions it declares
#[tracing::instrument(level = "debug", skip(play))]
pub fn expand_play(index: usize, play: &mut Mapping) -> Result<(), ExpandError> {
    let functions = FunctionTable::extract(play)?;

    for section in PLAY_SECTIONS {
        let Some(tasks) = node::field_mut(play, *section) else {
            continue;
        };

        let found = tasks.kind();
        let Some(tasks) = tasks.as_sequence_mut() else {
            return Err(ExpandError::SectionNotSequence {
                section: section.to_string(),
                found,
            });
        };

        let ctx = match *section {
            "tasks" => Context::new(&functions),
            other => Context::new(&functions).nest(other),
        };

        expand_tasks(&ctx, tasks)?;
    }

    Ok(())
}

/// Expands every task of a sequence, each at its own index
pub fn expand_tasks(ctx: &Context, tasks: &mut Sequence) -> Result<(), ExpandError> {
    for (index, task) in tasks.iter_mut().enumerate() {
        let ctx = ctx.nest(index.to_string());

        let found = task.kind();
        let Some(task) = task.as_mapping_mut() else {
            return Err(ExpandError::TaskNotMapping {
                path: ctx.location(),
                found,
            });
        };

        expand_task(&ctx, task)?;
    }

    Ok(())
}

/// Inlines a call task and descends into nested task sequences
#[tracing::instrument(level = "trace", skip_all, fields(path = %ctx))]
pub fn expand_task(ctx: &Context, task: &mut Mapping) -> Result<(), ExpandError> {
    if task.contains_key("call") && task.contains_key("block") {
        return Err(ExpandError::CallAndBlock {
            path: ctx.location(),
        });
    }

    let nested_ctx = match task.get("call") {
        Some(call) => {
            let call = CallSite::parse(ctx, call)?;
            let function = resolve(ctx, &call.function)?;
            let nested_ctx = ctx.enter_call(&function.name)?;

            inline_call(ctx, task, function, call)?;
            nested_ctx
        }
        None => ctx.clone(),
    };

    for section in BLOCK_SECTIONS {
        if let Some(Node::Sequence(tasks)) = task.get_mut(*section) {
            expand_tasks(&nested_ctx.nest(*section), tasks)?;
        }
    }

    Ok(())
}

fn resolve<'f>(ctx: &Context<'f>, name: &str) -> Result<&'f Function, ExpandError> {
    ctx.functions()
        .get(name)
        .ok_or_else(|| ExpandError::FunctionNotFound {
            function: name.to_string(),
            path: ctx.location(),
        })
}

/// Replaces the `call` of `task` with the function's tasks and binds the arguments under
/// names unique to this call site
fn inline_call(
    ctx: &Context,
    task: &mut Mapping,
    function: &Function,
    call: CallSite,
) -> Result<(), ExpandError> {
    let renames: RenameMap = call
        .args
        .iter()
        .map(|(name, _)| (name.clone(), ctx.unique_name(name)))
        .collect();

    tracing::debug!(function = %function.name, ?renames, "inlining call");

    let vars = match task.shift_remove("vars") {
        None | Some(Node::Null) => Mapping::new(),
        Some(Node::Mapping(vars)) => vars,
        Some(_) => {
            return Err(ExpandError::InvalidCall {
                path: ctx.location(),
                reason: "'vars' of a call must be a mapping",
            })
        }
    };

    task.shift_remove("call");
    task.insert("block".into(), Node::Sequence(function.tasks.clone()));
    task.insert("vars".into(), Node::Mapping(vars));

    rename::rename_variables(task, &renames);

    if let Some(Node::Mapping(vars)) = task.get_mut("vars") {
        for ((_, expression), unique) in call.args.into_iter().zip(renames.values()) {
            vars.insert(Node::String(unique.clone()), expression);
        }
    }

    Ok(())
}

/// A parsed `call: { function, args }`
#[derive(Debug)]
struct CallSite {
    function: String,
    /// Argument name -> expression as given at the call site
    args: Vec<(String, Node)>,
}

impl CallSite {
    fn parse(ctx: &Context, call: &Node) -> Result<Self, ExpandError> {
        let invalid = |reason| ExpandError::InvalidCall {
            path: ctx.location(),
            reason,
        };

        let Some(call) = call.as_mapping() else {
            return Err(invalid("'call' must be a mapping"));
        };

        let Some(function) = node::field(call, "function").and_then(Node::as_str) else {
            return Err(invalid("'call' must name a 'function'"));
        };

        let args = match node::field(call, "args") {
            None => vec![],
            Some(Node::Mapping(args)) => args
                .iter()
                .map(|(name, expression)| {
                    name.as_str()
                        .map(|name| (name.to_string(), expression.clone()))
                        .ok_or_else(|| invalid("argument names must be strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(invalid("'args' of a call must be a mapping")),
        };

        Ok(Self {
            function: function.to_string(),
            args,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::playbook;
    use pretty_assertions::assert_eq;

    fn expand(yaml: &str) -> Result<Node, ExpandError> {
        let mut playbook = playbook!(yaml).into_root();
        expand_playbook(&mut playbook).map(|_| playbook)
    }

    fn parse(yaml: &str) -> Node {
        serde_yaml::from_str(yaml).expect("yaml must parse")
    }

    #[test]
    fn greet() {
        let expanded = expand(
            r#"
            - functions:
                - name: greet
                  args: [name]
                  tasks:
                    - debug: "Hello {{name}}"
              tasks:
                - call:
                    function: greet
                    args:
                      name: World
            "#,
        )
        .unwrap();

        let expected = parse(
            r#"
            - tasks:
                - block:
                    - debug: "Hello {{name_0}}"
                  vars:
                    name_0: World
            "#,
        );

        assert_eq!(expanded, expected);
    }

    #[test]
    fn sibling_calls_get_distinct_names() {
        let expanded = expand(
            r#"
            - functions:
                - name: echo
                  args: [text]
                  tasks:
                    - debug: {msg: "{{ text }}"}
              tasks:
                - call: {function: echo, args: {text: one}}
                - call: {function: echo, args: {text: two}}
            "#,
        )
        .unwrap();

        let tasks = &expanded[0]["tasks"];
        assert_eq!(tasks[0]["vars"], parse("{text_0: one}"));
        assert_eq!(tasks[1]["vars"], parse("{text_1: two}"));
        assert_eq!(tasks[0]["block"][0]["debug"]["msg"], parse("'{{ text_0 }}'"));
        assert_eq!(tasks[1]["block"][0]["debug"]["msg"], parse("'{{ text_1 }}'"));
    }

    #[test]
    fn vars_bind_call_site_expressions() {
        let expanded = expand(
            r#"
            - functions:
                - name: install
                  args: [packages, state]
                  tasks:
                    - apt: {name: "{{ packages }}", state: "{{ state }}"}
              tasks:
                - name: install web stack
                  call:
                    function: install
                    args:
                      packages: [nginx, certbot]
                      state: "{{ desired_state | default('present') }}"
            "#,
        )
        .unwrap();

        let expected = parse(
            r#"
            - tasks:
                - name: install web stack
                  block:
                    - apt: {name: "{{ packages_0 }}", state: "{{ state_0 }}"}
                  vars:
                    packages_0: [nginx, certbot]
                    state_0: "{{ desired_state | default('present') }}"
            "#,
        );

        assert_eq!(expanded, expected);
    }

    #[test]
    fn call_task_fields_are_renamed() {
        let expanded = expand(
            r#"
            - functions:
                - name: greet
                  args: [who]
                  tasks: []
              tasks:
                - name: "greet {{ who }}"
                  when: "{{ who is defined }}"
                  call: {function: greet, args: {who: me}}
            "#,
        )
        .unwrap();

        let task = &expanded[0]["tasks"][0];
        assert_eq!(task["name"], parse("'greet {{ who_0 }}'"));
        assert_eq!(task["when"], parse("'{{ who_0 is defined }}'"));
        assert_eq!(task["vars"], parse("{who_0: me}"));
    }

    #[test]
    fn authored_vars_are_kept() {
        let expanded = expand(
            r#"
            - functions:
                - name: greet
                  args: [who]
                  tasks: []
              tasks:
                - call: {function: greet, args: {who: "{{ user }}"}}
                  vars:
                    user: admin
                    shout: "{{ who | upper }}"
            "#,
        )
        .unwrap();

        assert_eq!(
            expanded[0]["tasks"][0]["vars"],
            parse(
                r#"
                user: admin
                shout: "{{ who_0 | upper }}"
                who_0: "{{ user }}"
                "#
            )
        );
    }

    #[test]
    fn nested_blocks_and_sections() {
        let expanded = expand(
            r#"
            - functions:
                - name: echo
                  args: [text]
                  tasks:
                    - debug: {msg: "{{ text }}"}
              tasks:
                - name: guarded
                  block:
                    - call: {function: echo, args: {text: trying}}
                  rescue:
                    - call: {function: echo, args: {text: failed}}
                  always:
                    - call: {function: echo, args: {text: done}}
            "#,
        )
        .unwrap();

        let task = &expanded[0]["tasks"][0];
        assert_eq!(task["block"][0]["vars"], parse("{text_0_block_0: trying}"));
        assert_eq!(task["rescue"][0]["vars"], parse("{text_0_rescue_0: failed}"));
        assert_eq!(task["always"][0]["vars"], parse("{text_0_always_0: done}"));
    }

    #[test]
    fn other_play_sections() {
        let expanded = expand(
            r#"
            - functions:
                - name: echo
                  args: [text]
                  tasks:
                    - debug: {msg: "{{ text }}"}
              pre_tasks:
                - call: {function: echo, args: {text: before}}
              tasks:
                - call: {function: echo, args: {text: during}}
              post_tasks:
                - call: {function: echo, args: {text: after}}
              handlers:
                - name: notify me
                  call: {function: echo, args: {text: handled}}
            "#,
        )
        .unwrap();

        let play = &expanded[0];
        assert_eq!(play["pre_tasks"][0]["vars"], parse("{text_pre_tasks_0: before}"));
        assert_eq!(play["tasks"][0]["vars"], parse("{text_0: during}"));
        assert_eq!(play["post_tasks"][0]["vars"], parse("{text_post_tasks_0: after}"));
        assert_eq!(play["handlers"][0]["vars"], parse("{text_handlers_0: handled}"));
    }

    #[test]
    fn functions_calling_functions() {
        let expanded = expand(
            r#"
            - functions:
                - name: inner
                  args: [value]
                  tasks:
                    - debug: {msg: "{{ value }}"}
                - name: outer
                  args: [value]
                  tasks:
                    - call: {function: inner, args: {value: "{{ value }}-inner"}}
              tasks:
                - call: {function: outer, args: {value: first}}
                - call: {function: outer, args: {value: second}}
            "#,
        )
        .unwrap();

        let expected = parse(
            r#"
            - tasks:
                - block:
                    - block:
                        - debug: {msg: "{{ value_0_block_0 }}"}
                      vars:
                        value_0_block_0: "{{ value_0 }}-inner"
                  vars:
                    value_0: first
                - block:
                    - block:
                        - debug: {msg: "{{ value_1_block_0 }}"}
                      vars:
                        value_1_block_0: "{{ value_1 }}-inner"
                  vars:
                    value_1: second
            "#,
        );

        assert_eq!(expanded, expected);
    }

    #[test]
    fn functions_are_scoped_to_their_play() {
        let err = expand(
            r#"
            - functions:
                - name: greet
                  tasks: []
              tasks: []
            - tasks:
                - call: {function: greet}
            "#,
        )
        .unwrap_err();

        assert_eq!(
            err,
            ExpandError::FunctionNotFound {
                function: "greet".to_string(),
                path: "0".to_string(),
            }
        );
    }

    #[test]
    fn plays_without_calls_are_unchanged() {
        let source = r#"
            - hosts: all
              tasks:
                - name: leaf
                  command: uptime
                - block:
                    - debug: "{{ name }}"
                  when: "{{ name is defined }}"
            - hosts: db
            "#;

        assert_eq!(expand(source).unwrap(), parse(source));
        assert_eq!(expand("~").unwrap(), Node::Null);
    }

    #[test]
    fn unknown_function_leaves_document_untouched() {
        let mut playbook = parse(
            r#"
            - functions:
                - name: known
                  tasks: []
              tasks:
                - call: {function: known}
                - block:
                    - call: {function: unknown, args: {a: 1}}
            "#,
        );
        let before = playbook.clone();

        let err = expand_playbook(&mut playbook).unwrap_err();

        assert_eq!(
            err,
            ExpandError::FunctionNotFound {
                function: "unknown".to_string(),
                path: "1/block/0".to_string(),
            }
        );
        assert!(err.to_string().contains("'unknown'"));
        assert_eq!(playbook, before);
    }

    #[test]
    fn call_and_block_fails_before_lookup() {
        let err = expand(
            r#"
            - tasks:
                - call: {function: does_not_exist}
                  block: []
            "#,
        )
        .unwrap_err();

        assert_eq!(
            err,
            ExpandError::CallAndBlock {
                path: "0".to_string()
            }
        );
    }

    #[test]
    fn structural_errors() {
        use crate::node::NodeKind;

        assert_eq!(
            expand("{not: a playbook}").unwrap_err(),
            ExpandError::PlaybookNotSequence {
                found: NodeKind::Mapping
            }
        );
        assert_eq!(
            expand("[[nested]]").unwrap_err(),
            ExpandError::PlayNotMapping {
                index: 0,
                found: NodeKind::Sequence
            }
        );
        assert_eq!(
            expand("[{tasks: {debug: hi}}]").unwrap_err(),
            ExpandError::SectionNotSequence {
                section: "tasks".to_string(),
                found: NodeKind::Mapping
            }
        );
        assert_eq!(
            expand("[{tasks: [{debug: hi}, just_a_string]}]").unwrap_err(),
            ExpandError::TaskNotMapping {
                path: "1".to_string(),
                found: NodeKind::Scalar
            }
        );
        assert_eq!(
            expand("[{tasks: [{block: [[]]}]}]").unwrap_err(),
            ExpandError::TaskNotMapping {
                path: "0/block/0".to_string(),
                found: NodeKind::Sequence
            }
        );
    }

    #[test]
    fn invalid_calls() {
        let reason = |yaml: &str| match expand(yaml).unwrap_err() {
            ExpandError::InvalidCall { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        };

        assert_eq!(
            reason("[{tasks: [{call: greet}]}]"),
            "'call' must be a mapping"
        );
        assert_eq!(
            reason("[{tasks: [{call: {args: {}}}]}]"),
            "'call' must name a 'function'"
        );
        assert_eq!(
            reason("[{functions: [{name: f, tasks: []}], tasks: [{call: {function: f, args: [1]}}]}]"),
            "'args' of a call must be a mapping"
        );
        assert_eq!(
            reason("[{functions: [{name: f, tasks: []}], tasks: [{call: {function: f, args: {1: x}}}]}]"),
            "argument names must be strings"
        );
        assert_eq!(
            reason("[{functions: [{name: f, tasks: []}], tasks: [{call: {function: f}, vars: [x]}]}]"),
            "'vars' of a call must be a mapping"
        );
    }

    #[test]
    fn null_sections_are_skipped() {
        let expanded = expand("[{functions: ~, tasks: ~, handlers: ~}]").unwrap();
        assert_eq!(expanded, parse("[{tasks: ~, handlers: ~}]"));
    }

    #[test]
    fn runaway_recursion_is_stopped() {
        let err = expand(
            r#"
            - functions:
                - name: forever
                  args: [n]
                  tasks:
                    - call: {function: forever, args: {n: "{{ n + 1 }}"}}
              tasks:
                - call: {function: forever, args: {n: 0}}
            "#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ExpandError::CallDepthExceeded { ref function, limit, .. }
                if function == "forever" && limit == crate::context::MAX_CALL_DEPTH
        ));
    }

    #[test]
    fn repeated_calls_inside_a_function() {
        let expanded = expand(
            r#"
            - functions:
                - name: leaf
                  args: [x]
                  tasks:
                    - debug: {msg: "{{ x }}"}
                - name: twice
                  args: [x]
                  tasks:
                    - call: {function: leaf, args: {x: "{{ x }}"}}
                    - call: {function: leaf, args: {x: "{{ x }}"}}
              tasks:
                - call: {function: twice, args: {x: a}}
            "#,
        )
        .unwrap();

        let block = &expanded[0]["tasks"][0]["block"];
        assert_eq!(block[0]["vars"], parse("{x_0_block_0: '{{ x_0 }}'}"));
        assert_eq!(block[1]["vars"], parse("{x_0_block_1: '{{ x_0 }}'}"));
        assert_eq!(block[0]["block"][0]["debug"]["msg"], parse("'{{ x_0_block_0 }}'"));
        assert_eq!(block[1]["block"][0]["debug"]["msg"], parse("'{{ x_0_block_1 }}'"));
    }
}
