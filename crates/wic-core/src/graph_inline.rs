//! The compiled-graph inliner: splices each compiled subgraph into its
//! parent graph post-order, rewriting cross-step references and
//! propagating scatter annotations. Spec.md §4.7.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_yaml::Value;
use wic_types::{Diagnostics, Warning};

use crate::graph::{binding_source, with_rewritten_source, CompiledGraph, GraphOutput, GraphStep, RoseTree};
use crate::ident::move_slash_last;

/// Matches a CWL-style `[inputs.<name>]` expression fragment, used to
/// detect when a substituted binding references a formal input that must
/// be promoted into the sub-step's own inputs (and scatter list).
static INPUTS_EXPR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[inputs\.([A-Za-z0-9_]+)\]").expect("valid regex"));

/// Recursively flattens `tree` into a single-node rose tree (depth ≤ 1)
/// whose root graph contains every descendant's steps in one namespace.
/// Recurses into children first (post-order), then splices each child's
/// already-flattened graph into the parent. Pushes a non-fatal
/// [`Warning::PartialInline`] if the count of actually-inlined subgraphs
/// does not match the number of child rose trees.
pub fn inline_compiled_graph(tree: RoseTree, diagnostics: &mut Diagnostics) -> RoseTree {
    if tree.children.is_empty() {
        return tree;
    }

    let inlined_children: Vec<RoseTree> = tree
        .children
        .into_iter()
        .map(|child| inline_compiled_graph(child, diagnostics))
        .collect();

    let mut graph = tree.graph;
    let step_keys: Vec<String> = graph.steps.keys().cloned().collect();
    let subgraphs: IndexMap<String, CompiledGraph> = inlined_children
        .iter()
        .map(|child| (child.namespaces.last().cloned().unwrap_or_default(), child.graph.clone()))
        .collect();

    let mut new_steps: IndexMap<String, GraphStep> = IndexMap::new();
    let mut inlined_count = 0usize;

    for step_key in &step_keys {
        let Some(sub_graph) = subgraphs.get(step_key) else {
            let step = graph.steps.shift_remove(step_key).expect("step_key came from graph.steps");
            new_steps.insert(step_key.clone(), step);
            continue;
        };
        inlined_count += 1;
        let parent_step = graph.steps.get(step_key).expect("step_key came from graph.steps").clone();

        for (sub_name, sub_step) in sub_graph.steps.iter() {
            let mut sub_step = sub_step.clone();
            let mut new_inputs: IndexMap<String, Value> = IndexMap::new();

            for (port, binding) in sub_step.inputs.iter() {
                let original_source = binding_source(binding);

                let mut new_binding = match binding {
                    Value::String(s) => Value::String(format!("{step_key}___{}", move_slash_last(s))),
                    _ => match original_source.as_deref() {
                        Some(s) => with_rewritten_source(binding, format!("{step_key}___{}", move_slash_last(s))),
                        None => binding.clone(),
                    },
                };

                if let Some(source) = &original_source {
                    if let Some(parent_binding) = parent_step.inputs.get(source) {
                        let parent_source = binding_source(parent_binding).unwrap_or_default();
                        new_binding = with_rewritten_source(parent_binding, move_slash_last(&parent_source));

                        if let Value::String(rendered) = &new_binding {
                            if let Some(caps) = INPUTS_EXPR.captures(rendered) {
                                let input_name = caps[1].to_string();
                                if let Some(promoted) = parent_step.inputs.get(&input_name) {
                                    new_inputs.insert(input_name.clone(), promoted.clone());
                                    if parent_step.scatter.contains(&input_name)
                                        && !sub_step.scatter.contains(&input_name)
                                    {
                                        sub_step.scatter.push(input_name);
                                    }
                                }
                            }
                        }
                    }
                }

                let references_cross_step = match &new_binding {
                    Value::String(s) => s.contains('/'),
                    _ => binding_source(&new_binding).map(|s| s.contains('/')).unwrap_or(false),
                };
                if !parent_step.scatter.is_empty() && references_cross_step {
                    if !sub_step.scatter.contains(port) {
                        sub_step.scatter.push(port.clone());
                    }
                    sub_step.scatter_method = Some("dotproduct".to_string());
                }

                new_inputs.insert(port.clone(), new_binding);
            }

            sub_step.inputs = new_inputs;
            if let Some(stripped) = sub_step.run.strip_prefix("../") {
                sub_step.run = stripped.to_string();
            }

            new_steps.insert(format!("{step_key}___{sub_name}"), sub_step);
        }
    }

    if inlined_count != subgraphs.len() {
        diagnostics.push(Warning::PartialInline {
            expected: subgraphs.len(),
            found: inlined_count,
        });
    }

    graph.steps = new_steps;

    let mut new_outputs = IndexMap::new();
    for (name, output) in graph.outputs {
        if name.contains("output_all") {
            diagnostics.push(Warning::OutputAllDropped { name });
            continue;
        }
        new_outputs.insert(
            name,
            GraphOutput {
                output_source: move_slash_last(&output.output_source),
            },
        );
    }
    graph.outputs = new_outputs;

    RoseTree {
        namespaces: tree.namespaces,
        graph,
        children: Vec::new(),
    }
}
