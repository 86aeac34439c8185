//! Grammar-aware backend.
//!
//! Cyclomatic complexity is 1 plus the decision points of a function body,
//! where decision points are the language's branch nodes plus each `&&`,
//! `||`, `and`, `or` token. Nested functions are measured on their own and do
//! not count toward their parent.

use std::collections::BTreeMap;

use tree_sitter::Node;

use super::smells::{SmellCollector, SmellKind};
use super::{BlockMetrics, FileText, FunctionFacts, Halstead};
use crate::config::StaticThresholds;
use crate::parser::queries::{
    get_decision_node_types, get_function_node_types, get_nesting_node_types, is_comment_node,
    is_identifier_node, is_logical_operator, ALLOWED_SHORT_IDENTIFIERS, UNINFORMATIVE_IDENTIFIERS,
};
use crate::parser::{extract_functions, ParseResult};

pub(super) fn analyze(
    result: &ParseResult,
    input: &FileText<'_>,
    thresholds: &StaticThresholds,
    smells: &mut SmellCollector,
) -> BlockMetrics {
    let lang = result.language;
    let function_types = get_function_node_types(lang);
    let decision_types = get_decision_node_types(lang);
    let nesting_types = get_nesting_node_types(lang);
    let root = result.root_node();

    let mut metrics = BlockMetrics::default();
    let scan = scan_tree(root, result, input, thresholds, smells);

    let comment_lines = scan.comment_lines.iter().filter(|c| **c).count();
    let logical: Vec<bool> = input
        .lines
        .iter()
        .zip(&scan.comment_lines)
        .map(|(line, comment)| !line.trim().is_empty() && !comment)
        .collect();
    metrics.comment_lines = comment_lines;
    metrics.logical_lines = logical.iter().filter(|l| **l).count();
    metrics.halstead_volume = scan.halstead.volume();
    metrics.complex_conditionals = scan.complex_conditionals;

    if scan.uninformative.len() >= thresholds.uninformative_identifier_limit {
        metrics.uninformative_identifiers = scan.uninformative.len();
        let mut first_seen: Vec<(u32, &String)> =
            scan.uninformative.iter().map(|(name, line)| (*line, name)).collect();
        first_seen.sort();
        for (line, _) in first_seen {
            smells.record(SmellKind::UninformativeIdentifier, line, input.line(line));
        }
    }

    for function in extract_functions(result) {
        let body = function.body();
        let (nesting, deep_line) = max_nesting(body, nesting_types, function_types, thresholds.max_nesting);
        let first = function.start_line as usize - 1;
        let last = (function.end_line as usize).min(logical.len());
        let logical_lines = logical
            .get(first..last)
            .map_or(0, |rows| rows.iter().filter(|l| **l).count());

        let facts = FunctionFacts {
            start_line: function.start_line,
            complexity: 1 + count_decision_points(body, decision_types, function_types),
            nesting,
            deep_line,
            logical_lines,
            parameter_count: function.parameter_count,
        };
        metrics.add_function(&facts, thresholds, input, smells);
    }
    metrics.module_complexity = count_decision_points(root, decision_types, function_types);

    metrics
}

/// File-wide facts gathered in one pass over the tree.
struct TreeScan {
    comment_lines: Vec<bool>,
    halstead: Halstead,
    complex_conditionals: usize,
    /// Distinct uninformative names with their first line.
    uninformative: BTreeMap<String, u32>,
}

fn scan_tree(
    root: Node<'_>,
    result: &ParseResult,
    input: &FileText<'_>,
    thresholds: &StaticThresholds,
    smells: &mut SmellCollector,
) -> TreeScan {
    let mut scan = TreeScan {
        comment_lines: vec![false; input.lines.len()],
        halstead: Halstead::default(),
        complex_conditionals: 0,
        uninformative: BTreeMap::new(),
    };

    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        let kind = node.kind();
        let mut descend = true;

        if is_comment_node(kind) {
            mark_comment_lines(&node, input, &mut scan.comment_lines);
            descend = false;
        } else if node.child_count() == 0 {
            if !node.is_missing() && !node.is_error() {
                if node.is_named() {
                    scan.halstead.operand(result.node_text(&node));
                } else {
                    scan.halstead.operator(kind);
                }
            }
            if node.is_named() && is_identifier_node(kind) {
                let name = result.node_text(&node).trim_start_matches('$');
                if is_uninformative(name, thresholds) && !scan.uninformative.contains_key(name) {
                    scan.uninformative
                        .insert(name.to_string(), node.start_position().row as u32 + 1);
                }
            }
        }

        if let Some(condition) = node.child_by_field_name("condition") {
            if count_logical_operators(condition) >= thresholds.max_boolean_operators {
                scan.complex_conditionals += 1;
                let line = condition.start_position().row as u32 + 1;
                smells.record(SmellKind::ComplexConditional, line, input.line(line));
            }
        }

        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return scan;
            }
        }
    }
}

/// Mark rows whose only non-whitespace content is this comment.
fn mark_comment_lines(node: &Node<'_>, input: &FileText<'_>, comment_lines: &mut [bool]) {
    let start = node.start_position();
    let end = node.end_position();
    for row in start.row..=end.row {
        let Some(line) = input.lines.get(row) else {
            break;
        };
        let clear_before = row != start.row
            || line.get(..start.column).map_or(true, |s| s.trim().is_empty());
        let clear_after =
            row != end.row || line.get(end.column..).map_or(true, |s| s.trim().is_empty());
        if clear_before && clear_after {
            comment_lines[row] = true;
        }
    }
}

fn is_uninformative(name: &str, thresholds: &StaticThresholds) -> bool {
    if name.is_empty() || ALLOWED_SHORT_IDENTIFIERS.contains(&name) {
        return false;
    }
    let lower = name.to_lowercase();
    UNINFORMATIVE_IDENTIFIERS.contains(&lower.as_str())
        || name.chars().count() < thresholds.min_identifier_length
}

fn count_logical_operators(node: Node<'_>) -> usize {
    let mut count = 0;
    let mut cursor = node.walk();
    loop {
        let current = cursor.node();
        if !current.is_named() && is_logical_operator(current.kind()) {
            count += 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return count;
            }
        }
    }
}

/// Count decision points for cyclomatic complexity.
/// Uses iterative cursor traversal for performance.
fn count_decision_points(node: Node<'_>, decision_types: &[&str], function_types: &[&str]) -> u32 {
    let mut count = 0;
    let mut cursor = node.walk();

    loop {
        let current = cursor.node();
        let kind = current.kind();
        let nested_function = cursor.depth() > 0 && function_types.contains(&kind);

        if !nested_function
            && (decision_types.contains(&kind)
                || (!current.is_named() && is_logical_operator(kind)))
        {
            count += 1;
        }

        if !nested_function && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return count;
            }
        }
    }
}

/// Calculate maximum nesting depth and the first line reaching `threshold`.
/// Uses iterative cursor traversal with depth tracking for performance.
fn max_nesting(
    node: Node<'_>,
    nesting_types: &[&str],
    function_types: &[&str],
    threshold: u32,
) -> (u32, Option<u32>) {
    let mut max_depth = 0;
    let mut deep_line = None;
    let mut cursor = node.walk();

    // Nesting depth at each cursor level
    let mut depth_at_level: Vec<u32> = vec![0; 64];

    loop {
        let current = cursor.node();
        let kind = current.kind();
        let level = cursor.depth() as usize;
        if level + 1 >= depth_at_level.len() {
            depth_at_level.resize(level + 16, 0);
        }

        let current_depth = depth_at_level[level];
        let nested_function = level > 0 && function_types.contains(&kind);
        let child_depth = if nesting_types.contains(&kind) && !is_else_if(&current) {
            let depth = current_depth + 1;
            max_depth = max_depth.max(depth);
            if depth >= threshold && deep_line.is_none() {
                deep_line = Some(current.start_position().row as u32 + 1);
            }
            depth
        } else {
            current_depth
        };
        depth_at_level[level + 1] = child_depth;

        if !nested_function && cursor.goto_first_child() {
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return (max_depth, deep_line);
            }
        }
    }
}

/// `else if` chains continue the enclosing conditional rather than nesting.
fn is_else_if(node: &Node<'_>) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    parent.kind() == "else_clause"
        || (parent.kind() == node.kind()
            && parent.child_by_field_name("alternative") == Some(*node))
}
