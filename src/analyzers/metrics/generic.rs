//! Heuristic backend for languages without a grammar, markup and data files.
//!
//! Functions are found by header patterns and delimited by braces, or by
//! indentation when the header opens no brace. Nesting is measured from
//! indentation relative to the function header. Markup and stylesheets have
//! no functions; their nesting is measured across the whole document.

use once_cell::sync::Lazy;
use regex::Regex;

use super::smells::{SmellCollector, SmellKind};
use super::{BlockMetrics, FileText, FunctionFacts, Halstead};
use crate::config::StaticThresholds;
use crate::core::CommentSyntax;

/// Spaces a tab counts for when measuring indentation.
const TAB_WIDTH: usize = 4;

static FUNCTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        \b(?:fun|func|def|function|fn|sub)\b\s*[\w$.<>]*\s*\(
        | =>\s*\{\s*$
        | ^\s*(?:(?:public|private|protected|internal|static|final|override|open|async|suspend|inline|abstract|virtual)\s+)*
          [\w<>\[\]?,]+\s+\w+\s*\([^;]*\)\s*(?::\s*[\w<>\[\]?]+\s*)?\{\s*$",
    )
    .expect("valid regex")
});

/// Class-like declarations whose primary constructor reads like a function header.
static TYPE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[\w@]+\s+)*(?:class|object|struct|interface|trait|enum|record)\s+\w")
        .expect("valid regex")
});

static CONTROL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\}\s*)?(?:if|else|for|foreach|while|switch|when|catch|do|try|guard|match)\b")
        .expect("valid regex")
});

static BRANCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|elif|elsif|elseif|for|foreach|while|until|case|catch|except|when|guard|unless)\b|&&|\|\|")
        .expect("valid regex")
});

static CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:if|elif|elsif|while|until|when|guard|unless)\b").expect("valid regex")
});

static LOGICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&&|\|\||\band\b|\bor\b").expect("valid regex"));

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Za-z_$][\w$]*|\d[\w.]*|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[^\s\w]"#)
        .expect("valid regex")
});

pub(super) fn analyze(
    input: &FileText<'_>,
    thresholds: &StaticThresholds,
    minified: bool,
    smells: &mut SmellCollector,
) -> BlockMetrics {
    let lines = classify_lines(&input.lines, input.language.comment_syntax());
    let mut metrics = BlockMetrics {
        comment_lines: lines.iter().filter(|l| l.comment).count(),
        logical_lines: lines.iter().filter(|l| l.is_logical()).count(),
        halstead_volume: halstead_volume(&lines),
        ..BlockMetrics::default()
    };

    if minified {
        return metrics;
    }

    for (idx, line) in lines.iter().enumerate() {
        if CONDITION.is_match(&line.code)
            && LOGICAL.find_iter(&line.code).count() >= thresholds.max_boolean_operators
        {
            metrics.complex_conditionals += 1;
            smells.record(SmellKind::ComplexConditional, idx as u32 + 1, input.lines[idx]);
        }
    }

    let unit = indent_unit(&lines);
    if !input.language.is_source() {
        let (nesting, deep_line) = document_nesting(&lines, unit, thresholds.max_nesting);
        if nesting >= thresholds.max_nesting {
            metrics.deeply_nested_functions += 1;
            let line = deep_line.unwrap_or(1);
            smells.record(SmellKind::DeepNesting, line, input.line(line));
        }
        return metrics;
    }

    let spans = find_functions(&lines, input.language.uses_indentation_blocks());
    let mut owner: Vec<Option<usize>> = vec![None; lines.len()];
    for (id, span) in spans.iter().enumerate() {
        for slot in &mut owner[span.start..=span.end] {
            *slot = Some(id);
        }
    }

    for (id, span) in spans.iter().enumerate() {
        let decisions: usize = owned_rows(&owner, span, id)
            .map(|row| BRANCH.find_iter(&lines[row].code).count())
            .sum();
        let (nesting, deep_line) = nesting_depth(
            &lines,
            owned_rows(&owner, span, id),
            span,
            unit,
            thresholds.max_nesting,
        );

        let facts = FunctionFacts {
            start_line: span.start as u32 + 1,
            complexity: 1 + decisions as u32,
            nesting,
            deep_line,
            logical_lines: lines[span.start..=span.end]
                .iter()
                .filter(|l| l.is_logical())
                .count(),
            parameter_count: count_parameters(&lines[span.start].code),
        };
        metrics.add_function(&facts, thresholds, input, smells);
    }

    metrics.module_complexity = lines
        .iter()
        .zip(&owner)
        .filter(|(_, owner)| owner.is_none())
        .map(|(line, _)| BRANCH.find_iter(&line.code).count() as u32)
        .sum();

    metrics
}

/// One source line split into code and comment.
#[derive(Debug, Clone, Default)]
struct Line {
    /// Code with comments removed.
    code: String,
    /// The line holds a comment and no code.
    comment: bool,
    /// Leading whitespace width, tabs expanded.
    indent: usize,
}

impl Line {
    fn is_logical(&self) -> bool {
        !self.code.trim().is_empty()
    }
}

fn classify_lines(lines: &[&str], syntax: CommentSyntax) -> Vec<Line> {
    let mut open_block: Option<&'static str> = None;
    let mut out = Vec::with_capacity(lines.len());

    for raw in lines {
        let mut code = String::new();
        let mut saw_comment = false;
        let mut rest: &str = raw;

        loop {
            if let Some(close) = open_block {
                saw_comment = true;
                match rest.find(close) {
                    Some(pos) => {
                        rest = &rest[pos + close.len()..];
                        open_block = None;
                    }
                    None => break,
                }
                continue;
            }

            let line_start = syntax
                .line
                .iter()
                .filter_map(|token| rest.find(token))
                .min();
            let block_start = syntax
                .block
                .iter()
                .filter_map(|(open, close)| rest.find(open).map(|pos| (pos, *open, *close)))
                .min_by_key(|(pos, _, _)| *pos);

            match (line_start, block_start) {
                (Some(l), Some((b, _, _))) if l < b => {
                    code.push_str(&rest[..l]);
                    saw_comment = true;
                    break;
                }
                (_, Some((b, open, close))) => {
                    code.push_str(&rest[..b]);
                    rest = &rest[b + open.len()..];
                    open_block = Some(close);
                }
                (Some(l), None) => {
                    code.push_str(&rest[..l]);
                    saw_comment = true;
                    break;
                }
                (None, None) => {
                    code.push_str(rest);
                    break;
                }
            }
        }

        let comment = saw_comment && code.trim().is_empty();
        out.push(Line {
            indent: indent_width(raw),
            code,
            comment,
        });
    }
    out
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Smallest positive indentation step between code lines, at least 2.
fn indent_unit(lines: &[Line]) -> usize {
    lines
        .iter()
        .filter(|l| l.is_logical() && l.indent > 0)
        .map(|l| l.indent)
        .min()
        .unwrap_or(TAB_WIDTH)
        .max(2)
}

fn halstead_volume(lines: &[Line]) -> f64 {
    let mut halstead = Halstead::default();
    for line in lines {
        for token in TOKEN.find_iter(&line.code) {
            let text = token.as_str();
            let first = text.chars().next().unwrap_or(' ');
            if first.is_alphanumeric() || matches!(first, '_' | '$' | '"' | '\'') {
                halstead.operand(text);
            } else {
                halstead.operator(text);
            }
        }
    }
    halstead.volume()
}

/// Inclusive line range of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

fn find_functions(lines: &[Line], indentation_blocks: bool) -> Vec<Span> {
    let mut spans = Vec::new();
    for (start, line) in lines.iter().enumerate() {
        if !FUNCTION_HEADER.is_match(&line.code)
            || CONTROL_HEADER.is_match(&line.code)
            || TYPE_DECLARATION.is_match(&line.code)
        {
            continue;
        }
        let end = if indentation_blocks {
            None
        } else {
            brace_end(lines, start)
        }
        .unwrap_or_else(|| indentation_end(lines, start));
        spans.push(Span { start, end });
    }
    spans
}

/// Rows of a span not claimed by a nested function.
fn owned_rows<'a>(owner: &'a [Option<usize>], span: &Span, id: usize) -> impl Iterator<Item = usize> + 'a {
    (span.start..=span.end).filter(move |row| owner[*row] == Some(id))
}

/// Line where the braces opened at or just after `start` balance again.
fn brace_end(lines: &[Line], start: usize) -> Option<usize> {
    let opens_here = lines[start].code.contains('{');
    let opens_next = lines
        .get(start + 1)
        .is_some_and(|l| l.code.trim_start().starts_with('{'));
    if !opens_here && !opens_next {
        return None;
    }

    let mut depth = 0i64;
    let mut opened = false;
    for (row, line) in lines.iter().enumerate().skip(start) {
        for c in line.code.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return Some(row);
        }
    }
    Some(lines.len() - 1)
}

/// Last line indented deeper than the header, plus a closing `end` line.
fn indentation_end(lines: &[Line], start: usize) -> usize {
    let header_indent = lines[start].indent;
    let mut end = start;
    for (row, line) in lines.iter().enumerate().skip(start + 1) {
        if !line.is_logical() {
            continue;
        }
        if line.indent <= header_indent {
            if line.code.trim_start().starts_with("end") {
                end = row;
            }
            break;
        }
        end = row;
    }
    end
}

fn nesting_depth(
    lines: &[Line],
    owned: impl Iterator<Item = usize>,
    span: &Span,
    unit: usize,
    threshold: u32,
) -> (u32, Option<u32>) {
    let header_indent = lines[span.start].indent;
    let mut max_depth = 0u32;
    let mut deep_line = None;
    let mut previous = span.start;

    for row in owned.filter(|row| *row != span.start) {
        let line = &lines[row];
        if !line.is_logical() {
            continue;
        }
        let levels = line.indent.saturating_sub(header_indent) / unit;
        let depth = levels.saturating_sub(1) as u32;
        max_depth = max_depth.max(depth);
        if depth >= threshold && deep_line.is_none() {
            deep_line = Some(previous as u32 + 1);
        }
        previous = row;
    }
    (max_depth, deep_line)
}

/// Deepest indentation level of a document, with column zero as the outer block.
fn document_nesting(lines: &[Line], unit: usize, threshold: u32) -> (u32, Option<u32>) {
    let mut max_depth = 0u32;
    let mut deep_line = None;
    let mut previous: Option<usize> = None;

    for (row, line) in lines.iter().enumerate() {
        if !line.is_logical() {
            continue;
        }
        let depth = (line.indent / unit).saturating_sub(1) as u32;
        max_depth = max_depth.max(depth);
        if depth >= threshold && deep_line.is_none() {
            deep_line = Some(previous.unwrap_or(row) as u32 + 1);
        }
        previous = Some(row);
    }
    (max_depth, deep_line)
}

fn count_parameters(header: &str) -> usize {
    let Some(open) = header.find('(') else {
        return 0;
    };
    let mut depth = 0usize;
    let mut count = 0usize;
    let mut current_has_content = false;
    for c in header[open + 1..].chars() {
        match c {
            '(' | '<' | '[' | '{' => {
                depth += 1;
                current_has_content = true;
            }
            ')' if depth == 0 => break,
            ')' | '>' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if current_has_content {
                    count += 1;
                }
                current_has_content = false;
            }
            c if !c.is_whitespace() => current_has_content = true,
            _ => {}
        }
    }
    if current_has_content {
        count += 1;
    }
    count
}
