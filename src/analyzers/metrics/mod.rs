//! Static analyzer - complexity, maintainability and smell metrics per file.
//!
//! Files with a tree-sitter grammar go through the structured backend; all
//! other recognized files, minified files and files whose parse is mostly
//! errors go through the generic line/token heuristics.
//!
//! # Maintainability index
//!
//! MI = clamp((171 - 5.2 ln V - 0.23 G - 16.2 ln L + 50 sin(sqrt(2.46 rad(C)))) * 100 / 171, 0, 100)
//!
//! where V is the Halstead volume, G the total cyclomatic complexity, L the
//! logical line count and C the comment percentage. Files with no volume or no
//! logical lines score 100.

mod generic;
mod minified;
mod smells;
mod structured;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::StaticThresholds;
use crate::core::{
    AnalysisContext, Analyzer as AnalyzerTrait, Backend, Error, FileKey, Language, Result,
    SourceFile,
};
use crate::parser::Parser;

pub use minified::is_minified_candidate;
pub use smells::{snippet, SmellKind, SmellSample, SNIPPET_LEN};

use smells::{scan_long_lines, SmellCollector};

/// Which backend produced the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Grammar-aware analysis.
    Structured,
    /// Line and token heuristics for languages without a grammar.
    Generic,
    /// Heuristics after the structured parse failed or was mostly errors.
    Fallback,
}

/// Static metrics for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityStats {
    pub language: Language,
    pub mode: AnalysisMode,
    pub function_count: usize,
    pub avg_complexity: f64,
    pub max_complexity: f64,
    /// Sum of function complexities plus decisions outside functions.
    pub total_complexity: u32,
    pub maintainability_index: f64,
    pub lines_of_code: usize,
    pub logical_lines: usize,
    pub comment_lines: usize,
    /// Comment lines over total lines, in [0, 1].
    pub comment_density: f64,
    /// Weighted count of active smell flags, in [0, 1].
    pub smell_score: f64,
    pub smell_flags: BTreeSet<SmellKind>,
    pub smell_samples: Vec<SmellSample>,
    pub longest_line: usize,
    pub long_line_count: usize,
    pub long_function_count: usize,
    pub high_complexity_blocks: usize,
    pub deeply_nested_functions: usize,
    pub long_parameter_functions: usize,
    pub complex_conditionals: usize,
    pub uninformative_identifiers: usize,
    pub is_minified_candidate: bool,
}

impl ComplexityStats {
    /// First recorded sample of a smell kind.
    pub fn first_sample(&self, kind: SmellKind) -> Option<&SmellSample> {
        self.smell_samples.iter().find(|s| s.kind == kind)
    }
}

/// Compute the maintainability index.
pub fn maintainability_index(volume: f64, complexity: u32, sloc: usize, comment_ratio: f64) -> f64 {
    if volume <= 0.0 || sloc == 0 {
        return 100.0;
    }
    let comment_percent = comment_ratio.clamp(0.0, 1.0) * 100.0;
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * f64::from(complexity) - 16.2 * (sloc as f64).ln()
        + 50.0 * (2.46 * comment_percent.to_radians()).sqrt().sin();
    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}

/// Text of one file prepared for a backend.
pub(crate) struct FileText<'a> {
    pub language: Language,
    pub lines: Vec<&'a str>,
}

impl FileText<'_> {
    /// Source line by 1-indexed number.
    pub fn line(&self, line: u32) -> &str {
        (line as usize)
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .copied()
            .unwrap_or("")
    }
}

/// Per-function facts measured by a backend.
pub(crate) struct FunctionFacts {
    pub start_line: u32,
    pub complexity: u32,
    pub nesting: u32,
    /// First line where nesting reaches the threshold.
    pub deep_line: Option<u32>,
    pub logical_lines: usize,
    pub parameter_count: usize,
}

/// Backend output before file-level aggregation.
#[derive(Debug, Default)]
pub(crate) struct BlockMetrics {
    pub function_complexities: Vec<u32>,
    /// Decision points outside any function.
    pub module_complexity: u32,
    pub comment_lines: usize,
    pub logical_lines: usize,
    pub halstead_volume: f64,
    pub long_function_count: usize,
    pub high_complexity_blocks: usize,
    pub deeply_nested_functions: usize,
    pub long_parameter_functions: usize,
    pub complex_conditionals: usize,
    pub uninformative_identifiers: usize,
}

impl BlockMetrics {
    /// Record one function and the smells it triggers.
    pub fn add_function(
        &mut self,
        facts: &FunctionFacts,
        thresholds: &StaticThresholds,
        input: &FileText<'_>,
        smells: &mut SmellCollector,
    ) {
        self.function_complexities.push(facts.complexity);
        let header = input.line(facts.start_line);

        if facts.complexity >= thresholds.high_complexity {
            self.high_complexity_blocks += 1;
            smells.record(SmellKind::HighComplexity, facts.start_line, header);
        }
        if facts.nesting >= thresholds.max_nesting {
            self.deeply_nested_functions += 1;
            let line = facts.deep_line.unwrap_or(facts.start_line);
            smells.record(SmellKind::DeepNesting, line, input.line(line));
        }
        if facts.logical_lines >= thresholds.long_function_lines {
            self.long_function_count += 1;
            smells.record(SmellKind::LongFunction, facts.start_line, header);
        }
        if facts.parameter_count > thresholds.max_parameters {
            self.long_parameter_functions += 1;
            smells.record(SmellKind::LongParameterList, facts.start_line, header);
        }
    }
}

/// Distinct-token counter for the Halstead volume.
#[derive(Debug, Default)]
pub(crate) struct Halstead {
    operators: HashSet<String>,
    operands: HashSet<String>,
    total: usize,
}

impl Halstead {
    pub fn operator(&mut self, token: &str) {
        self.total += 1;
        if !self.operators.contains(token) {
            self.operators.insert(token.to_string());
        }
    }

    pub fn operand(&mut self, token: &str) {
        self.total += 1;
        if !self.operands.contains(token) {
            self.operands.insert(token.to_string());
        }
    }

    /// N * log2(n); zero when the vocabulary is too small.
    pub fn volume(&self) -> f64 {
        let vocabulary = self.operators.len() + self.operands.len();
        if vocabulary < 2 {
            return 0.0;
        }
        self.total as f64 * (vocabulary as f64).log2()
    }
}

/// One file's static analysis outcome inside a project run.
#[derive(Debug)]
pub struct FileAnalysis {
    pub key: FileKey,
    pub path: PathBuf,
    pub outcome: Result<ComplexityStats>,
}

/// Static analyzer dispatching between backends.
pub struct StaticAnalyzer {
    thresholds: StaticThresholds,
    parser: Parser,
}

impl Default for StaticAnalyzer {
    fn default() -> Self {
        Self::new(StaticThresholds::default())
    }
}

impl StaticAnalyzer {
    pub fn new(thresholds: StaticThresholds) -> Self {
        Self {
            thresholds,
            parser: Parser::new(),
        }
    }

    pub fn thresholds(&self) -> &StaticThresholds {
        &self.thresholds
    }

    /// Load and analyze a file from disk.
    pub fn analyze_file(&self, path: &Path) -> Result<ComplexityStats> {
        let file = SourceFile::load(path)?;
        self.analyze_source(&file)
    }

    /// Analyze in-memory content, detecting the language from the path.
    pub fn analyze_content(&self, path: impl Into<PathBuf>, content: Vec<u8>) -> Result<ComplexityStats> {
        let path = path.into();
        let language =
            Language::detect(&path).ok_or_else(|| Error::UnsupportedLanguage { path: path.clone() })?;
        self.analyze_source(&SourceFile::from_content(path, language, content))
    }

    /// Analyze a loaded file.
    ///
    /// Only binary or garbled content is an error; malformed source degrades
    /// to the generic backend.
    pub fn analyze_source(&self, file: &SourceFile) -> Result<ComplexityStats> {
        let text = file.text()?;
        let language = file.language;
        let input = FileText {
            language,
            lines: text.lines().collect(),
        };
        let minified =
            is_minified_candidate(&file.file_name_lower(), language, &text, &self.thresholds);

        let mut smells = SmellCollector::new(self.thresholds.max_samples_per_kind);
        let (mode, blocks) = match language.backend() {
            Backend::Structured(_)
                if !minified && file.content.len() <= self.thresholds.max_structured_file_size =>
            {
                match self.structured(file, &input, &mut smells) {
                    Some(blocks) => (AnalysisMode::Structured, blocks),
                    None => (
                        AnalysisMode::Fallback,
                        generic::analyze(&input, &self.thresholds, false, &mut smells),
                    ),
                }
            }
            _ => (
                AnalysisMode::Generic,
                generic::analyze(&input, &self.thresholds, minified, &mut smells),
            ),
        };

        let long_line = if language.is_verbose() {
            self.thresholds.verbose_long_line
        } else {
            self.thresholds.long_line
        };
        let lengths = scan_long_lines(&input.lines, long_line, &mut smells);

        Ok(assemble(language, mode, &input, blocks, lengths, minified, smells))
    }

    fn structured(
        &self,
        file: &SourceFile,
        input: &FileText<'_>,
        smells: &mut SmellCollector,
    ) -> Option<BlockMetrics> {
        let result = match self.parser.parse_source(file) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(path = %file.path.display(), error = %e, "parse failed, using generic heuristics");
                return None;
            }
        };
        let error_ratio = result.error_ratio();
        if error_ratio > self.thresholds.max_parse_error_ratio {
            tracing::warn!(
                path = %file.path.display(),
                error_ratio,
                "parse mostly errors, using generic heuristics"
            );
            return None;
        }
        Some(structured::analyze(&result, input, &self.thresholds, smells))
    }
}

fn assemble(
    language: Language,
    mode: AnalysisMode,
    input: &FileText<'_>,
    blocks: BlockMetrics,
    lengths: smells::LineLengths,
    minified: bool,
    smells: SmellCollector,
) -> ComplexityStats {
    let function_count = blocks.function_complexities.len();
    let function_total: u32 = blocks.function_complexities.iter().sum();
    let (avg_complexity, max_complexity) = if function_count == 0 {
        let module = f64::from(blocks.module_complexity);
        (module, module)
    } else {
        let max = blocks.function_complexities.iter().copied().max().unwrap_or(0);
        (
            f64::from(function_total) / function_count as f64,
            f64::from(max),
        )
    };
    let total_complexity = function_total + blocks.module_complexity;

    let lines_of_code = input.lines.len();
    let comment_density = if lines_of_code == 0 {
        0.0
    } else {
        (blocks.comment_lines as f64 / lines_of_code as f64).clamp(0.0, 1.0)
    };
    let maintainability_index = maintainability_index(
        blocks.halstead_volume,
        total_complexity,
        blocks.logical_lines,
        comment_density,
    );
    let (smell_score, smell_flags, smell_samples) = smells.into_parts();

    ComplexityStats {
        language,
        mode,
        function_count,
        avg_complexity,
        max_complexity,
        total_complexity,
        maintainability_index,
        lines_of_code,
        logical_lines: blocks.logical_lines,
        comment_lines: blocks.comment_lines,
        comment_density,
        smell_score,
        smell_flags,
        smell_samples,
        longest_line: lengths.longest,
        long_line_count: lengths.long_count,
        long_function_count: blocks.long_function_count,
        high_complexity_blocks: blocks.high_complexity_blocks,
        deeply_nested_functions: blocks.deeply_nested_functions,
        long_parameter_functions: blocks.long_parameter_functions,
        complex_conditionals: blocks.complex_conditionals,
        uninformative_identifiers: blocks.uninformative_identifiers,
        is_minified_candidate: minified,
    }
}

impl AnalyzerTrait for StaticAnalyzer {
    type Output = Vec<FileAnalysis>;

    fn name(&self) -> &'static str {
        "metrics"
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<Self::Output> {
        let start = Instant::now();
        let results: Vec<FileAnalysis> = ctx
            .files
            .files()
            .par_iter()
            .map(|path| FileAnalysis {
                key: ctx.files.key_for(path),
                path: path.clone(),
                outcome: self.analyze_file(path),
            })
            .collect();

        tracing::info!(
            "Static analysis completed in {:?}: {} files",
            start.elapsed(),
            results.len()
        );
        Ok(results)
    }
}
