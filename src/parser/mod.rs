//! Tree-sitter based multi-language parser.

pub mod queries;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tree_sitter::{Language as TsLanguage, Node, Parser as TsParser, Tree};

use crate::core::{Error, Language, Result, SourceFile};

/// Name reported for functions without a resolvable name.
pub const ANONYMOUS: &str = "<anonymous>";

/// Thread-safe parser pool for multi-language parsing.
pub struct Parser {
    /// Idle parsers per language.
    parsers: Mutex<HashMap<Language, Vec<TsParser>>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self {
            parsers: Mutex::new(HashMap::new()),
        }
    }

    /// Parse source content.
    pub fn parse_source(&self, file: &SourceFile) -> Result<ParseResult> {
        self.parse(&file.content, file.language, &file.path)
    }

    /// Parse content with explicit language.
    ///
    /// Parsers are checked out of the pool for the duration of the parse, so
    /// concurrent callers never wait on each other's parses.
    pub fn parse(&self, content: &[u8], lang: Language, path: &Path) -> Result<ParseResult> {
        let mut parser = self.checkout(lang, path)?;
        let tree = parser.parse(content, None);
        self.parsers.lock().entry(lang).or_default().push(parser);

        let tree = tree.ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            message: "Failed to parse file".to_string(),
        })?;

        Ok(ParseResult {
            tree: Arc::new(tree),
            source: content.to_vec(),
            language: lang,
            path: path.to_path_buf(),
        })
    }

    fn checkout(&self, lang: Language, path: &Path) -> Result<TsParser> {
        if let Some(parser) = self.parsers.lock().get_mut(&lang).and_then(Vec::pop) {
            return Ok(parser);
        }
        let ts_lang = get_tree_sitter_language(lang, path)?;
        let mut parser = TsParser::new();
        parser.set_language(&ts_lang).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(parser)
    }
}

/// Result of parsing a source file.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed syntax tree.
    pub tree: Arc<Tree>,
    /// Original source content.
    pub source: Vec<u8>,
    /// Detected language.
    pub language: Language,
    /// File path.
    pub path: PathBuf,
}

impl ParseResult {
    /// Get the root node of the tree.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Get text for a node.
    pub fn node_text(&self, node: &Node<'_>) -> &str {
        node.utf8_text(&self.source).unwrap_or("")
    }

    /// Share of source bytes covered by ERROR nodes.
    pub fn error_ratio(&self) -> f64 {
        if self.source.is_empty() {
            return 0.0;
        }
        let root = self.root_node();
        if !root.has_error() {
            return 0.0;
        }

        let mut error_bytes = 0usize;
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            let descend = if node.is_error() {
                error_bytes += node.end_byte() - node.start_byte();
                false
            } else {
                node.has_error()
            };

            if descend && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return error_bytes as f64 / self.source.len() as f64;
                }
            }
        }
    }
}

/// Get tree-sitter language for a Language enum value.
///
/// Only languages with a structured backend have a grammar.
pub fn get_tree_sitter_language(lang: Language, path: &Path) -> Result<TsLanguage> {
    let ts_lang = match lang {
        Language::Go => tree_sitter_go::LANGUAGE,
        Language::Rust => tree_sitter_rust::LANGUAGE,
        Language::Python => tree_sitter_python::LANGUAGE,
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
        Language::JavaScript | Language::Jsx => tree_sitter_javascript::LANGUAGE,
        Language::Java => tree_sitter_java::LANGUAGE,
        Language::C => tree_sitter_c::LANGUAGE,
        Language::Cpp => tree_sitter_cpp::LANGUAGE,
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE,
        Language::Ruby => tree_sitter_ruby::LANGUAGE,
        Language::Php => tree_sitter_php::LANGUAGE_PHP,
        Language::Bash => tree_sitter_bash::LANGUAGE,
        _ => {
            return Err(Error::UnsupportedLanguage {
                path: path.to_path_buf(),
            })
        }
    };
    Ok(ts_lang.into())
}

/// A function extracted from the AST.
#[derive(Debug, Clone)]
pub struct FunctionNode<'tree> {
    /// Function name, or [`ANONYMOUS`].
    pub name: String,
    /// Start line (1-indexed).
    pub start_line: u32,
    /// End line (1-indexed).
    pub end_line: u32,
    /// Number of declared parameters.
    pub parameter_count: usize,
    /// The function node itself.
    pub node: Node<'tree>,
}

impl<'tree> FunctionNode<'tree> {
    /// Body node, or the whole function when the grammar has no body field.
    pub fn body(&self) -> Node<'tree> {
        self.node
            .child_by_field_name("body")
            .unwrap_or(self.node)
    }
}

/// Extract functions from a parse result, outermost first in source order.
pub fn extract_functions(result: &ParseResult) -> Vec<FunctionNode<'_>> {
    let function_types = queries::get_function_node_types(result.language);
    let mut functions = Vec::new();
    if function_types.is_empty() {
        return functions;
    }

    let root = result.root_node();
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if function_types.contains(&node.kind()) {
            functions.push(FunctionNode {
                name: function_name(&node, &result.source),
                start_line: node.start_position().row as u32 + 1,
                end_line: node.end_position().row as u32 + 1,
                parameter_count: count_parameters(&node, &result.source),
                node,
            });
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return functions;
            }
        }
    }
}

fn function_name(node: &Node<'_>, source: &[u8]) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return text(&name, source);
    }

    // C and C++ nest the name inside declarators.
    let mut declarator = node.child_by_field_name("declarator");
    while let Some(current) = declarator {
        match current.kind() {
            "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
            | "operator_name" => return text(&current, source),
            _ => declarator = current.child_by_field_name("declarator"),
        }
    }

    // Anonymous functions bound to a name: `const f = () => {}`.
    if let Some(parent) = node.parent() {
        let binding = match parent.kind() {
            "variable_declarator" => parent.child_by_field_name("name"),
            "let_declaration" => parent.child_by_field_name("pattern"),
            "assignment_expression" | "assignment" => parent.child_by_field_name("left"),
            "pair" => parent.child_by_field_name("key"),
            _ => None,
        };
        if let Some(binding) = binding {
            return text(&binding, source);
        }
    }

    ANONYMOUS.to_string()
}

fn count_parameters(node: &Node<'_>, source: &[u8]) -> usize {
    // Single-parameter arrow functions: `x => x + 1`.
    if node.child_by_field_name("parameter").is_some() {
        return 1;
    }

    let Some(params) = parameter_list(node) else {
        return 0;
    };

    let mut count = 0;
    for child in params.named_children(&mut params.walk()) {
        let kind = child.kind();
        if queries::is_comment_node(kind) || kind == "attribute_item" {
            continue;
        }
        match kind {
            // Go groups names sharing a type: `a, b int`.
            "parameter_declaration" | "variadic_parameter_declaration"
                if child.child_by_field_name("name").is_some() =>
            {
                count += child
                    .children_by_field_name("name", &mut child.walk())
                    .count()
                    .max(1);
            }
            "parameter_declaration" if text(&child, source).trim() == "void" => {}
            _ => count += 1,
        }
    }
    count
}

fn parameter_list<'tree>(node: &Node<'tree>) -> Option<Node<'tree>> {
    if let Some(params) = node.child_by_field_name("parameters") {
        return Some(params);
    }
    let mut declarator = node.child_by_field_name("declarator");
    while let Some(current) = declarator {
        if let Some(params) = current.child_by_field_name("parameters") {
            return Some(params);
        }
        declarator = current.child_by_field_name("declarator");
    }
    None
}

fn text(node: &Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or("").to_string()
}
