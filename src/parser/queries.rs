//! Node-kind tables driving the structured analyzer.
//!
//! Languages handled by the generic backend have no grammar and get empty
//! tables.

use crate::core::Language;

/// Get function node types for a language.
pub fn get_function_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Go => &["function_declaration", "method_declaration", "func_literal"],
        Language::Rust => &["function_item", "closure_expression"],
        Language::Python => &["function_definition", "lambda"],
        Language::TypeScript | Language::JavaScript | Language::Tsx | Language::Jsx => &[
            "function_declaration",
            "function_expression",
            "generator_function_declaration",
            "method_definition",
            "arrow_function",
        ],
        Language::Java => &["method_declaration", "constructor_declaration"],
        Language::CSharp => &[
            "method_declaration",
            "constructor_declaration",
            "local_function_statement",
        ],
        Language::C | Language::Cpp => &["function_definition"],
        Language::Ruby => &["method", "singleton_method"],
        Language::Php => &["function_definition", "method_declaration"],
        Language::Bash => &["function_definition"],
        _ => &[],
    }
}

/// Get decision point node types for cyclomatic complexity.
pub fn get_decision_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Go => &[
            "if_statement",
            "for_statement",
            "select_statement",
            "type_switch_statement",
            "expression_switch_statement",
            // Each case is an independent path.
            "expression_case",
            "type_case",
            "communication_case",
        ],
        Language::Rust => &[
            "if_expression",
            "match_arm",
            "for_expression",
            // Covers `while let` too; tree-sitter-rust 0.23 uses a let_condition child.
            "while_expression",
            "loop_expression",
            "try_expression",
        ],
        Language::Python => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "with_statement",
            "elif_clause",
            "except_clause",
            "for_in_clause",
            "if_clause",
            "conditional_expression",
        ],
        Language::TypeScript | Language::JavaScript | Language::Tsx | Language::Jsx => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "ternary_expression",
            "catch_clause",
            "switch_case",
        ],
        Language::Java | Language::CSharp => &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_label",
            "switch_section",
            "switch_expression_arm",
            "catch_clause",
            "conditional_expression",
            "ternary_expression",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "for_statement",
            "for_range_loop",
            "while_statement",
            "do_statement",
            "case_statement",
            "catch_clause",
            "conditional_expression",
        ],
        Language::Ruby => &[
            "if",
            "unless",
            "while",
            "until",
            "for",
            "when",
            "rescue",
            "elsif",
            "conditional",
            "if_modifier",
            "unless_modifier",
            "while_modifier",
            "until_modifier",
        ],
        Language::Php => &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "case_statement",
            "catch_clause",
            "else_if_clause",
            "conditional_expression",
        ],
        Language::Bash => &[
            "if_statement",
            "for_statement",
            "c_style_for_statement",
            "while_statement",
            "case_item",
            "elif_clause",
        ],
        _ => &[],
    }
}

/// Get node types that open a nesting level.
pub fn get_nesting_node_types(lang: Language) -> &'static [&'static str] {
    match lang {
        Language::Ruby => &[
            "if", "unless", "while", "until", "for", "case", "begin", "do_block",
        ],
        Language::Go => &[
            "if_statement",
            "for_statement",
            "select_statement",
            "type_switch_statement",
            "expression_switch_statement",
        ],
        Language::Python => &[
            "if_statement",
            "for_statement",
            "while_statement",
            "with_statement",
            "try_statement",
        ],
        Language::Rust => &[
            "if_expression",
            "match_expression",
            "for_expression",
            "while_expression",
            "loop_expression",
        ],
        Language::TypeScript | Language::JavaScript | Language::Tsx | Language::Jsx => &[
            "if_statement",
            "for_statement",
            "for_in_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Java | Language::CSharp => &[
            "if_statement",
            "for_statement",
            "enhanced_for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "switch_expression",
            "try_statement",
        ],
        Language::C | Language::Cpp => &[
            "if_statement",
            "for_statement",
            "for_range_loop",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Php => &[
            "if_statement",
            "for_statement",
            "foreach_statement",
            "while_statement",
            "do_statement",
            "switch_statement",
            "try_statement",
        ],
        Language::Bash => &[
            "if_statement",
            "for_statement",
            "c_style_for_statement",
            "while_statement",
            "case_statement",
        ],
        _ => &[],
    }
}

/// Check if a token kind is a short-circuit logical operator.
pub fn is_logical_operator(node_type: &str) -> bool {
    matches!(node_type, "&&" | "||" | "and" | "or")
}

/// Check if a node kind is a comment in any supported grammar.
pub fn is_comment_node(node_type: &str) -> bool {
    node_type.contains("comment")
}

/// Names that never count as uninformative identifiers.
pub const ALLOWED_SHORT_IDENTIFIERS: &[&str] = &["i", "j", "k", "n", "x", "y", "z", "_", "e"];

/// Placeholder vocabulary that says nothing about a value's purpose.
pub const UNINFORMATIVE_IDENTIFIERS: &[&str] = &[
    "tmp", "temp", "foo", "bar", "baz", "qux", "obj", "val", "data", "stuff", "thing", "things",
    "var", "dummy", "test1", "test2", "ret", "res", "blah",
];

/// Identifier node kinds whose text is a declared or referenced name.
pub fn is_identifier_node(node_type: &str) -> bool {
    matches!(
        node_type,
        "identifier" | "field_identifier" | "property_identifier" | "shorthand_property_identifier"
            | "variable_name"
            | "simple_identifier"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED: [Language; 14] = [
        Language::Go,
        Language::Rust,
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Tsx,
        Language::Jsx,
        Language::Java,
        Language::CSharp,
        Language::C,
        Language::Cpp,
        Language::Ruby,
        Language::Php,
        Language::Bash,
    ];

    #[test]
    fn test_every_structured_language_has_tables() {
        for lang in STRUCTURED {
            assert!(
                !get_function_node_types(lang).is_empty(),
                "{lang} should have function node types"
            );
            assert!(
                !get_decision_node_types(lang).is_empty(),
                "{lang} should have decision node types"
            );
            assert!(
                !get_nesting_node_types(lang).is_empty(),
                "{lang} should have nesting node types"
            );
        }
    }

    #[test]
    fn test_generic_languages_have_no_tables() {
        assert!(get_function_node_types(Language::Kotlin).is_empty());
        assert!(get_decision_node_types(Language::Css).is_empty());
        assert!(get_nesting_node_types(Language::Json).is_empty());
    }

    #[test]
    fn test_nesting_types_language_specific() {
        // Rust uses _expression suffix, not _statement
        let rust_types = get_nesting_node_types(Language::Rust);
        assert!(rust_types.contains(&"if_expression"));
        assert!(!rust_types.contains(&"if_statement"));

        // Ruby uses bare keywords
        let ruby_types = get_nesting_node_types(Language::Ruby);
        assert!(ruby_types.contains(&"unless"));

        let php_types = get_nesting_node_types(Language::Php);
        assert!(php_types.contains(&"foreach_statement"));
    }

    #[test]
    fn test_logical_operators() {
        assert!(is_logical_operator("&&"));
        assert!(is_logical_operator("or"));
        assert!(!is_logical_operator("&"));
        assert!(!is_logical_operator("not"));
    }

    #[test]
    fn test_comment_kinds() {
        assert!(is_comment_node("comment"));
        assert!(is_comment_node("line_comment"));
        assert!(is_comment_node("block_comment"));
        assert!(!is_comment_node("string"));
    }

    #[test]
    fn test_identifier_vocabulary_is_disjoint() {
        for name in ALLOWED_SHORT_IDENTIFIERS {
            assert!(!UNINFORMATIVE_IDENTIFIERS.contains(name));
        }
    }
}
