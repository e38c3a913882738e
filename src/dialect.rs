// src/dialect.rs
//! Dialect tags and the per-dialect structural tables.
//!
//! A dialect maps to exactly one indexing strategy (tree, delimiter or
//! indentation tracking) and one rendering flavor (braced or indented).
//! Everything the core needs to know about a language lives here, so the
//! detector and transform engine stay dialect-agnostic.

use tree_sitter::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Rust,
    Python,
    TypeScript,
    Java,
    C,
    Cpp,
    /// Unknown dialect, indexed by indentation only.
    Generic,
}

/// Structural indexing strategy for a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Tree,
    Delimiter,
    Indent,
}

/// Rendering flavor for rewritten regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Braced,
    Indented,
}

/// Tree-sitter node-kind tables for a tree-indexed dialect.
pub struct TreeKinds {
    pub conditional: &'static [&'static str],
    pub loops: &'static [&'static str],
    pub terminal: &'static [&'static str],
}

impl Dialect {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "rs" => Some(Self::Rust),
            "py" | "pyw" => Some(Self::Python),
            "ts" | "tsx" | "js" | "jsx" | "mjs" => Some(Self::TypeScript),
            "java" => Some(Self::Java),
            "c" | "h" => Some(Self::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// Content-based detection for units without a usable extension.
    /// Coarse on purpose; falls back to `Generic` rather than guessing hard.
    #[must_use]
    pub fn sniff(text: &str) -> Self {
        if text.contains("def ") && text.contains(':') && !text.contains('{') {
            return Self::Python;
        }
        if text.contains("fn ") && text.contains("->") || text.contains("impl ") {
            return Self::Rust;
        }
        if text.contains("#include") {
            return Self::Cpp;
        }
        if text.contains("public class") || text.contains("private ") && text.contains(';') {
            return Self::Java;
        }
        if text.contains("function ") || text.contains("=>") {
            return Self::TypeScript;
        }
        Self::Generic
    }

    #[must_use]
    pub fn strategy(self) -> Strategy {
        match self {
            Self::Rust | Self::Python | Self::TypeScript => Strategy::Tree,
            Self::Java | Self::C | Self::Cpp => Strategy::Delimiter,
            Self::Generic => Strategy::Indent,
        }
    }

    #[must_use]
    pub fn flavor(self) -> Flavor {
        match self {
            Self::Python | Self::Generic => Flavor::Indented,
            _ => Flavor::Braced,
        }
    }

    #[must_use]
    pub fn grammar(self) -> Option<Language> {
        match self {
            Self::Rust => Some(tree_sitter_rust::language()),
            Self::Python => Some(tree_sitter_python::language()),
            Self::TypeScript => Some(tree_sitter_typescript::language_typescript()),
            _ => None,
        }
    }

    // Only meaningful for tree-indexed dialects; the TypeScript table is the
    // harmless fallback for the rest.
    #[must_use]
    pub fn tree_kinds(self) -> &'static TreeKinds {
        match self {
            Self::Rust => &RUST_KINDS,
            Self::Python => &PYTHON_KINDS,
            _ => &TYPESCRIPT_KINDS,
        }
    }

    /// Keywords excluded from free-identifier inference during extraction.
    #[must_use]
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Rust => &[
                "if", "else", "match", "for", "while", "loop", "let", "mut", "fn", "return",
                "break", "continue", "true", "false", "in", "ref", "self", "Self", "pub",
                "use", "mod", "struct", "enum", "impl",
            ],
            Self::Python | Self::Generic => &[
                "if", "elif", "else", "for", "while", "def", "return", "break", "continue",
                "pass", "raise", "True", "False", "None", "and", "or", "not", "in", "is",
                "lambda", "print", "self", "try", "except", "finally", "with",
            ],
            _ => &[
                "if", "else", "switch", "case", "for", "while", "do", "return", "break",
                "continue", "throw", "new", "var", "let", "const", "function", "true",
                "false", "null", "undefined", "void", "int", "long", "double", "float",
                "char", "bool", "boolean", "String", "this", "public", "private", "static",
            ],
        }
    }

    /// Inverts a condition for guard emission (de Morgan entry point).
    #[must_use]
    pub fn negate(self, condition: &str) -> String {
        match self.flavor() {
            Flavor::Braced => format!("!({})", condition.trim()),
            Flavor::Indented => format!("not ({})", condition.trim()),
        }
    }

    /// A bare early exit in this dialect.
    #[must_use]
    pub fn bare_exit(self) -> &'static str {
        match self.flavor() {
            Flavor::Braced => "return;",
            Flavor::Indented => "return",
        }
    }

    /// Opens a conditional over `cond`. Rust drops the header parens the
    /// other braced dialects require.
    #[must_use]
    pub fn if_header(self, cond: &str) -> String {
        match self {
            Self::Rust => format!("if {cond} {{"),
            Self::Python | Self::Generic => format!("if {cond}:"),
            _ => format!("if ({cond}) {{"),
        }
    }

    #[must_use]
    pub fn block_close(self) -> &'static str {
        match self.flavor() {
            Flavor::Braced => "}",
            Flavor::Indented => "",
        }
    }

    #[must_use]
    pub fn and_op(self) -> &'static str {
        match self.flavor() {
            Flavor::Braced => "&&",
            Flavor::Indented => "and",
        }
    }

    /// A statement invoking `name` with `args`.
    #[must_use]
    pub fn call_stmt(self, name: &str, args: &str) -> String {
        match self.flavor() {
            Flavor::Braced => format!("{name}({args});"),
            Flavor::Indented => format!("{name}({args})"),
        }
    }

    #[must_use]
    pub fn comment_prefix(self) -> &'static str {
        match self.flavor() {
            Flavor::Braced => "//",
            Flavor::Indented => "#",
        }
    }

    /// Header and footer lines for an extracted subroutine stub.
    ///
    /// Rust stubs are rendered as closures so parameters stay untyped;
    /// the other braced dialects take a plain subroutine header.
    #[must_use]
    pub fn stub_decl(self, name: &str, params: &str) -> (String, &'static str) {
        match self {
            Self::Rust => (format!("let {name} = |{params}| {{"), "};"),
            Self::TypeScript => (format!("function {name}({params}) {{"), "}"),
            Self::Java => (format!("void {name}({params}) {{"), "}"),
            Self::C | Self::Cpp => (format!("static void {name}({params}) {{"), "}"),
            Self::Python | Self::Generic => (format!("def {name}({params}):"), ""),
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

static RUST_KINDS: TreeKinds = TreeKinds {
    conditional: &["if_expression"],
    loops: &["for_expression", "while_expression", "loop_expression"],
    terminal: &["return_expression", "break_expression", "continue_expression"],
};

static PYTHON_KINDS: TreeKinds = TreeKinds {
    conditional: &["if_statement"],
    loops: &["for_statement", "while_statement"],
    terminal: &[
        "return_statement",
        "raise_statement",
        "break_statement",
        "continue_statement",
    ],
};

static TYPESCRIPT_KINDS: TreeKinds = TreeKinds {
    conditional: &["if_statement", "switch_statement"],
    loops: &[
        "for_statement",
        "for_in_statement",
        "while_statement",
        "do_statement",
    ],
    terminal: &[
        "return_statement",
        "throw_statement",
        "break_statement",
        "continue_statement",
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ext() {
        assert_eq!(Dialect::from_ext("rs"), Some(Dialect::Rust));
        assert_eq!(Dialect::from_ext("py"), Some(Dialect::Python));
        assert_eq!(Dialect::from_ext("cc"), Some(Dialect::Cpp));
        assert_eq!(Dialect::from_ext("zig"), None);
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(Dialect::Python.strategy(), Strategy::Tree);
        assert_eq!(Dialect::Java.strategy(), Strategy::Delimiter);
        assert_eq!(Dialect::Generic.strategy(), Strategy::Indent);
    }

    #[test]
    fn test_sniff_python() {
        let code = "def categorize(score):\n    if score > 0:\n        return 'ok'\n";
        assert_eq!(Dialect::sniff(code), Dialect::Python);
    }

    #[test]
    fn test_negate_flavors() {
        assert_eq!(Dialect::Rust.negate("a > b"), "!(a > b)");
        assert_eq!(Dialect::Python.negate("a > b"), "not (a > b)");
    }
}
