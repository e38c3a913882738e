// tests/unit_adapters.rs
//! The three indexing strategies must produce structurally comparable block
//! trees, so the detector reports the same chains for the same logic
//! regardless of dialect.

use denest_core::adapter::Adapter;
use denest_core::detector::Detector;
use denest_core::dialect::Dialect;
use denest_core::error::RefactorError;
use denest_core::types::{ChainShape, ConditionalRegion};

fn detect(dialect: Dialect, code: &str) -> Vec<ConditionalRegion> {
    let root = Adapter::for_dialect(dialect).index(code).expect("index failed");
    Detector::new(3).detect(&root, code)
}

const PYTHON_NEST: &str = concat!(
    "def f(a, b, c):\n",
    "    if a:\n",
    "        if b:\n",
    "            if c:\n",
    "                return 1\n",
);

const JAVA_NEST: &str = concat!(
    "int f(boolean a, boolean b, boolean c) {\n",
    "    if (a) {\n",
    "        if (b) {\n",
    "            if (c) {\n",
    "                return 1;\n",
    "            }\n",
    "        }\n",
    "    }\n",
    "    return 0;\n",
    "}\n",
);

const GENERIC_NEST: &str = concat!(
    "if a\n",
    "    if b\n",
    "        if c\n",
    "            return 1\n",
);

const TS_NEST: &str = concat!(
    "function f(a, b, c) {\n",
    "    if (a) {\n",
    "        if (b) {\n",
    "            if (c) {\n",
    "                return 1;\n",
    "            }\n",
    "        }\n",
    "    }\n",
    "    return 0;\n",
    "}\n",
);

const RUST_NEST: &str = concat!(
    "fn f(a: bool, b: bool, c: bool) -> i32 {\n",
    "    if a {\n",
    "        if b {\n",
    "            if c {\n",
    "                return 1;\n",
    "            }\n",
    "        }\n",
    "    }\n",
    "    0\n",
    "}\n",
);

#[test]
fn test_strategies_agree_on_chain_depth() {
    for (dialect, code) in [
        (Dialect::Python, PYTHON_NEST),
        (Dialect::Java, JAVA_NEST),
        (Dialect::Generic, GENERIC_NEST),
        (Dialect::TypeScript, TS_NEST),
        (Dialect::Rust, RUST_NEST),
    ] {
        let regions = detect(dialect, code);
        assert_eq!(regions.len(), 1, "one region expected for {dialect}");
        assert_eq!(regions[0].max_depth, 3, "depth mismatch for {dialect}");
        assert_eq!(
            regions[0].shape,
            ChainShape::Conjunctive,
            "shape mismatch for {dialect}"
        );
    }
}

#[test]
fn test_strategies_agree_on_conditions() {
    for (dialect, code) in [
        (Dialect::Python, PYTHON_NEST),
        (Dialect::Java, JAVA_NEST),
        (Dialect::Generic, GENERIC_NEST),
        (Dialect::TypeScript, TS_NEST),
        (Dialect::Rust, RUST_NEST),
    ] {
        let regions = detect(dialect, code);
        let conditions: Vec<&str> = regions[0]
            .levels
            .iter()
            .map(|l| l.condition.as_str())
            .collect();
        assert_eq!(conditions, vec!["a", "b", "c"], "conditions for {dialect}");
    }
}

#[test]
fn test_terminal_flags_survive_every_strategy() {
    for (dialect, code) in [
        (Dialect::Python, PYTHON_NEST),
        (Dialect::Java, JAVA_NEST),
        (Dialect::Generic, GENERIC_NEST),
    ] {
        let regions = detect(dialect, code);
        assert!(
            regions[0].levels.last().is_some_and(|l| l.terminal),
            "innermost body should be terminal for {dialect}"
        );
        assert!(regions[0].fingerprint.has_early_exit);
    }
}

#[test]
fn test_malformed_inputs_fail_consistently() {
    let unbalanced = "void f() { if (a) { go(); }";
    let err = Adapter::for_dialect(Dialect::Java)
        .index(unbalanced)
        .unwrap_err();
    assert!(matches!(err, RefactorError::MalformedStructure(_)));

    let mixed = "if a:\n\tx = 1\nif b:\n    y = 2\n";
    let err = Adapter::for_dialect(Dialect::Generic).index(mixed).unwrap_err();
    assert!(matches!(err, RefactorError::MalformedStructure(_)));

    let broken_rust = "fn f( { if x {";
    let err = Adapter::for_dialect(Dialect::Rust).index(broken_rust).unwrap_err();
    assert!(matches!(err, RefactorError::MalformedStructure(_)));
}
