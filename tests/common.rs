use dicetree::{Number, evaluate, parse};

/// Parses and evaluates `expr` against the thread-local RNG, returning the
/// raw (unrounded) total. Panics with the error's `Display` text on failure
/// so `#[should_panic(expected = "...")]` tests can match on it.
pub fn r(expr: &str) -> f64 {
    let ast = parse(expr, false).unwrap_or_else(|e| panic!("{e}"));
    evaluate(&ast).unwrap_or_else(|e| panic!("{e}")).total()
}
