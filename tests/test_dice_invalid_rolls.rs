mod common;
use common::r;

// ============================================================================
// Invalid Rolls
// ============================================================================

#[test]
#[should_panic(expected = "Exceeded maximum number of rolls")]
fn test_too_many_rolls() {
    let _ = r("1001d6");
}

#[test]
fn test_zero_sided_die() {
    // A zero-sided die is a benign degenerate die: every face reads 0,
    // no error.
    assert_eq!(r("6d0"), 0.0);
}

#[test]
#[should_panic(expected = "selector target must be positive")]
fn test_invalid_minimum() {
    let _ = r("10d6mil1");
}
