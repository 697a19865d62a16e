#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![forbid(unsafe_code)]

//! A small arithmetic-and-dice expression language: parse a string like
//! `4d6kh3 + 2 [fire damage]`, evaluate it against an injectable RNG, and
//! get back a mutable result tree you can inspect, re-render, or walk.

pub mod ast;
pub mod context;
pub mod error;
mod eval;
mod lexer;
mod parser;
mod render;
mod roller;
mod token;
pub mod tree;

pub use crate::ast::Node;
pub use crate::context::RollContext;
pub use crate::error::RollError;
pub use crate::eval::{evaluate, evaluate_with_rng};
pub use crate::render::{MarkdownStringifier, SimpleStringifier, Stringifier, render_with_total};
pub use crate::roller::{AdvType, CritType, RollResult, Roller, roll, roll_with, roll_with_rng};
pub use crate::tree::{ExprNode, Number};

pub type Result<T> = std::result::Result<T, RollError>;

/// Parses a single expression. When `allow_comments` is true, trailing text
/// the grammar can't make sense of is split off as a comment instead of
/// failing.
pub fn parse(input: &str, allow_comments: bool) -> Result<Node> {
    parser::parse(input, allow_comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn eval(input: &str) -> ExprNode {
        let ast = parse(input, false).unwrap();
        evaluate(&ast).unwrap()
    }

    #[test]
    fn test_simple_expression() {
        assert_eq!(eval("1 + 2 * 3").total(), 7.0);
    }

    #[test]
    fn test_parentheses_expression() {
        assert_eq!(eval("(1 + 2) * 3").total(), 9.0);
    }

    #[test]
    fn test_negative_and_parentheses() {
        assert_eq!(eval("-3 + 4 * (2 - 5)").total(), -15.0);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("1 + +2 + -(-3)").total(), 6.0);
    }

    #[test]
    fn test_single_number() {
        assert_eq!(eval("42").total(), 42.0);
    }

    #[test]
    fn test_keep_highest_drops_lowest() {
        let ast = parse("4d6kh3", false).unwrap();
        let mut rng = StdRng::seed_from_u64(0xFACE_CAFE);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert_eq!(dice.len(), 4);
        assert_eq!(dice.iter().filter(|die| die.kept).count(), 3);
        assert_eq!(dice.iter().filter(|die| die.dropped).count(), 1);
        let kept_sum: f64 = dice.iter().filter(|die| die.kept).map(|die| die.value).sum();
        assert!((tree.total() - kept_sum).abs() < 1e-9);
    }

    #[test]
    fn test_reroll_until_threshold() {
        let ast = parse("3d6rr<3", false).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert_eq!(dice.len(), 3);
        assert!(dice.iter().all(|die| die.value >= 3.0));
        assert!(dice.iter().any(|die| die.history.len() > 1));
    }

    #[test]
    fn test_reroll_once_only_once() {
        let ast = parse("3d6ro<4", false).unwrap();
        let mut rng = StdRng::seed_from_u64(0xABCD1234);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert!(dice.iter().all(|die| die.history.len() <= 2 && die.value >= 1.0));
    }

    #[test]
    fn test_reroll_and_add_creates_extra_die() {
        let ast = parse("1d6ra==6", false).unwrap();
        let mut rng = StdRng::seed_from_u64(14);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert!(
            dice.iter()
                .any(|die| matches!(die.origin, crate::tree::DieOrigin::RerollAdd))
        );
        assert!(dice.len() >= 2);
    }

    #[test]
    fn test_explode_chains() {
        let ast = parse("1d6e==6", false).unwrap();
        let mut rng = StdRng::seed_from_u64(14);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert!(
            dice.iter()
                .any(|die| matches!(die.origin, crate::tree::DieOrigin::Explosion))
        );
    }

    #[test]
    fn test_minimum_and_maximum_adjustments() {
        let ast = parse("2d6mi3ma5", false).unwrap();
        let mut rng = StdRng::seed_from_u64(0x12345678);
        let tree = evaluate_with_rng(&ast, &mut RollContext::default(), &mut rng).unwrap();
        let ExprNode::Expression { value, .. } = &tree else {
            panic!("expected Expression root");
        };
        let ExprNode::Dice { dice, .. } = value.as_ref() else {
            panic!("expected Dice result, got {value:?}");
        };
        assert!(dice.iter().any(|die| die
            .adjustments
            .iter()
            .any(|adj| matches!(adj, crate::tree::DieAdjustment::Minimum { .. }))));
        assert!(dice.iter().any(|die| die
            .adjustments
            .iter()
            .any(|adj| matches!(adj, crate::tree::DieAdjustment::Maximum { .. }))));
        assert!(dice.iter().all(|die| die.value >= 3.0 && die.value <= 5.0));
    }

    #[test]
    fn test_crit_on_bare_d20() {
        // A d1-backed d20 stand-in isn't available, so exercise crit
        // detection through `roll_with_rng` directly against a seed known
        // to land a natural 20 on a bare `1d20`.
        let mut found_crit = false;
        let mut found_fail = false;
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result =
                roll_with_rng("1d20", false, AdvType::None, &mut RollContext::default(), &mut rng)
                    .unwrap();
            match result.crit {
                CritType::Crit => found_crit = true,
                CritType::Fail => found_fail = true,
                CritType::None => {}
            }
        }
        assert!(found_crit, "expected at least one natural 20 across seeds");
        assert!(found_fail, "expected at least one natural 1 across seeds");
    }
}
