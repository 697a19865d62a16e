use std::collections::HashMap;

use rand::RngCore;

use crate::ast::{DiceSize, Node, Selector, SelectorKind, SetOperation, SetOperator};
use crate::context::RollContext;
use crate::error::RollError;
use crate::eval;
use crate::parser;
use crate::render::{MarkdownStringifier, render_with_total};
use crate::tree::{ExprNode, Number};

type Result<T> = std::result::Result<T, RollError>;

const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Whether a plain `1d20` should be rewritten into a kept-highest or
/// kept-lowest pair before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvType {
    #[default]
    None,
    Advantage,
    Disadvantage,
}

impl AdvType {
    /// Rewrites a bare `1d20` root into `2d20kh1`/`2d20kl1`. Any other
    /// shape (already has a count, already has operations, isn't even a
    /// d20) passes through unchanged — advantage only ever applies to the
    /// canonical single-d20 roll.
    fn rewrite(self, node: Node) -> Node {
        if self == AdvType::None {
            return node;
        }
        let Node::Expression { roll, comment } = node else {
            return node;
        };
        let Node::Dice { num: None, size } = *roll else {
            return Node::Expression { roll, comment };
        };
        if !matches!(&size, DiceSize::Value(inner) if matches!(inner.as_ref(), Node::Literal(v) if *v == 20.0))
        {
            return Node::Expression {
                roll: Box::new(Node::Dice { num: None, size }),
                comment,
            };
        }

        let selector_kind = match self {
            AdvType::Advantage => SelectorKind::Highest,
            AdvType::Disadvantage => SelectorKind::Lowest,
            AdvType::None => unreachable!(),
        };
        let rewritten = Node::OperatedDice {
            dice: Box::new(Node::Dice {
                num: Some(Box::new(Node::Literal(2.0))),
                size,
            }),
            operations: vec![SetOperation {
                operator: SetOperator::Keep,
                selectors: vec![Selector {
                    kind: selector_kind,
                    target: Box::new(Node::Literal(1.0)),
                }],
            }],
        };
        Node::Expression {
            roll: Box::new(rewritten),
            comment,
        }
    }
}

/// Whether a roll's kept d20 face landed on a natural 20 or a natural 1.
/// Only ever set for a bare (optionally advantage/disadvantage-rewritten)
/// `1d20`; anything else is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CritType {
    #[default]
    None,
    Crit,
    Fail,
}

fn detect_crit(tree: &ExprNode) -> CritType {
    let mut node = tree;
    loop {
        match node {
            ExprNode::Expression { value, .. }
            | ExprNode::AnnotatedNumber { value, .. }
            | ExprNode::Parenthetical { value, .. } => node = value.as_ref(),
            ExprNode::Dice { size, percent, dice, .. } => {
                if *percent || *size != 20 {
                    return CritType::None;
                }
                let kept: Vec<_> = dice.iter().filter(|d| d.kept).collect();
                return match kept.as_slice() {
                    [only] if only.value == 20.0 => CritType::Crit,
                    [only] if only.value == 1.0 => CritType::Fail,
                    _ => CritType::None,
                };
            }
            _ => return CritType::None,
        }
    }
}

/// The outcome of a single `roll` call: the parsed AST, the evaluated
/// result tree, its rounded total, a rendered string, any trailing
/// comment, and whether it was a natural 20/1 on a d20.
#[derive(Debug, Clone)]
pub struct RollResult {
    pub ast: Node,
    pub tree: ExprNode,
    pub total: i64,
    pub result: String,
    pub comment: Option<String>,
    pub crit: CritType,
}

/// Parses `input`, applying advantage/disadvantage rewriting if requested.
pub fn parse(input: &str, allow_comments: bool) -> Result<Node> {
    parser::parse(input, allow_comments)
}

/// Parses and evaluates `input` in one call, using the thread-local RNG and
/// a default [`RollContext`].
pub fn roll(input: &str) -> Result<RollResult> {
    roll_with(input, false, AdvType::None)
}

/// Like [`roll`], with comment-splitting and advantage/disadvantage control.
pub fn roll_with(input: &str, allow_comments: bool, adv: AdvType) -> Result<RollResult> {
    let ast = adv.rewrite(parser::parse(input, allow_comments)?);
    let tree = eval::evaluate(&ast)?;
    Ok(finish(ast, tree))
}

/// Like [`roll_with`], but evaluates with a caller-supplied RNG and
/// [`RollContext`] for determinism and resource control.
pub fn roll_with_rng<R: RngCore>(
    input: &str,
    allow_comments: bool,
    adv: AdvType,
    ctx: &mut RollContext,
    rng: &mut R,
) -> Result<RollResult> {
    let ast = adv.rewrite(parser::parse(input, allow_comments)?);
    let tree = eval::evaluate_with_rng(&ast, ctx, rng)?;
    Ok(finish(ast, tree))
}

fn finish(ast: Node, tree: ExprNode) -> RollResult {
    let comment = match &tree {
        ExprNode::Expression { comment, .. } => comment.clone(),
        _ => None,
    };
    let crit = detect_crit(&tree);
    let result = render_with_total(&MarkdownStringifier, &tree);
    let total = tree.total().trunc() as i64;
    RollResult {
        ast,
        tree,
        total,
        result,
        comment,
        crit,
    }
}

/// A reusable AST cache over repeated literal expression strings, so a bot
/// or game server rolling the same handful of expressions over and over
/// doesn't re-tokenize and re-parse every time.
///
/// The cache is keyed on the exact input string and evicts the
/// least-frequently-used entry once `capacity` is exceeded. Disabled
/// whenever comments are allowed: the same literal text can then split
/// into different (roll, comment) pairs depending on what the grammar
/// manages to consume, so the AST alone is no longer a safe cache key.
pub struct Roller {
    capacity: usize,
    allow_comments: bool,
    cache: HashMap<String, Node>,
    frequency: HashMap<String, u64>,
}

impl Default for Roller {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, false)
    }
}

impl Roller {
    #[must_use]
    pub fn new(capacity: usize, allow_comments: bool) -> Self {
        Self {
            capacity,
            allow_comments,
            cache: HashMap::new(),
            frequency: HashMap::new(),
        }
    }

    pub fn roll(&mut self, input: &str) -> Result<RollResult> {
        self.roll_with(input, AdvType::None)
    }

    pub fn roll_with(&mut self, input: &str, adv: AdvType) -> Result<RollResult> {
        let ast = self.parse_cached(input)?;
        let ast = adv.rewrite(ast);
        let tree = eval::evaluate(&ast)?;
        Ok(finish(ast, tree))
    }

    fn parse_cached(&mut self, input: &str) -> Result<Node> {
        if self.allow_comments {
            return parser::parse(input, true);
        }

        if let Some(cached) = self.cache.get(input) {
            *self.frequency.entry(input.to_string()).or_default() += 1;
            return Ok(cached.clone());
        }

        let ast = parser::parse(input, false)?;
        self.insert(input.to_string(), ast.clone());
        Ok(ast)
    }

    fn insert(&mut self, key: String, ast: Node) {
        if self.cache.len() >= self.capacity && !self.cache.contains_key(&key) {
            if let Some(victim) = self
                .frequency
                .iter()
                .min_by_key(|(_, count)| **count)
                .map(|(k, _)| k.clone())
            {
                self.cache.remove(&victim);
                self.frequency.remove(&victim);
            }
        }
        self.cache.insert(key.clone(), ast);
        self.frequency.insert(key, 1);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
