// ---------- AST ----------
//
// Immutable tree produced by the parser. `parse` always returns a single
// `Node::Expression` wrapping the rolled sub-expression and an optional
// trailing comment; every other variant only ever appears nested inside it.

/// A node in the dice-expression abstract syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The top-level parse result: the rolled expression plus whatever
    /// trailing free text was split off as a comment, if comments are
    /// enabled.
    Expression {
        roll: Box<Node>,
        comment: Option<String>,
    },
    /// A numeric literal, carrying one or more bracketed annotations.
    AnnotatedNumber {
        value: Box<Node>,
        annotations: Vec<String>,
    },
    /// A numeric literal.
    Literal(f64),
    /// A parenthesized sub-expression, e.g. `(1 + 2)`. May itself carry
    /// set-style operations when they immediately follow the closing paren
    /// (e.g. `(4d6)kh3`); validity of those operations against the wrapped
    /// value is an evaluation-time concern (see `RollError::Value`).
    Parenthetical {
        value: Box<Node>,
        operations: Vec<SetOperation>,
    },
    /// A unary operation such as negation.
    Unary {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    /// A binary arithmetic or comparison operation.
    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// A bare set literal, e.g. `(1, 2, 3)` or `()`.
    NumberSet { elements: Vec<Node> },
    /// A set literal with keep/drop operations applied.
    OperatedSet {
        set: Box<Node>,
        operations: Vec<SetOperation>,
    },
    /// A dice roll expression, e.g. `4d6` or `d%`.
    Dice {
        num: Option<Box<Node>>,
        size: DiceSize,
    },
    /// A dice expression with keep/drop/reroll/explode/min/max operations.
    OperatedDice {
        dice: Box<Node>,
        operations: Vec<SetOperation>,
    },
}

/// The size of a die: a fixed face count, or the `d%` percentile die.
#[derive(Debug, Clone, PartialEq)]
pub enum DiceSize {
    Value(Box<Node>),
    Percent,
}

/// Unary operators supported by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

/// Binary operators supported by the language, in precedence order from
/// loosest (comparison) to tightest (multiplicative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    IntDivide,
    Modulo,
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
}

/// A selector targets a subset of a set/dice pool's currently kept members.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub target: Box<Node>,
}

/// `literal` (`SelectorKind::Literal`, spec.md's "no prefix" selector) plus
/// the full comparison family; `h`/`l` select by rank, the rest by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Literal,
    Highest,
    Lowest,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    EqualTo,
    NotEqual,
}

/// The eight set operators the grammar supports. Not every operator is
/// valid against every producer (`rr`/`ro`/`ra`/`e`/`mi`/`ma` require dice,
/// not a plain set) — that restriction is enforced by the evaluator, since
/// `(1, 2)rr1` is grammatically well-formed and only fails semantically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Keep,
    Drop,
    Reroll,
    RerollOnce,
    RerollAdd,
    Explode,
    Minimum,
    Maximum,
}

/// One operator application, e.g. `kh3` or `rr<3`. Multiple selectors union
/// their selections (see spec.md §4.4.1).
#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub operator: SetOperator,
    pub selectors: Vec<Selector>,
}
