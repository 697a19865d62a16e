use crate::ast::{BinaryOperator, SetOperation, UnaryOperator};

/// A node in the mutable result tree produced by evaluation.
///
/// Unlike the immutable [`Node`](crate::ast::Node) AST, this tree carries
/// the actual rolled values, which dice/elements ended up kept or dropped,
/// and enough history to render or re-inspect a roll after the fact.
#[derive(Debug, Clone)]
pub enum ExprNode {
    /// The top-level result: the rolled expression plus whatever comment
    /// text was split off during parsing.
    Expression {
        value: Box<ExprNode>,
        comment: Option<String>,
    },
    Literal(f64),
    Unary {
        operator: UnaryOperator,
        total: f64,
        operand: Box<ExprNode>,
    },
    Binary {
        operator: BinaryOperator,
        total: f64,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
    },
    Dice {
        quantity: usize,
        size: u32,
        percent: bool,
        dice: Vec<Die>,
        operations: Vec<SetOperation>,
    },
    Set {
        elements: Vec<SetElement>,
        operations: Vec<SetOperation>,
    },
    /// `(E)`, optionally with set operations applied directly against it
    /// (`(4d6)kh3`).
    Parenthetical {
        value: Box<ExprNode>,
        operations: Vec<SetOperation>,
    },
    AnnotatedNumber {
        value: Box<ExprNode>,
        annotations: Vec<String>,
    },
}

/// One rolled die within a `Dice` node.
#[derive(Debug, Clone)]
pub struct Die {
    pub value: f64,
    pub kept: bool,
    pub dropped: bool,
    pub origin: DieOrigin,
    /// Every face this die showed, in order: the initial roll followed by
    /// any rerolls. Explosions that spawned a *new* die are recorded as
    /// separate `Die`s, not as history entries on this one.
    pub history: Vec<DieFace>,
    pub adjustments: Vec<DieAdjustment>,
}

impl Die {
    pub(crate) fn new(value: f64, origin: DieOrigin) -> Self {
        Self {
            value,
            kept: true,
            dropped: false,
            origin,
            history: vec![DieFace {
                value,
                exploded: false,
            }],
            adjustments: Vec::new(),
        }
    }

    pub(crate) fn refresh_drop_state(&mut self) {
        self.dropped = !self.kept;
    }
}

/// A single face a die showed during its lifetime.
#[derive(Debug, Clone, Copy)]
pub struct DieFace {
    pub value: f64,
    pub exploded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DieOrigin {
    Original,
    RerollAdd,
    Explosion,
}

#[derive(Debug, Clone, Copy)]
pub enum DieAdjustment {
    Minimum { threshold: f64, previous: f64 },
    Maximum { threshold: f64, previous: f64 },
}

/// One element of a bare set literal, e.g. one of the `1, 2, 3` in `(1, 2, 3)`.
#[derive(Debug, Clone)]
pub struct SetElement {
    pub value: ExprNode,
    pub kept: bool,
    pub dropped: bool,
}

impl SetElement {
    pub(crate) fn refresh_drop_state(&mut self) {
        self.dropped = !self.kept;
    }
}

/// The capability every result-tree node exposes, whether it's a leaf
/// (`Die`) or a composite (`ExprNode`). Modeled after spec's Expression-tree
/// node interface rather than Rust's usual downcast-free trait objects: the
/// set of operations is small and fixed, so a flat trait beats an
/// inheritance hierarchy.
pub trait Number {
    /// This node's own resolved numeric value.
    fn number(&self) -> f64 {
        self.total()
    }

    /// The aggregate numeric value of this node, after operations.
    fn total(&self) -> f64;

    /// Every member of this node's pool (dice or set elements), kept or
    /// dropped. Empty for anything that isn't a pool.
    fn set(&self) -> Vec<&dyn Number> {
        Vec::new()
    }

    /// Only the currently-kept members of `set()`.
    fn keptset(&self) -> Vec<&dyn Number> {
        self.set().into_iter().filter(|n| n.kept()).collect()
    }

    /// Whether this node was dropped by an enclosing keep/drop operation.
    fn drop(&self) -> bool {
        false
    }

    /// Whether this node counts toward its parent's total.
    fn kept(&self) -> bool {
        !self.drop()
    }

    /// The bracketed annotation attached to this node, if any.
    fn annotation(&self) -> Option<&str> {
        None
    }

    /// All structurally-interesting children, for generic tree walks.
    fn children(&self) -> Vec<&dyn Number> {
        Vec::new()
    }

    fn left(&self) -> Option<&dyn Number> {
        None
    }

    fn right(&self) -> Option<&dyn Number> {
        None
    }

    /// The single child wrapped by a unary/parenthetical/annotated node.
    fn set_child(&self) -> Option<&dyn Number> {
        None
    }
}

impl Number for Die {
    fn total(&self) -> f64 {
        self.value
    }

    fn drop(&self) -> bool {
        self.dropped
    }
}

impl Number for SetElement {
    fn total(&self) -> f64 {
        self.value.total()
    }

    fn drop(&self) -> bool {
        self.dropped
    }

    fn children(&self) -> Vec<&dyn Number> {
        vec![&self.value]
    }

    fn set_child(&self) -> Option<&dyn Number> {
        Some(&self.value)
    }
}

impl Number for ExprNode {
    fn total(&self) -> f64 {
        match self {
            ExprNode::Expression { value, .. } => value.total(),
            ExprNode::Literal(v) => *v,
            ExprNode::Unary { total, .. } => *total,
            ExprNode::Binary { total, .. } => *total,
            ExprNode::Dice { dice, .. } => dice.iter().filter(|d| d.kept).map(|d| d.value).sum(),
            ExprNode::Set { elements, .. } => elements
                .iter()
                .filter(|e| e.kept)
                .map(|e| e.value.total())
                .sum(),
            ExprNode::Parenthetical { value, .. } => value.total(),
            ExprNode::AnnotatedNumber { value, .. } => value.total(),
        }
    }

    fn set(&self) -> Vec<&dyn Number> {
        match self {
            ExprNode::Dice { dice, .. } => dice.iter().map(|d| d as &dyn Number).collect(),
            ExprNode::Set { elements, .. } => {
                elements.iter().map(|e| e as &dyn Number).collect()
            }
            ExprNode::Expression { value, .. }
            | ExprNode::Parenthetical { value, .. }
            | ExprNode::AnnotatedNumber { value, .. } => value.set(),
            _ => Vec::new(),
        }
    }

    fn annotation(&self) -> Option<&str> {
        match self {
            ExprNode::AnnotatedNumber { annotations, .. } => {
                annotations.first().map(String::as_str)
            }
            _ => None,
        }
    }

    fn children(&self) -> Vec<&dyn Number> {
        match self {
            ExprNode::Expression { value, .. } => vec![value.as_ref()],
            ExprNode::Unary { operand, .. } => vec![operand.as_ref()],
            ExprNode::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExprNode::Dice { dice, .. } => dice.iter().map(|d| d as &dyn Number).collect(),
            ExprNode::Set { elements, .. } => {
                elements.iter().map(|e| e as &dyn Number).collect()
            }
            ExprNode::Parenthetical { value, .. } | ExprNode::AnnotatedNumber { value, .. } => {
                vec![value.as_ref()]
            }
            ExprNode::Literal(_) => Vec::new(),
        }
    }

    fn left(&self) -> Option<&dyn Number> {
        match self {
            ExprNode::Binary { left, .. } => Some(left.as_ref()),
            _ => None,
        }
    }

    fn right(&self) -> Option<&dyn Number> {
        match self {
            ExprNode::Binary { right, .. } => Some(right.as_ref()),
            _ => None,
        }
    }

    fn set_child(&self) -> Option<&dyn Number> {
        match self {
            ExprNode::Expression { value, .. }
            | ExprNode::Unary { operand: value, .. }
            | ExprNode::Parenthetical { value, .. }
            | ExprNode::AnnotatedNumber { value, .. } => Some(value.as_ref()),
            _ => None,
        }
    }
}
