use crate::ast::{
    BinaryOperator, DiceSize, Node, Selector, SelectorKind, SetOperation, SetOperator,
    UnaryOperator,
};
use crate::tree::{Die, DieAdjustment, ExprNode, Number, SetElement};

/// Renders a result tree to a string. One dispatch method per node kind, in
/// the style of a visitor over an AST rather than a single recursive
/// `fmt::Display` impl, so a renderer can override just the pieces it wants
/// to decorate (see [`MarkdownStringifier`]) while inheriting the rest.
pub trait Stringifier {
    fn stringify(&self, node: &ExprNode) -> String {
        match node {
            ExprNode::Expression { value, .. } => self.stringify(value),
            ExprNode::Literal(v) => self.literal(*v),
            ExprNode::Unary {
                operator, operand, ..
            } => self.unary(*operator, operand),
            ExprNode::Binary {
                operator,
                left,
                right,
                ..
            } => self.binary(*operator, left, right),
            ExprNode::Dice {
                quantity,
                size,
                percent,
                dice,
                operations,
            } => self.dice(*quantity, *size, *percent, dice, operations),
            ExprNode::Set {
                elements,
                operations,
            } => self.set(elements, operations),
            ExprNode::Parenthetical { value, .. } => self.parenthetical(value),
            ExprNode::AnnotatedNumber {
                value, annotations, ..
            } => self.annotated(value, annotations),
        }
    }

    fn literal(&self, value: f64) -> String {
        format_number(value)
    }

    fn unary(&self, operator: UnaryOperator, operand: &ExprNode) -> String {
        let symbol = match operator {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        };
        format!("{symbol}{}", self.stringify(operand))
    }

    fn binary(&self, operator: BinaryOperator, left: &ExprNode, right: &ExprNode) -> String {
        let symbol = binary_symbol(operator);
        format!("{} {symbol} {}", self.stringify(left), self.stringify(right))
    }

    /// `<quantity>d<size|%><operator-suffix> (<faces>)`, e.g. `4d6kh3 (4, 4, 6, 3)`.
    fn dice(
        &self,
        quantity: usize,
        size: u32,
        percent: bool,
        dice: &[Die],
        operations: &[SetOperation],
    ) -> String {
        let prefix = dice_prefix(quantity, size, percent);
        let suffix = render_operations(operations);
        let faces = dice
            .iter()
            .map(|die| self.die_face(die))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{prefix}{suffix} ({faces})")
    }

    /// The face a single die shows, undecorated by default; overridden by
    /// renderers that highlight extreme or dropped dice. Rerolled or
    /// min/max-clamped dice render as `a -> b`, and a face that triggered an
    /// explosion gets a trailing `!`.
    fn die_face(&self, die: &Die) -> String {
        let mut text = die_face_text(die);
        if die.history.last().is_some_and(|face| face.exploded) {
            text.push('!');
        }
        text
    }

    /// `(<elements>)<operator-suffix>`, e.g. `(1, 2, 3)kh1`.
    fn set(&self, elements: &[SetElement], operations: &[SetOperation]) -> String {
        let rendered = elements
            .iter()
            .map(|element| self.stringify(&element.value))
            .collect::<Vec<_>>()
            .join(", ");
        let suffix = render_operations(operations);
        format!("({rendered}){suffix}")
    }

    fn parenthetical(&self, value: &ExprNode) -> String {
        format!("({})", self.stringify(value))
    }

    fn annotated(&self, value: &ExprNode, annotations: &[String]) -> String {
        let tags = annotations
            .iter()
            .map(|a| format!("[{a}]"))
            .collect::<Vec<_>>()
            .join("");
        format!("{}{tags}", self.stringify(value))
    }
}

fn dice_prefix(quantity: usize, size: u32, percent: bool) -> String {
    if percent {
        format!("{quantity}d%")
    } else {
        format!("{quantity}d{size}")
    }
}

/// The undecorated face text for a die: its plain value, or `a -> b` when
/// the die was rerolled (history has more than one face) or clamped by a
/// `mi`/`ma` adjustment.
fn die_face_text(die: &Die) -> String {
    if let Some(adjustment) = die.adjustments.first() {
        let previous = match adjustment {
            DieAdjustment::Minimum { previous, .. } => *previous,
            DieAdjustment::Maximum { previous, .. } => *previous,
        };
        format!("{} -> {}", format_number(previous), format_number(die.value))
    } else if die.history.len() > 1 {
        format!(
            "{} -> {}",
            format_number(die.history[0].value),
            format_number(die.value)
        )
    } else {
        format_number(die.value)
    }
}

/// Renders a set/dice operator chain back into its source notation, e.g.
/// `[Keep(Highest(3))]` -> `kh3`.
fn render_operations(operations: &[SetOperation]) -> String {
    operations
        .iter()
        .map(|operation| {
            let symbol = operator_symbol(operation.operator);
            let selectors = operation
                .selectors
                .iter()
                .map(render_selector)
                .collect::<String>();
            format!("{symbol}{selectors}")
        })
        .collect()
}

fn operator_symbol(operator: SetOperator) -> &'static str {
    match operator {
        SetOperator::Keep => "k",
        SetOperator::Drop => "p",
        SetOperator::Reroll => "rr",
        SetOperator::RerollOnce => "ro",
        SetOperator::RerollAdd => "ra",
        SetOperator::Explode => "e",
        SetOperator::Minimum => "mi",
        SetOperator::Maximum => "ma",
    }
}

fn render_selector(selector: &Selector) -> String {
    let prefix = match selector.kind {
        SelectorKind::Literal => "",
        SelectorKind::Highest => "h",
        SelectorKind::Lowest => "l",
        SelectorKind::GreaterThan => ">",
        SelectorKind::GreaterThanOrEqual => ">=",
        SelectorKind::LessThan => "<",
        SelectorKind::LessThanOrEqual => "<=",
        SelectorKind::EqualTo => "==",
        SelectorKind::NotEqual => "!=",
    };
    format!("{prefix}{}", render_node(&selector.target))
}

/// Renders an unevaluated AST node back to source text. Used only for
/// selector targets (`kh(1d4+1)`'s `1d4+1`) and dice sizes, which are never
/// evaluated ahead of the roll they gate.
fn render_node(node: &Node) -> String {
    match node {
        Node::Expression { roll, .. } => render_node(roll),
        Node::Literal(v) => format_number(*v),
        Node::AnnotatedNumber { value, annotations } => {
            let tags = annotations
                .iter()
                .map(|a| format!("[{a}]"))
                .collect::<String>();
            format!("{}{tags}", render_node(value))
        }
        Node::Parenthetical { value, operations } => {
            format!("({}){}", render_node(value), render_operations(operations))
        }
        Node::Unary { operator, operand } => {
            let symbol = match operator {
                UnaryOperator::Plus => "+",
                UnaryOperator::Minus => "-",
            };
            format!("{symbol}{}", render_node(operand))
        }
        Node::Binary {
            operator,
            left,
            right,
        } => format!(
            "({} {} {})",
            render_node(left),
            binary_symbol(*operator),
            render_node(right)
        ),
        Node::NumberSet { elements } => {
            let rendered = elements
                .iter()
                .map(render_node)
                .collect::<Vec<_>>()
                .join(", ");
            format!("({rendered})")
        }
        Node::OperatedSet { set, operations } => {
            format!("{}{}", render_node(set), render_operations(operations))
        }
        Node::Dice { num, size } => {
            let num = num
                .as_ref()
                .map(|n| render_node(n))
                .unwrap_or_else(|| String::from("1"));
            match size {
                DiceSize::Value(size) => format!("{num}d{}", render_node(size)),
                DiceSize::Percent => format!("{num}d%"),
            }
        }
        Node::OperatedDice { dice, operations } => {
            format!("{}{}", render_node(dice), render_operations(operations))
        }
    }
}

fn binary_symbol(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::IntDivide => "//",
        BinaryOperator::Modulo => "%",
        BinaryOperator::Equal => "==",
        BinaryOperator::NotEqual => "!=",
        BinaryOperator::Greater => ">",
        BinaryOperator::GreaterEqual => ">=",
        BinaryOperator::Less => "<",
        BinaryOperator::LessEqual => "<=",
    }
}

fn format_number(value: f64) -> String {
    if (value.round() - value).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value}")
    }
}

/// Renders exactly the values rolled, with no decoration: `4d6kh3 (4, 4, 6, 3)`.
/// This is the round-trip-safe rendering: it contains only grammar the
/// parser accepts, unlike [`MarkdownStringifier`]'s `**`/`~~` decoration.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleStringifier;

impl Stringifier for SimpleStringifier {}

/// Renders with Markdown emphasis: the highest face among more than one kept
/// die is bold, dropped dice and set elements are struck through, and a
/// dropped set element's contents fall back to [`SimpleStringifier`] so a
/// struck-through subtree isn't doubly decorated.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownStringifier;

impl Stringifier for MarkdownStringifier {
    fn dice(
        &self,
        quantity: usize,
        size: u32,
        percent: bool,
        dice: &[Die],
        operations: &[SetOperation],
    ) -> String {
        let prefix = dice_prefix(quantity, size, percent);
        let suffix = render_operations(operations);
        let highest = highest_kept(dice);

        let faces = dice
            .iter()
            .map(|die| {
                let rendered = self.die_face(die);
                if die.dropped {
                    format!("~~{rendered}~~")
                } else if die.kept && highest.is_some_and(|h| die.value == h) {
                    format!("**{rendered}**")
                } else {
                    rendered
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{prefix}{suffix} ({faces})")
    }

    fn set(&self, elements: &[SetElement], operations: &[SetOperation]) -> String {
        let suffix = render_operations(operations);
        let rendered = elements
            .iter()
            .map(|element| {
                if element.dropped {
                    format!("~~{}~~", SimpleStringifier.stringify(&element.value))
                } else {
                    self.stringify(&element.value)
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("({rendered}){suffix}")
    }
}

/// The highest value among kept dice, but only when more than one die is
/// kept — a lone surviving die (`1d20`) isn't a "highest" worth bolding.
fn highest_kept(dice: &[Die]) -> Option<f64> {
    if dice.iter().filter(|d| d.kept).count() < 2 {
        return None;
    }
    dice.iter()
        .filter(|d| d.kept)
        .map(|d| d.value)
        .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

/// Renders `node`'s result tree followed by its total, e.g.
/// `` 4d6kh3 (4, 4, **6**, ~~3~~) = `14` ``.
pub fn render_with_total(stringifier: &impl Stringifier, node: &ExprNode) -> String {
    format!("{} = `{}`", stringifier.stringify(node), format_number(node.total()))
}
