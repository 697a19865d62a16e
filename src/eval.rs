use std::cmp::Ordering;
use std::collections::HashSet;

use rand::RngCore;
use rand::distr::{Distribution, Uniform};

use crate::ast::{
    BinaryOperator, DiceSize, Node, Selector, SelectorKind, SetOperation, SetOperator,
    UnaryOperator,
};
use crate::context::RollContext;
use crate::error::RollError;
use crate::tree::{Die, DieAdjustment, DieFace, DieOrigin, ExprNode, SetElement};

type Result<T> = std::result::Result<T, RollError>;

const EPSILON: f64 = 1e-9;

/// Evaluates a parsed expression against a fresh default [`RollContext`],
/// using the thread-local RNG.
pub fn evaluate(expr: &Node) -> Result<ExprNode> {
    evaluate_with_rng(expr, &mut RollContext::default(), &mut rand::rng())
}

/// Evaluates a parsed expression with an injected RNG and a caller-supplied
/// [`RollContext`], so both determinism and resource budgets are under the
/// caller's control.
pub fn evaluate_with_rng<R>(expr: &Node, ctx: &mut RollContext, rng: &mut R) -> Result<ExprNode>
where
    R: RngCore,
{
    Evaluator { rng, ctx }.eval(expr)
}

struct Evaluator<'a, R: RngCore> {
    rng: &'a mut R,
    ctx: &'a mut RollContext,
}

impl<'a, R: RngCore> Evaluator<'a, R> {
    fn eval(&mut self, node: &Node) -> Result<ExprNode> {
        self.ctx.tick_ast_operation()?;
        match node {
            Node::Expression { roll, comment } => {
                let value = self.eval(roll)?;
                Ok(ExprNode::Expression {
                    value: Box::new(value),
                    comment: comment.clone(),
                })
            }
            Node::Literal(v) => Ok(ExprNode::Literal(*v)),
            Node::Unary { operator, operand } => {
                let evaluated = self.eval(operand)?;
                let total = match operator {
                    UnaryOperator::Plus => evaluated.total(),
                    UnaryOperator::Minus => -evaluated.total(),
                };
                Ok(ExprNode::Unary {
                    operator: *operator,
                    total,
                    operand: Box::new(evaluated),
                })
            }
            Node::Binary {
                operator,
                left,
                right,
            } => {
                let left_eval = self.eval(left)?;
                let right_eval = self.eval(right)?;
                let total = Self::eval_binary(*operator, left_eval.total(), right_eval.total())?;
                Ok(ExprNode::Binary {
                    operator: *operator,
                    total,
                    left: Box::new(left_eval),
                    right: Box::new(right_eval),
                })
            }
            Node::Dice { num, size } => self.eval_dice(num.as_deref(), size, &[]),
            Node::OperatedDice { dice, operations } => match dice.as_ref() {
                Node::Dice { num, size } => self.eval_dice(num.as_deref(), size, operations),
                other => Err(RollError::Internal(format!(
                    "OperatedDice must wrap a Dice node, found {other:?}"
                ))),
            },
            Node::NumberSet { elements } => self.eval_set(elements, &[]),
            Node::OperatedSet { set, operations } => match set.as_ref() {
                Node::NumberSet { elements } => self.eval_set(elements, operations),
                other => Err(RollError::Internal(format!(
                    "OperatedSet must wrap a NumberSet node, found {other:?}"
                ))),
            },
            Node::Parenthetical { value, operations } => {
                self.eval_parenthetical(value, operations)
            }
            Node::AnnotatedNumber { value, annotations } => {
                let evaluated = self.eval(value)?;
                Ok(ExprNode::AnnotatedNumber {
                    value: Box::new(evaluated),
                    annotations: annotations.clone(),
                })
            }
        }
    }

    fn eval_binary(operator: BinaryOperator, left: f64, right: f64) -> Result<f64> {
        match operator {
            BinaryOperator::Add => Ok(left + right),
            BinaryOperator::Subtract => Ok(left - right),
            BinaryOperator::Multiply => Ok(left * right),
            BinaryOperator::Divide => {
                if right == 0.0 {
                    return Err(RollError::value("division by zero"));
                }
                Ok(left / right)
            }
            BinaryOperator::IntDivide => {
                if right == 0.0 {
                    return Err(RollError::value("division by zero"));
                }
                Ok((left / right).trunc())
            }
            BinaryOperator::Modulo => {
                if right == 0.0 {
                    return Err(RollError::value("division by zero"));
                }
                Ok(left % right)
            }
            BinaryOperator::Equal => Ok((left == right) as i32 as f64),
            BinaryOperator::NotEqual => Ok((left != right) as i32 as f64),
            BinaryOperator::Greater => Ok((left > right) as i32 as f64),
            BinaryOperator::GreaterEqual => Ok((left >= right) as i32 as f64),
            BinaryOperator::Less => Ok((left < right) as i32 as f64),
            BinaryOperator::LessEqual => Ok((left <= right) as i32 as f64),
        }
    }

    /// `(E)` with trailing operations, e.g. `(4d6)kh3`. Dice-shaped inner
    /// values delegate to the dice-operator engine; anything else is
    /// treated as an implicit one-element set, which only accepts
    /// keep/drop (mirroring `(1, 2)rr1` being a value error).
    fn eval_parenthetical(
        &mut self,
        value: &Node,
        operations: &[SetOperation],
    ) -> Result<ExprNode> {
        let inner = self.eval(value)?;
        if operations.is_empty() {
            return Ok(ExprNode::Parenthetical {
                value: Box::new(inner),
                operations: Vec::new(),
            });
        }

        match inner {
            ExprNode::Dice {
                quantity,
                size,
                percent,
                mut dice,
                operations: mut existing_ops,
            } => {
                let distribution = dice_distribution(percent, size)?;
                self.apply_dice_operations(&mut dice, &distribution, operations, percent)?;
                for die in &mut dice {
                    die.refresh_drop_state();
                }
                existing_ops.extend_from_slice(operations);
                Ok(ExprNode::Dice {
                    quantity,
                    size,
                    percent,
                    dice,
                    operations: existing_ops,
                })
            }
            other => {
                let mut elements = vec![SetElement {
                    value: other,
                    kept: true,
                    dropped: false,
                }];
                self.apply_set_operations(&mut elements, operations)?;
                for element in &mut elements {
                    element.refresh_drop_state();
                }
                Ok(ExprNode::Set {
                    elements,
                    operations: operations.to_vec(),
                })
            }
        }
    }

    fn eval_dice(
        &mut self,
        quantity: Option<&Node>,
        size: &DiceSize,
        operations: &[SetOperation],
    ) -> Result<ExprNode> {
        let quantity_value = match quantity {
            Some(node) => {
                let result = self.eval(node)?;
                self.as_usize(result.total(), "dice quantity")?
            }
            None => 1,
        };

        let percent = matches!(size, DiceSize::Percent);
        let die_high = match size {
            DiceSize::Percent => 10,
            DiceSize::Value(inner) => {
                let result = self.eval(inner)?;
                self.as_u32_allow_zero(result.total(), "die size")?
            }
        };

        let mut dice = Vec::with_capacity(quantity_value);
        if die_high == 0 {
            // A zero-sided die is benign: every face is 0, no RNG needed.
            for _ in 0..quantity_value {
                dice.push(Die::new(0.0, DieOrigin::Original));
            }
        } else {
            let distribution = dice_distribution(percent, die_high)?;
            for _ in 0..quantity_value {
                let roll = self.roll_die(&distribution, percent)?;
                dice.push(Die::new(roll, DieOrigin::Original));
            }
            self.apply_dice_operations(&mut dice, &distribution, operations, percent)?;
        }

        for die in &mut dice {
            die.refresh_drop_state();
        }

        Ok(ExprNode::Dice {
            quantity: quantity_value,
            size: die_high,
            percent,
            dice,
            operations: operations.to_vec(),
        })
    }

    fn eval_set(&mut self, elements: &[Node], operations: &[SetOperation]) -> Result<ExprNode> {
        let mut evaluated_elements = Vec::with_capacity(elements.len());
        for element in elements {
            let value = self.eval(element)?;
            evaluated_elements.push(SetElement {
                value,
                kept: true,
                dropped: false,
            });
        }

        self.apply_set_operations(&mut evaluated_elements, operations)?;
        for element in &mut evaluated_elements {
            element.refresh_drop_state();
        }
        Ok(ExprNode::Set {
            elements: evaluated_elements,
            operations: operations.to_vec(),
        })
    }

    fn roll_die(&mut self, distribution: &Uniform<u32>, percent: bool) -> Result<f64> {
        self.ctx.tick_roll()?;
        let mut value = distribution.sample(self.rng) as f64;
        if percent {
            value *= 10.0;
        }
        Ok(value)
    }

    fn as_usize(&self, value: f64, context: &str) -> Result<usize> {
        if value < 0.0 {
            return Err(RollError::value(format!("{context} must be non-negative")));
        }
        if (value.round() - value).abs() > EPSILON {
            return Err(RollError::value(format!(
                "{context} must be an integer, found {value}"
            )));
        }
        Ok(value.round() as usize)
    }

    /// Like `as_usize`, but specifically for die sizes: negative is
    /// rejected, but zero is a benign degenerate die (every face is 0).
    fn as_u32_allow_zero(&self, value: f64, context: &str) -> Result<u32> {
        if value < 0.0 {
            return Err(RollError::value(format!("{context} must be non-negative")));
        }
        if (value.round() - value).abs() > EPSILON {
            return Err(RollError::value(format!(
                "{context} must be an integer, found {value}"
            )));
        }
        Ok(value.round() as u32)
    }

    fn apply_dice_operations(
        &mut self,
        dice: &mut Vec<Die>,
        distribution: &Uniform<u32>,
        operations: &[SetOperation],
        percent: bool,
    ) -> Result<()> {
        for operation in operations {
            match operation.operator {
                SetOperator::Keep => {
                    let selected = self.select_dice(dice, &operation.selectors)?;
                    let selected: HashSet<_> = selected.into_iter().collect();
                    for (idx, die) in dice.iter_mut().enumerate() {
                        if die.kept {
                            die.kept = selected.contains(&idx);
                        }
                    }
                }
                SetOperator::Drop => {
                    let selected = self.select_dice(dice, &operation.selectors)?;
                    for idx in selected {
                        if let Some(die) = dice.get_mut(idx) {
                            die.kept = false;
                        }
                    }
                }
                SetOperator::Reroll => loop {
                    let selected = self.select_dice(dice, &operation.selectors)?;
                    if selected.is_empty() {
                        break;
                    }
                    let mut changed = false;
                    for idx in selected {
                        if let Some(die) = dice.get_mut(idx) {
                            let new_value = self.roll_die(distribution, percent)?;
                            die.history.push(DieFace {
                                value: new_value,
                                exploded: false,
                            });
                            die.value = new_value;
                            changed = true;
                        }
                    }
                    if !changed {
                        break;
                    }
                },
                SetOperator::RerollOnce => {
                    let selected = self.select_dice(dice, &operation.selectors)?;
                    for idx in selected {
                        if let Some(die) = dice.get_mut(idx) {
                            let new_value = self.roll_die(distribution, percent)?;
                            die.history.push(DieFace {
                                value: new_value,
                                exploded: false,
                            });
                            die.value = new_value;
                        }
                    }
                }
                SetOperator::RerollAdd => {
                    // Resolved in favor of the newer wording: one new die
                    // added per *application* of `ra`, not one per match.
                    let selected = self.select_dice(dice, &operation.selectors)?;
                    if !selected.is_empty() {
                        let new_value = self.roll_die(distribution, percent)?;
                        dice.push(Die::new(new_value, DieOrigin::RerollAdd));
                    }
                }
                SetOperator::Explode => {
                    let mut queue = self.select_dice(dice, &operation.selectors)?;
                    let mut idx = 0;
                    while idx < queue.len() {
                        let trigger_idx = queue[idx];
                        idx += 1;
                        if let Some(die) = dice.get_mut(trigger_idx) {
                            if let Some(face) = die.history.last_mut() {
                                face.exploded = true;
                            }
                        }
                        let new_value = self.roll_die(distribution, percent)?;
                        let new_die = Die::new(new_value, DieOrigin::Explosion);
                        dice.push(new_die);
                        let new_idx = dice.len() - 1;
                        let matches = self
                            .select_dice(dice, &operation.selectors)?
                            .into_iter()
                            .any(|i| i == new_idx);
                        if matches {
                            queue.push(new_idx);
                        }
                    }
                }
                SetOperator::Minimum => self.apply_clamp(dice, operation, true)?,
                SetOperator::Maximum => self.apply_clamp(dice, operation, false)?,
            }
        }
        Ok(())
    }

    fn apply_clamp(
        &mut self,
        dice: &mut [Die],
        operation: &SetOperation,
        minimum: bool,
    ) -> Result<()> {
        let label = if minimum { "Minimum" } else { "Maximum" };
        if operation.selectors.is_empty() {
            return Err(RollError::value(format!(
                "{label} operation requires a selector"
            )));
        }
        if operation.selectors[0].kind != SelectorKind::Literal {
            return Err(RollError::value("selector target must be positive"));
        }
        let threshold = self.eval(&operation.selectors[0].target)?.total();
        if minimum && threshold <= 0.0 {
            return Err(RollError::value("selector target must be positive"));
        }
        let affected = if operation.selectors.len() > 1 {
            self.select_dice(dice, &operation.selectors[1..])?
        } else {
            dice.iter()
                .enumerate()
                .filter(|(_, die)| die.kept)
                .map(|(idx, _)| idx)
                .collect()
        };
        for idx in affected {
            if let Some(die) = dice.get_mut(idx) {
                let breaches = if minimum {
                    die.value < threshold
                } else {
                    die.value > threshold
                };
                if breaches {
                    let previous = die.value;
                    die.value = threshold;
                    die.adjustments.push(if minimum {
                        DieAdjustment::Minimum {
                            threshold,
                            previous,
                        }
                    } else {
                        DieAdjustment::Maximum {
                            threshold,
                            previous,
                        }
                    });
                }
            }
        }
        Ok(())
    }

    fn apply_set_operations(
        &mut self,
        elements: &mut [SetElement],
        operations: &[SetOperation],
    ) -> Result<()> {
        let mut keep_initialized = false;
        for operation in operations {
            match operation.operator {
                SetOperator::Keep => {
                    let selected =
                        self.select_set_elements(elements, &operation.selectors, false)?;
                    if !keep_initialized {
                        for element in elements.iter_mut() {
                            element.kept = false;
                        }
                        keep_initialized = true;
                    }
                    for idx in selected {
                        if let Some(element) = elements.get_mut(idx) {
                            element.kept = true;
                        }
                    }
                }
                SetOperator::Drop => {
                    let selected =
                        self.select_set_elements(elements, &operation.selectors, true)?;
                    for idx in selected {
                        if let Some(element) = elements.get_mut(idx) {
                            element.kept = false;
                        }
                    }
                }
                other => {
                    return Err(RollError::value(format!(
                        "set operation {other:?} is not valid against a plain set"
                    )));
                }
            }
        }
        Ok(())
    }

    fn select_dice(&mut self, dice: &[Die], selectors: &[Selector]) -> Result<Vec<usize>> {
        if selectors.is_empty() {
            return Ok(Vec::new());
        }
        let mut selected = HashSet::new();
        for selector in selectors {
            let mut indices = match selector.kind {
                SelectorKind::Highest => {
                    let value = self.eval(&selector.target)?.total();
                    let count = self.as_usize(value, "selector")?;
                    self.select_highest(dice, count)
                }
                SelectorKind::Lowest => {
                    let value = self.eval(&selector.target)?.total();
                    let count = self.as_usize(value, "selector")?;
                    self.select_lowest(dice, count)
                }
                SelectorKind::GreaterThan => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| v > value)
                }
                SelectorKind::GreaterThanOrEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| v >= value)
                }
                SelectorKind::LessThan => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| v < value)
                }
                SelectorKind::LessThanOrEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| v <= value)
                }
                SelectorKind::EqualTo | SelectorKind::Literal => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| (v - value).abs() <= EPSILON)
                }
                SelectorKind::NotEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_value(dice, |v| (v - value).abs() > EPSILON)
                }
            }?;
            selected.extend(indices.drain(..));
        }
        let mut collected: Vec<_> = selected.into_iter().collect();
        collected.sort_unstable();
        Ok(collected)
    }

    fn select_set_elements(
        &mut self,
        elements: &[SetElement],
        selectors: &[Selector],
        only_kept: bool,
    ) -> Result<Vec<usize>> {
        if selectors.is_empty() {
            return Ok(Vec::new());
        }
        let mut selected = HashSet::new();
        for selector in selectors {
            let mut indices = match selector.kind {
                SelectorKind::Highest => {
                    let value = self.eval(&selector.target)?.total();
                    let count = self.as_usize(value, "selector")?;
                    self.select_set_highest(elements, count, only_kept)
                }
                SelectorKind::Lowest => {
                    let value = self.eval(&selector.target)?.total();
                    let count = self.as_usize(value, "selector")?;
                    self.select_set_lowest(elements, count, only_kept)
                }
                SelectorKind::GreaterThan => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| v > value, only_kept)
                }
                SelectorKind::GreaterThanOrEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| v >= value, only_kept)
                }
                SelectorKind::LessThan => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| v < value, only_kept)
                }
                SelectorKind::LessThanOrEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| v <= value, only_kept)
                }
                SelectorKind::EqualTo | SelectorKind::Literal => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| (v - value).abs() <= EPSILON, only_kept)
                }
                SelectorKind::NotEqual => {
                    let value = self.eval(&selector.target)?.total();
                    self.select_set_value(elements, |v| (v - value).abs() > EPSILON, only_kept)
                }
            }?;
            selected.extend(indices.drain(..));
        }
        let mut collected: Vec<_> = selected.into_iter().collect();
        collected.sort_unstable();
        Ok(collected)
    }

    fn select_highest(&self, dice: &[Die], count: usize) -> Result<Vec<usize>> {
        let mut indices: Vec<_> = dice
            .iter()
            .enumerate()
            .filter(|(_, die)| die.kept)
            .map(|(idx, _)| idx)
            .collect();
        indices.sort_by(|a, b| compare_desc(dice[*a].value, dice[*b].value));
        indices.truncate(count.min(indices.len()));
        Ok(indices)
    }

    fn select_lowest(&self, dice: &[Die], count: usize) -> Result<Vec<usize>> {
        let mut indices: Vec<_> = dice
            .iter()
            .enumerate()
            .filter(|(_, die)| die.kept)
            .map(|(idx, _)| idx)
            .collect();
        indices.sort_by(|a, b| compare_asc(dice[*a].value, dice[*b].value));
        indices.truncate(count.min(indices.len()));
        Ok(indices)
    }

    fn select_value<F>(&self, dice: &[Die], predicate: F) -> Result<Vec<usize>>
    where
        F: Fn(f64) -> bool,
    {
        Ok(dice
            .iter()
            .enumerate()
            .filter(|(_, die)| die.kept && predicate(die.value))
            .map(|(idx, _)| idx)
            .collect())
    }

    fn select_set_highest(
        &self,
        elements: &[SetElement],
        count: usize,
        only_kept: bool,
    ) -> Result<Vec<usize>> {
        let mut indices: Vec<_> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| !only_kept || element.kept)
            .map(|(idx, _)| idx)
            .collect();
        indices
            .sort_by(|a, b| compare_desc(elements[*a].value.total(), elements[*b].value.total()));
        indices.truncate(count.min(indices.len()));
        Ok(indices)
    }

    fn select_set_lowest(
        &self,
        elements: &[SetElement],
        count: usize,
        only_kept: bool,
    ) -> Result<Vec<usize>> {
        let mut indices: Vec<_> = elements
            .iter()
            .enumerate()
            .filter(|(_, element)| !only_kept || element.kept)
            .map(|(idx, _)| idx)
            .collect();
        indices
            .sort_by(|a, b| compare_asc(elements[*a].value.total(), elements[*b].value.total()));
        indices.truncate(count.min(indices.len()));
        Ok(indices)
    }

    fn select_set_value<F>(
        &self,
        elements: &[SetElement],
        predicate: F,
        only_kept: bool,
    ) -> Result<Vec<usize>>
    where
        F: Fn(f64) -> bool,
    {
        Ok(elements
            .iter()
            .enumerate()
            .filter(|(_, element)| {
                (!only_kept || element.kept) && predicate(element.value.total())
            })
            .map(|(idx, _)| idx)
            .collect())
    }
}

fn compare_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn compare_asc(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn dice_distribution(percent: bool, die_high: u32) -> Result<Uniform<u32>> {
    let low = if percent { 0 } else { 1 };
    Uniform::new_inclusive(low, die_high)
        .map_err(|err| RollError::value(format!("invalid die size {die_high}: {err}")))
}
