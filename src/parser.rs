use crate::ast::{
    BinaryOperator, DiceSize, Node, Selector, SelectorKind, SetOperation, SetOperator,
    UnaryOperator,
};
use crate::error::RollError;
use crate::lexer::Lexer;
use crate::token::Token;

type Result<T> = std::result::Result<T, RollError>;

/// Parses a single expression, returning the `Node::Expression` the grammar
/// always produces.
///
/// When `allow_comments` is true, trailing text the grammar can't make sense
/// of is not a syntax error: it's sliced off verbatim (trimmed) and attached
/// as the expression's `comment`.
pub(crate) fn parse(input: &str, allow_comments: bool) -> Result<Node> {
    let mut parser = Parser::new(input)?;
    let roll = parser.parse_comparison()?;

    if parser.cur_token == Token::Eof {
        return Ok(Node::Expression {
            roll: Box::new(roll),
            comment: None,
        });
    }

    if !allow_comments {
        return Err(RollError::syntax_at(
            format!("unexpected trailing input: {:?}", parser.cur_token),
            parser.cur_token_start,
        ));
    }

    let comment = parser
        .lexer
        .raw_from(parser.cur_token_start)
        .trim()
        .to_string();
    Ok(Node::Expression {
        roll: Box::new(roll),
        comment: Some(comment),
    })
}

struct Parser<'a> {
    lexer: Lexer,
    cur_token: Token,
    cur_token_start: usize,
    input: &'a str,
    // Prevents selector targets (`kh(1d4+1)`) from themselves picking up
    // further set operations or annotations; they're plain numeric
    // sub-expressions, not standalone rollable atoms.
    selector_depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let cur_token_start = lexer.current_pos();
        let cur_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            cur_token,
            cur_token_start,
            input,
            selector_depth: 0,
        })
    }

    fn advance(&mut self) -> Result<()> {
        self.cur_token_start = self.lexer.current_pos();
        self.cur_token = self.lexer.next_token()?;
        Ok(())
    }

    fn eat(&mut self, expected: &Token) -> Result<()> {
        if std::mem::discriminant(&self.cur_token) == std::mem::discriminant(expected) {
            self.advance()
        } else {
            Err(RollError::syntax_at(
                format!(
                    "expected {:?}, got {:?} in '{}'",
                    expected, self.cur_token, self.input
                ),
                self.cur_token_start,
            ))
        }
    }

    // comparison -> additive ( ('==' | '!=' | '>' | '>=' | '<' | '<=') additive )*
    fn parse_comparison(&mut self) -> Result<Node> {
        let mut node = self.parse_additive()?;
        loop {
            let operator = match self.cur_token {
                Token::EqualEqual => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::Greater => BinaryOperator::Greater,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                Token::Less => BinaryOperator::Less,
                Token::LessEqual => BinaryOperator::LessEqual,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            node = Node::Binary {
                operator,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    // additive -> multiplicative ( ('+' | '-') multiplicative )*
    fn parse_additive(&mut self) -> Result<Node> {
        let mut node = self.parse_multiplicative()?;
        loop {
            let operator = match self.cur_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            node = Node::Binary {
                operator,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    // multiplicative -> unary ( ('*' | '/' | '//' | '%') unary )*
    fn parse_multiplicative(&mut self) -> Result<Node> {
        let mut node = self.parse_unary()?;
        loop {
            let operator = match self.cur_token {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::DoubleSlash => BinaryOperator::IntDivide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            node = Node::Binary {
                operator,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
        Ok(node)
    }

    // unary -> ('+' | '-') unary | postfix
    fn parse_unary(&mut self) -> Result<Node> {
        match self.cur_token {
            Token::Plus => {
                self.advance()?;
                Ok(Node::Unary {
                    operator: UnaryOperator::Plus,
                    operand: Box::new(self.parse_unary()?),
                })
            }
            Token::Minus => {
                self.advance()?;
                Ok(Node::Unary {
                    operator: UnaryOperator::Minus,
                    operand: Box::new(self.parse_unary()?),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    // postfix -> atom (set-operation)* (annotation)*
    fn parse_postfix(&mut self) -> Result<Node> {
        let node = self.parse_atom()?;
        let node = self.parse_modifiers(node)?;
        self.parse_annotations(node)
    }

    fn parse_atom(&mut self) -> Result<Node> {
        match self.cur_token.clone() {
            Token::Number(value) => {
                self.advance()?;
                if matches!(self.cur_token, Token::Dice | Token::DicePercent) {
                    self.parse_dice_literal(Some(Node::Literal(value)))
                } else {
                    Ok(Node::Literal(value))
                }
            }
            Token::Dice | Token::DicePercent => self.parse_dice_literal(None),
            Token::LParen => self.parse_parenthesized_or_set(),
            Token::AnnotationStart => Err(RollError::syntax_at(
                "unexpected annotation start; annotations must follow an expression",
                self.cur_token_start,
            )),
            other => Err(RollError::syntax_at(
                format!("unexpected token {:?} in '{}'", other, self.input),
                self.cur_token_start,
            )),
        }
    }

    fn parse_dice_literal(&mut self, quantity: Option<Node>) -> Result<Node> {
        match self.cur_token.clone() {
            Token::Dice => {
                self.advance()?;
                let faces = match self.cur_token.clone() {
                    Token::Number(value) => {
                        self.advance()?;
                        Node::Literal(value)
                    }
                    other => {
                        return Err(RollError::syntax_at(
                            format!(
                                "expected die size after 'd', found {:?} in '{}'",
                                other, self.input
                            ),
                            self.cur_token_start,
                        ));
                    }
                };
                Ok(Node::Dice {
                    num: quantity.map(Box::new),
                    size: DiceSize::Value(Box::new(faces)),
                })
            }
            Token::DicePercent => {
                self.advance()?;
                Ok(Node::Dice {
                    num: quantity.map(Box::new),
                    size: DiceSize::Percent,
                })
            }
            _ => Err(RollError::syntax_at(
                format!("invalid dice expression in '{}'", self.input),
                self.cur_token_start,
            )),
        }
    }

    // '(' ')' -> empty set
    // '(' expr ')' -> parenthetical
    // '(' expr ',' ')' | '(' expr (',' expr)+ ')' -> set
    fn parse_parenthesized_or_set(&mut self) -> Result<Node> {
        self.eat(&Token::LParen)?;

        if self.cur_token == Token::RParen {
            self.advance()?;
            return Ok(Node::NumberSet { elements: vec![] });
        }

        let first = self.parse_comparison()?;
        let mut elements = vec![first];
        let mut is_set = false;

        while self.cur_token == Token::Comma {
            is_set = true;
            self.advance()?;
            if self.cur_token == Token::RParen {
                break;
            }
            elements.push(self.parse_comparison()?);
        }

        self.eat(&Token::RParen)?;

        if is_set {
            Ok(Node::NumberSet { elements })
        } else {
            Ok(Node::Parenthetical {
                value: Box::new(elements.pop().expect("at least one element present")),
                operations: vec![],
            })
        }
    }

    fn parse_modifiers(&mut self, node: Node) -> Result<Node> {
        if self.selector_depth > 0 {
            return Ok(node);
        }

        let mut operations = Vec::new();
        loop {
            let (operator, symbol) = match self.cur_token {
                Token::Keep => {
                    self.advance()?;
                    (SetOperator::Keep, "k")
                }
                Token::Drop => {
                    self.advance()?;
                    (SetOperator::Drop, "p")
                }
                Token::Reroll => {
                    self.advance()?;
                    (SetOperator::Reroll, "rr")
                }
                Token::RerollOnce => {
                    self.advance()?;
                    (SetOperator::RerollOnce, "ro")
                }
                Token::RerollAdd => {
                    self.advance()?;
                    (SetOperator::RerollAdd, "ra")
                }
                Token::Explode => {
                    self.advance()?;
                    (SetOperator::Explode, "!")
                }
                Token::Min => {
                    self.advance()?;
                    (SetOperator::Minimum, "mi")
                }
                Token::Max => {
                    self.advance()?;
                    (SetOperator::Maximum, "ma")
                }
                _ => break,
            };

            let selectors = self.parse_selector_list(symbol, operator)?;
            operations.push(SetOperation {
                operator,
                selectors,
            });
        }

        if operations.is_empty() {
            return Ok(node);
        }

        match node {
            dice @ Node::Dice { .. } => Ok(Node::OperatedDice {
                dice: Box::new(dice),
                operations,
            }),
            Node::OperatedDice {
                dice,
                operations: mut existing,
            } => {
                existing.extend(operations);
                Ok(Node::OperatedDice {
                    dice,
                    operations: existing,
                })
            }
            set @ Node::NumberSet { .. } => Ok(Node::OperatedSet {
                set: Box::new(set),
                operations,
            }),
            Node::OperatedSet {
                set,
                operations: mut existing,
            } => {
                existing.extend(operations);
                Ok(Node::OperatedSet {
                    set,
                    operations: existing,
                })
            }
            Node::Parenthetical {
                value,
                operations: mut existing,
            } => {
                existing.extend(operations);
                Ok(Node::Parenthetical {
                    value,
                    operations: existing,
                })
            }
            other => Err(RollError::syntax_at(
                format!("set operations cannot be applied to {:?}", other),
                self.cur_token_start,
            )),
        }
    }

    fn parse_selector_list(
        &mut self,
        symbol: &str,
        operator: SetOperator,
    ) -> Result<Vec<Selector>> {
        if !self.is_selector_start(&self.cur_token) {
            return Err(RollError::syntax_at(
                format!("expected selector after '{}' in '{}'", symbol, self.input),
                self.cur_token_start,
            ));
        }

        let mut selectors = Vec::new();
        while self.is_selector_start(&self.cur_token) {
            selectors.push(self.parse_selector()?);
        }

        if selectors.is_empty() {
            return Err(RollError::syntax_at(
                format!("operator {:?} must be followed by at least one selector", operator),
                self.cur_token_start,
            ));
        }

        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector> {
        let (kind, prefix) = match self.cur_token {
            Token::SelectorHigh => {
                self.advance()?;
                (SelectorKind::Highest, "h")
            }
            Token::SelectorLow => {
                self.advance()?;
                (SelectorKind::Lowest, "l")
            }
            Token::Greater => {
                self.advance()?;
                (SelectorKind::GreaterThan, ">")
            }
            Token::GreaterEqual => {
                self.advance()?;
                (SelectorKind::GreaterThanOrEqual, ">=")
            }
            Token::Less => {
                self.advance()?;
                (SelectorKind::LessThan, "<")
            }
            Token::LessEqual => {
                self.advance()?;
                (SelectorKind::LessThanOrEqual, "<=")
            }
            Token::EqualEqual => {
                self.advance()?;
                (SelectorKind::EqualTo, "==")
            }
            Token::NotEqual => {
                self.advance()?;
                (SelectorKind::NotEqual, "!=")
            }
            _ => (SelectorKind::Literal, "literal"),
        };

        if !self.selector_value_starts(&self.cur_token) {
            let label = if kind == SelectorKind::Literal {
                "selector"
            } else {
                prefix
            };
            return Err(RollError::syntax_at(
                format!(
                    "expected selector target after '{}' in '{}'",
                    label, self.input
                ),
                self.cur_token_start,
            ));
        }

        let target = self.with_selector_context(|parser| parser.parse_selector_value_inner())?;
        Ok(Selector {
            kind,
            target: Box::new(target),
        })
    }

    fn is_selector_start(&self, token: &Token) -> bool {
        matches!(
            token,
            Token::SelectorHigh
                | Token::SelectorLow
                | Token::Greater
                | Token::GreaterEqual
                | Token::Less
                | Token::LessEqual
                | Token::EqualEqual
                | Token::NotEqual
                | Token::Plus
                | Token::Minus
                | Token::Number(_)
                | Token::LParen
                | Token::Dice
                | Token::DicePercent
        )
    }

    fn selector_value_starts(&self, token: &Token) -> bool {
        matches!(
            token,
            Token::Plus
                | Token::Minus
                | Token::Number(_)
                | Token::LParen
                | Token::Dice
                | Token::DicePercent
        )
    }

    fn with_selector_context<F>(&mut self, f: F) -> Result<Node>
    where
        F: FnOnce(&mut Self) -> Result<Node>,
    {
        self.selector_depth += 1;
        let result = f(self);
        self.selector_depth -= 1;
        result
    }

    // A selector's target is a single numeric atom (optionally unary-negated
    // or parenthesized); it never picks up its own set operations or
    // annotations, so this doesn't go through parse_postfix.
    fn parse_selector_value_inner(&mut self) -> Result<Node> {
        match self.cur_token.clone() {
            Token::Plus => {
                self.advance()?;
                Ok(Node::Unary {
                    operator: UnaryOperator::Plus,
                    operand: Box::new(self.parse_selector_value_inner()?),
                })
            }
            Token::Minus => {
                self.advance()?;
                Ok(Node::Unary {
                    operator: UnaryOperator::Minus,
                    operand: Box::new(self.parse_selector_value_inner()?),
                })
            }
            Token::Number(value) => {
                self.advance()?;
                if matches!(self.cur_token, Token::Dice | Token::DicePercent) {
                    self.parse_dice_literal(Some(Node::Literal(value)))
                } else {
                    Ok(Node::Literal(value))
                }
            }
            Token::Dice | Token::DicePercent => self.parse_dice_literal(None),
            Token::LParen => {
                self.advance()?;
                if self.cur_token == Token::RParen {
                    return Err(RollError::syntax_at(
                        "empty parentheses are not a valid selector target",
                        self.cur_token_start,
                    ));
                }
                let expr = self.parse_comparison()?;
                self.eat(&Token::RParen)?;
                Ok(expr)
            }
            other => Err(RollError::syntax_at(
                format!(
                    "invalid selector target starting with {:?} in '{}'",
                    other, self.input
                ),
                self.cur_token_start,
            )),
        }
    }

    fn parse_annotations(&mut self, node: Node) -> Result<Node> {
        if self.selector_depth > 0 {
            return Ok(node);
        }

        let base = node;
        let mut annotations = Vec::new();

        while self.cur_token == Token::AnnotationStart {
            self.advance()?;
            let text = match self.cur_token.clone() {
                Token::AnnotationText(value) => {
                    self.advance()?;
                    value
                }
                other => {
                    return Err(RollError::syntax_at(
                        format!(
                            "expected annotation text, found {:?} in '{}'",
                            other, self.input
                        ),
                        self.cur_token_start,
                    ));
                }
            };

            self.eat(&Token::AnnotationEnd)?;
            annotations.push(text);
        }

        if annotations.is_empty() {
            return Ok(base);
        }

        match base {
            Node::AnnotatedNumber {
                value,
                annotations: mut existing,
            } => {
                existing.extend(annotations);
                Ok(Node::AnnotatedNumber {
                    value,
                    annotations: existing,
                })
            }
            other => Ok(Node::AnnotatedNumber {
                value: Box::new(other),
                annotations,
            }),
        }
    }
}
