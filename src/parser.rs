use crate::ast::{ArithOp, Block, BooleanOp, Expr, NumericExpr, RelationalOp, Stmt, StringExpr};
use crate::error::{BasicError, Location};
use crate::lexer::{Lexeme, LexemeKind, Lexer};
use crate::number::Number;

/// Keywords that terminate a block instead of starting a statement.
const BLOCK_TERMINATORS: [&str; 5] = ["end", "else", "elseif", "next", "loop"];

/// True when an identifier names a string variable (trailing `$`).
pub fn is_string_identifier(identifier: &str) -> bool {
    identifier.ends_with('$')
}

fn kind_name(kind: LexemeKind) -> &'static str {
    match kind {
        LexemeKind::Word => "identifier or keyword",
        LexemeKind::Symbol => "operator",
        LexemeKind::Number => "numeric literal",
        LexemeKind::Str => "string literal",
        LexemeKind::EndOfStatement => "end of line",
    }
}

fn single_statement_block(statement: Stmt) -> Block {
    Block {
        statements: vec![statement],
        ..Block::default()
    }
}

/// One parsed source line: either a statement (with its optional label) or
/// the block-terminator keyword that ended the enclosing block.
enum Line {
    Statement {
        label: Option<String>,
        statement: Stmt,
    },
    Terminator(String),
}

/// Recursive-descent parser driving the lexer with one lexeme of look-ahead.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peek: Option<Lexeme>,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self, BasicError> {
        let peek = lexer.next_lexeme()?;
        Ok(Self { lexer, peek })
    }

    /// Parse a whole program. The root block may end at end-of-file, or at
    /// an `END` keyword with nothing but a final newline after it.
    pub fn parse(&mut self) -> Result<Block, BasicError> {
        let (block, terminator) = self.parse_block()?;

        if let Some(terminator) = terminator {
            if terminator != "end" {
                return Err(self.error_at_peek(&format!(
                    "Unexpected {}, expected END or end-of-file",
                    terminator
                )));
            }
            self.accept(LexemeKind::EndOfStatement, None)?;
            if self.peek.is_some() {
                return Err(self.error_at_peek("Unexpected input after END"));
            }
        }

        Ok(block)
    }

    // ----- lexeme plumbing -----

    fn advance(&mut self) -> Result<Option<Lexeme>, BasicError> {
        let current = self.peek.take();
        self.peek = self.lexer.next_lexeme()?;
        Ok(current)
    }

    /// Consume and return the look-ahead if it matches the given kind (and,
    /// optionally, value).
    fn accept(
        &mut self,
        kind: LexemeKind,
        value: Option<&str>,
    ) -> Result<Option<Lexeme>, BasicError> {
        let matches = match &self.peek {
            Some(lexeme) => lexeme.kind == kind && value.map_or(true, |v| lexeme.value == v),
            None => false,
        };

        if matches {
            self.advance()
        } else {
            Ok(None)
        }
    }

    /// Like `accept`, but a mismatch is a syntax error at the offending
    /// lexeme.
    fn expect(&mut self, kind: LexemeKind, value: Option<&str>) -> Result<Lexeme, BasicError> {
        if let Some(lexeme) = self.accept(kind, value)? {
            return Ok(lexeme);
        }

        let expected = match value {
            Some(value) => value.to_string(),
            None => kind_name(kind).to_string(),
        };
        let (found, location) = match &self.peek {
            Some(lexeme) => {
                let found = if value.is_some() && !lexeme.value.is_empty() {
                    lexeme.value.clone()
                } else {
                    kind_name(lexeme.kind).to_string()
                };
                (found, Some(lexeme.location.clone()))
            }
            None => ("end of input".to_string(), None),
        };

        Err(BasicError::syntax_error(
            location,
            format!("Expected {}, got {}", expected, found),
        ))
    }

    /// Every statement line ends with an end-of-statement lexeme or the end
    /// of the input.
    fn expect_end_of_statement(&mut self) -> Result<(), BasicError> {
        if self.peek.is_none() {
            return Ok(());
        }
        self.expect(LexemeKind::EndOfStatement, None)?;
        Ok(())
    }

    fn peek_is(&self, kind: LexemeKind, value: &str) -> bool {
        matches!(&self.peek, Some(lexeme) if lexeme.kind == kind && lexeme.value == value)
    }

    fn peek_is_kind(&self, kind: LexemeKind) -> bool {
        matches!(&self.peek, Some(lexeme) if lexeme.kind == kind)
    }

    fn peek_location(&self) -> Option<Location> {
        self.peek.as_ref().map(|lexeme| lexeme.location.clone())
    }

    fn error_at_peek(&self, message: &str) -> BasicError {
        BasicError::syntax_error(self.peek_location(), message.to_string())
    }

    /// The look-ahead holds the `rem` word itself, so the rest of the line
    /// is still untouched in the lexer and can be discarded wholesale.
    fn skip_comment(&mut self) -> Result<(), BasicError> {
        self.lexer.ignore_line();
        self.peek = self.lexer.next_lexeme()?;
        Ok(())
    }

    // ----- lines and blocks -----

    fn parse_block(&mut self) -> Result<(Block, Option<String>), BasicError> {
        let mut block = Block::default();

        while self.peek.is_some() {
            match self.parse_line()? {
                Line::Statement { label, statement } => {
                    let index = block.statements.len();
                    block.statements.push(statement);
                    if let Some(label) = label {
                        // The first occurrence of a duplicated label wins.
                        block.jump_table.entry(label).or_insert(index);
                    }
                }
                Line::Terminator(keyword) => return Ok((block, Some(keyword))),
            }
        }

        Ok((block, None))
    }

    fn parse_line(&mut self) -> Result<Line, BasicError> {
        let mut label: Option<String> = None;

        loop {
            // An integral label may open the line.
            if let Some(lexeme) = self.accept(LexemeKind::Number, None)? {
                label = Some(lexeme.value);
            }

            if self.peek_is(LexemeKind::Word, "rem") {
                self.skip_comment()?;
                continue;
            }

            let mut keyword = match self.accept(LexemeKind::Word, None)? {
                Some(word) => word,
                None => {
                    // An empty (or label-only) line.
                    self.expect_end_of_statement()?;
                    return Ok(Line::Statement {
                        label,
                        statement: Stmt::Empty,
                    });
                }
            };

            // The first word may itself be a label when a colon follows.
            if self.peek_is(LexemeKind::Symbol, ":") {
                label = Some(keyword.value.clone());
                self.advance()?;

                // Newlines are allowed between the label and its statement.
                while self.accept(LexemeKind::EndOfStatement, None)?.is_some() {}

                if self.peek_is(LexemeKind::Word, "rem") {
                    self.skip_comment()?;
                    continue;
                }
                keyword = self.expect(LexemeKind::Word, None)?;
            }

            let statement = match keyword.value.as_str() {
                "if" => self.parse_if()?,
                "do" => self.parse_do()?,
                "for" => self.parse_for()?,
                "print" => self.parse_print()?,
                "input" => self.parse_input()?,
                "let" => self.parse_let()?,
                "goto" => self.parse_goto()?,
                "stop" => Stmt::Stop,
                "exit" => self.parse_exit()?,
                value if BLOCK_TERMINATORS.contains(&value) => {
                    return Ok(Line::Terminator(value.to_string()));
                }
                _ => {
                    return Err(BasicError::syntax_error(
                        Some(keyword.location.clone()),
                        format!("Unrecognized keyword: {}", keyword.value),
                    ));
                }
            };

            self.expect_end_of_statement()?;
            return Ok(Line::Statement { label, statement });
        }
    }

    // ----- statements -----

    fn parse_if(&mut self) -> Result<Stmt, BasicError> {
        let condition = self.parse_numeric_expr()?;
        self.expect(LexemeKind::Word, Some("then"))?;

        if let Some(label) = self.accept(LexemeKind::Number, None)? {
            return self.finish_if_goto(condition, label.value);
        }

        if self.peek_is_kind(LexemeKind::Word) {
            // A statement keyword after THEN runs inline; any other word is
            // a jump target.
            if let Some(statement) = self.parse_inline_then_statement()? {
                return Ok(Stmt::IfBlock {
                    conditions: vec![condition],
                    blocks: vec![single_statement_block(statement)],
                });
            }
            let label = self.expect(LexemeKind::Word, None)?;
            return self.finish_if_goto(condition, label.value);
        }

        if self.peek_is_kind(LexemeKind::EndOfStatement) {
            self.advance()?;
            return self.parse_if_block(condition);
        }

        Err(self.error_at_peek("Expected a label or newline after THEN"))
    }

    fn finish_if_goto(
        &mut self,
        condition: NumericExpr,
        then_label: String,
    ) -> Result<Stmt, BasicError> {
        let mut else_label = None;
        if self.accept(LexemeKind::Word, Some("else"))?.is_some() {
            else_label = Some(match self.accept(LexemeKind::Number, None)? {
                Some(label) => label.value,
                None => self.expect(LexemeKind::Word, None)?.value,
            });
        }

        Ok(Stmt::IfGoto {
            condition,
            then_label,
            else_label,
        })
    }

    fn parse_inline_then_statement(&mut self) -> Result<Option<Stmt>, BasicError> {
        let keyword = match &self.peek {
            Some(lexeme) if lexeme.kind == LexemeKind::Word => lexeme.value.clone(),
            _ => return Ok(None),
        };

        let statement = match keyword.as_str() {
            "exit" => {
                self.advance()?;
                self.parse_exit()?
            }
            "goto" => {
                self.advance()?;
                self.parse_goto()?
            }
            "stop" => {
                self.advance()?;
                Stmt::Stop
            }
            _ => return Ok(None),
        };

        Ok(Some(statement))
    }

    fn parse_if_block(&mut self, condition: NumericExpr) -> Result<Stmt, BasicError> {
        let mut conditions = vec![condition];
        let mut blocks = Vec::new();
        let mut seen_else = false;

        loop {
            let (clause, terminator) = self.parse_block()?;
            blocks.push(clause);

            match terminator.as_deref() {
                Some("end") => break,
                Some("elseif") if !seen_else => {
                    let condition = self.parse_numeric_expr()?;
                    self.expect(LexemeKind::Word, Some("then"))?;
                    self.expect_end_of_statement()?;
                    conditions.push(condition);
                }
                Some("else") if !seen_else => {
                    seen_else = true;
                }
                other => {
                    let what = match other {
                        Some(keyword) => format!("keyword {}", keyword),
                        None => "end of input".to_string(),
                    };
                    return Err(self.error_at_peek(&format!(
                        "Unexpected {}, expected ELSE, ELSEIF or END IF",
                        what
                    )));
                }
            }
        }

        // The whole construct closes with END IF.
        self.expect(LexemeKind::Word, Some("if"))?;

        Ok(Stmt::IfBlock { conditions, blocks })
    }

    fn parse_do(&mut self) -> Result<Stmt, BasicError> {
        self.expect(LexemeKind::Word, Some("while"))?;
        let condition = self.parse_numeric_expr()?;

        let (body, terminator) = self.parse_block()?;
        match terminator.as_deref() {
            Some("loop") => Ok(Stmt::DoWhile { condition, body }),
            Some(other) => Err(self.error_at_peek(&format!("Expected LOOP, got {}", other))),
            None => Err(self.error_at_peek("Expected LOOP, got end of input")),
        }
    }

    fn parse_for(&mut self) -> Result<Stmt, BasicError> {
        let variable = self.expect(LexemeKind::Word, None)?;
        if is_string_identifier(&variable.value) {
            return Err(BasicError::syntax_error(
                Some(variable.location.clone()),
                "FOR loop variable must be numeric".to_string(),
            ));
        }

        self.expect(LexemeKind::Symbol, Some("="))?;
        let initial = self.parse_numeric_expr()?;
        self.expect(LexemeKind::Word, Some("to"))?;
        let limit = self.parse_numeric_expr()?;

        let step = if self.accept(LexemeKind::Word, Some("step"))?.is_some() {
            self.parse_numeric_expr()?
        } else {
            NumericExpr::Constant(Number::Int(1))
        };

        let (body, terminator) = self.parse_block()?;
        match terminator.as_deref() {
            Some("next") => {
                // The NEXT variable has to match the loop variable.
                self.expect(LexemeKind::Word, Some(variable.value.as_str()))?;
                Ok(Stmt::For {
                    variable: variable.value,
                    initial,
                    limit,
                    step,
                    body,
                })
            }
            Some(other) => Err(self.error_at_peek(&format!(
                "Expected NEXT {}, got {}",
                variable.value, other
            ))),
            None => Err(self.error_at_peek(&format!(
                "Expected NEXT {}, got end of input",
                variable.value
            ))),
        }
    }

    fn parse_print(&mut self) -> Result<Stmt, BasicError> {
        let mut expressions = Vec::new();

        let bare = match &self.peek {
            Some(lexeme) => lexeme.kind == LexemeKind::EndOfStatement,
            None => true,
        };
        if !bare {
            loop {
                expressions.push(self.parse_expression()?);
                if self.accept(LexemeKind::Symbol, Some(","))?.is_none() {
                    break;
                }
            }
        }

        Ok(Stmt::Print { expressions })
    }

    fn parse_input(&mut self) -> Result<Stmt, BasicError> {
        let variable = self.expect(LexemeKind::Word, None)?;
        if is_string_identifier(&variable.value) {
            return Err(BasicError::syntax_error(
                Some(variable.location.clone()),
                "INPUT expects a numeric variable".to_string(),
            ));
        }

        Ok(Stmt::Input {
            variable: variable.value,
        })
    }

    fn parse_let(&mut self) -> Result<Stmt, BasicError> {
        let variable = self.expect(LexemeKind::Word, None)?;
        self.expect(LexemeKind::Symbol, Some("="))?;

        if is_string_identifier(&variable.value) {
            let value = self.parse_string_expr()?;
            Ok(Stmt::LetString {
                variable: variable.value,
                value,
            })
        } else {
            let value = self.parse_numeric_expr()?;
            Ok(Stmt::LetNumeric {
                variable: variable.value,
                value,
            })
        }
    }

    fn parse_goto(&mut self) -> Result<Stmt, BasicError> {
        let label = if let Some(lexeme) = self.accept(LexemeKind::Word, None)? {
            lexeme.value
        } else if let Some(lexeme) = self.accept(LexemeKind::Number, None)? {
            lexeme.value
        } else {
            return Err(self.error_at_peek("Expected a label"));
        };

        Ok(Stmt::Goto { label })
    }

    fn parse_exit(&mut self) -> Result<Stmt, BasicError> {
        let name = self.expect(LexemeKind::Word, None)?.value;
        Ok(Stmt::Exit { name })
    }

    // ----- expressions -----

    /// A string lexeme or a string identifier in the look-ahead starts a
    /// string expression; everything else is numeric.
    fn parse_expression(&mut self) -> Result<Expr, BasicError> {
        let starts_string = match &self.peek {
            Some(lexeme) => {
                lexeme.kind == LexemeKind::Str
                    || (lexeme.kind == LexemeKind::Word && is_string_identifier(&lexeme.value))
            }
            None => false,
        };

        if starts_string {
            Ok(Expr::Str(self.parse_string_expr()?))
        } else {
            Ok(Expr::Numeric(self.parse_numeric_expr()?))
        }
    }

    fn parse_numeric_expr(&mut self) -> Result<NumericExpr, BasicError> {
        if self.accept(LexemeKind::Word, Some("not"))?.is_some() {
            let operand = self.parse_numeric_expr()?;
            return Ok(NumericExpr::Boolean {
                left: Box::new(operand),
                right: None,
                op: BooleanOp::Not,
            });
        }

        let left = self.parse_relational_expr()?;

        let op = if self.accept(LexemeKind::Word, Some("and"))?.is_some() {
            BooleanOp::And
        } else if self.accept(LexemeKind::Word, Some("or"))?.is_some() {
            BooleanOp::Or
        } else {
            return Ok(left);
        };

        let right = self.parse_integer_expr()?;
        Ok(NumericExpr::Boolean {
            left: Box::new(left),
            right: Some(Box::new(right)),
            op,
        })
    }

    fn parse_relational_expr(&mut self) -> Result<NumericExpr, BasicError> {
        let left = self.parse_integer_expr()?;

        let op = if self.accept(LexemeKind::Symbol, Some("="))?.is_some() {
            RelationalOp::Equal
        } else if self.accept(LexemeKind::Symbol, Some("<>"))?.is_some() {
            RelationalOp::NotEqual
        } else if self.accept(LexemeKind::Symbol, Some("<"))?.is_some() {
            RelationalOp::Less
        } else if self.accept(LexemeKind::Symbol, Some("<="))?.is_some() {
            RelationalOp::LessEqual
        } else if self.accept(LexemeKind::Symbol, Some(">"))?.is_some() {
            RelationalOp::Greater
        } else if self.accept(LexemeKind::Symbol, Some(">="))?.is_some() {
            RelationalOp::GreaterEqual
        } else {
            return Ok(left);
        };

        let right = self.parse_integer_expr()?;
        Ok(NumericExpr::Relational {
            left: Box::new(left),
            right: Box::new(right),
            op,
        })
    }

    // Additive expressions are right-recursive, so `-` chains associate to
    // the right.
    fn parse_integer_expr(&mut self) -> Result<NumericExpr, BasicError> {
        let left = self.parse_term()?;

        let op = if self.accept(LexemeKind::Symbol, Some("+"))?.is_some() {
            ArithOp::Add
        } else if self.accept(LexemeKind::Symbol, Some("-"))?.is_some() {
            ArithOp::Subtract
        } else {
            return Ok(left);
        };

        let right = self.parse_integer_expr()?;
        Ok(NumericExpr::Arith {
            left: Box::new(left),
            right: Box::new(right),
            op,
        })
    }

    // A term takes at most one multiplicative operator; longer chains need
    // parentheses.
    fn parse_term(&mut self) -> Result<NumericExpr, BasicError> {
        let left = self.parse_factor()?;

        let op = if self.accept(LexemeKind::Symbol, Some("*"))?.is_some() {
            ArithOp::Multiply
        } else if self.accept(LexemeKind::Symbol, Some("/"))?.is_some() {
            ArithOp::Divide
        } else if self.accept(LexemeKind::Word, Some("mod"))?.is_some() {
            ArithOp::Modulo
        } else {
            return Ok(left);
        };

        let right = self.parse_factor()?;
        Ok(NumericExpr::Arith {
            left: Box::new(left),
            right: Box::new(right),
            op,
        })
    }

    fn parse_factor(&mut self) -> Result<NumericExpr, BasicError> {
        let negated = self.accept(LexemeKind::Symbol, Some("-"))?.is_some();

        if let Some(lexeme) = self.accept(LexemeKind::Number, None)? {
            let constant = Self::parse_constant(&lexeme, negated)?;
            return Ok(NumericExpr::Constant(constant));
        }

        if let Some(lexeme) = self.accept(LexemeKind::Word, None)? {
            if is_string_identifier(&lexeme.value) {
                return Err(BasicError::syntax_error(
                    Some(lexeme.location.clone()),
                    "String identifier in numeric expression".to_string(),
                ));
            }
            return Ok(Self::negate_if(negated, NumericExpr::Variable(lexeme.value)));
        }

        if self.accept(LexemeKind::Symbol, Some("("))?.is_some() {
            let inner = self.parse_numeric_expr()?;
            self.expect(LexemeKind::Symbol, Some(")"))?;
            return Ok(Self::negate_if(negated, inner));
        }

        // Special-case strings for a nicer message.
        if let Some(lexeme) = self.accept(LexemeKind::Str, None)? {
            return Err(BasicError::syntax_error(
                Some(lexeme.location.clone()),
                "String literal in numeric expression".to_string(),
            ));
        }

        Err(self.error_at_peek(
            "Expected a numeric constant, a variable name, or an opening parenthesis",
        ))
    }

    fn parse_constant(lexeme: &Lexeme, negated: bool) -> Result<Number, BasicError> {
        if lexeme.value.contains('.') {
            let value: f64 = lexeme.value.parse().map_err(|_| {
                BasicError::syntax_error(
                    Some(lexeme.location.clone()),
                    format!("Invalid numeric literal: {}", lexeme.value),
                )
            })?;
            Ok(Number::Float(if negated { -value } else { value }))
        } else {
            let value: i64 = lexeme.value.parse().map_err(|_| {
                BasicError::syntax_error(
                    Some(lexeme.location.clone()),
                    format!("Invalid numeric literal: {}", lexeme.value),
                )
            })?;
            Ok(Number::Int(if negated { -value } else { value }))
        }
    }

    fn negate_if(negated: bool, expr: NumericExpr) -> NumericExpr {
        if negated {
            NumericExpr::Arith {
                left: Box::new(NumericExpr::Constant(Number::Int(-1))),
                right: Box::new(expr),
                op: ArithOp::Multiply,
            }
        } else {
            expr
        }
    }

    fn parse_string_expr(&mut self) -> Result<StringExpr, BasicError> {
        let left = self.parse_string_atom()?;

        if self.accept(LexemeKind::Symbol, Some("&"))?.is_some() {
            let right = self.parse_string_expr()?;
            return Ok(StringExpr::Concat {
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_string_atom(&mut self) -> Result<StringExpr, BasicError> {
        if let Some(lexeme) = self.accept(LexemeKind::Str, None)? {
            return Ok(StringExpr::Literal(lexeme.value));
        }

        if let Some(lexeme) = self.accept(LexemeKind::Word, None)? {
            if is_string_identifier(&lexeme.value) {
                return Ok(StringExpr::Variable(lexeme.value));
            }
            return Err(BasicError::syntax_error(
                Some(lexeme.location.clone()),
                "Expected a string identifier".to_string(),
            ));
        }

        if self.accept(LexemeKind::Symbol, Some("("))?.is_some() {
            let inner = self.parse_string_expr()?;
            self.expect(LexemeKind::Symbol, Some(")"))?;
            return Ok(inner);
        }

        Err(self.error_at_peek(
            "Expected a string literal, string identifier or opening parenthesis",
        ))
    }
}
