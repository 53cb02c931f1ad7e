use crate::ast::{ArithOp, Block, BooleanOp, Expr, NumericExpr, RelationalOp, Stmt, StringExpr};
use crate::error::BasicError;
use crate::number::Number;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

/// FOR loop bounds frozen at loop entry. They live on the activation frame,
/// not the statement, so the statement tree stays immutable while running.
#[derive(Debug, Clone, Copy)]
struct LoopState {
    step: Number,
    limit: Number,
}

/// A runtime activation record: the block being executed, a cursor into its
/// statements, this scope's variables, and the DO/FOR statement that owns
/// the frame (absent for the root frame and plain IF branches).
struct Frame<'p> {
    owner: Option<&'p Stmt>,
    block: &'p Block,
    cursor: usize,
    numeric_vars: HashMap<String, Number>,
    string_vars: HashMap<String, String>,
    loop_state: Option<LoopState>,
}

/// The execution engine: a stack of activation frames walked until the
/// stack empties or a STOP executes. Frames borrow the program tree, which
/// must outlive the interpreter.
pub struct Interpreter<'p> {
    frames: Vec<Frame<'p>>,
    stopped: bool,
    input: Box<dyn BufRead + 'p>,
    output: Box<dyn Write + 'p>,
}

impl<'p> Interpreter<'p> {
    /// An interpreter wired to standard input and output.
    pub fn new(program: &'p Block) -> Self {
        Self::with_io(
            program,
            Box::new(io::stdin().lock()),
            Box::new(io::stdout()),
        )
    }

    /// An interpreter reading INPUT lines from `input` and writing PRINT
    /// output (and the INPUT prompt) to `output`.
    pub fn with_io(
        program: &'p Block,
        input: Box<dyn BufRead + 'p>,
        output: Box<dyn Write + 'p>,
    ) -> Self {
        let mut interpreter = Self {
            frames: Vec::new(),
            stopped: false,
            input,
            output,
        };
        interpreter.enter_block(program, None, None);
        interpreter
    }

    /// Run the program to completion.
    pub fn run(&mut self) -> Result<(), BasicError> {
        self.stopped = false;

        while !self.frames.is_empty() && !self.stopped {
            // Execute the top frame. A statement may push or pop frames or
            // move the cursor, so the top is re-read every step.
            loop {
                if self.stopped {
                    break;
                }
                let frame = match self.frames.last_mut() {
                    Some(frame) => frame,
                    None => break,
                };
                let block = frame.block;
                if frame.cursor >= block.statements.len() {
                    break;
                }
                let statement = &block.statements[frame.cursor];
                frame.cursor += 1;
                self.execute(statement)?;
            }

            if self.stopped {
                break;
            }

            // The frame ran off its end: pop it and let the owning DO/FOR,
            // if any, decide whether to re-enter.
            if let Some(frame) = self.frames.pop() {
                if let Some(owner) = frame.owner {
                    self.iterate(owner, frame.loop_state)?;
                }
            }
        }

        self.output
            .flush()
            .map_err(|error| BasicError::internal_error(error.to_string()))?;
        Ok(())
    }

    // ----- control flow -----

    fn enter_block(
        &mut self,
        block: &'p Block,
        owner: Option<&'p Stmt>,
        loop_state: Option<LoopState>,
    ) {
        self.frames.push(Frame {
            owner,
            block,
            cursor: 0,
            numeric_vars: HashMap::new(),
            string_vars: HashMap::new(),
            loop_state,
        });
    }

    /// Transfer control to a label. Labels resolve dynamically: each frame
    /// from the innermost out is searched, and frames that do not contain
    /// the label are abandoned.
    fn jump(&mut self, label: &str) -> Result<(), BasicError> {
        while let Some(frame) = self.frames.last_mut() {
            if let Some(&target) = frame.block.jump_table.get(label) {
                frame.cursor = target;
                return Ok(());
            }
            self.frames.pop();
        }

        Err(BasicError::runtime_error(format!(
            "Jump to undefined label {}",
            label
        )))
    }

    /// Pop frames until one owned by a block statement of the given name
    /// ("do" or "for") has been popped.
    fn exit_block(&mut self, name: &str) -> Result<(), BasicError> {
        while let Some(frame) = self.frames.pop() {
            if frame.owner.and_then(Stmt::block_name) == Some(name) {
                return Ok(());
            }
        }

        Err(BasicError::runtime_error(format!(
            "Cannot EXIT {}: no such block",
            name
        )))
    }

    fn stop(&mut self) {
        self.frames.clear();
        self.stopped = true;
    }

    // ----- statements -----

    fn execute(&mut self, statement: &'p Stmt) -> Result<(), BasicError> {
        match statement {
            Stmt::IfGoto {
                condition,
                then_label,
                else_label,
            } => {
                if self.eval_numeric(condition)?.is_true() {
                    self.jump(then_label)
                } else if let Some(label) = else_label {
                    self.jump(label)
                } else {
                    Ok(())
                }
            }
            Stmt::IfBlock { conditions, blocks } => {
                for (index, condition) in conditions.iter().enumerate() {
                    if self.eval_numeric(condition)?.is_true() {
                        self.enter_block(&blocks[index], None, None);
                        return Ok(());
                    }
                }
                // No condition held; run the ELSE block if there is one.
                if blocks.len() == conditions.len() + 1 {
                    self.enter_block(&blocks[blocks.len() - 1], None, None);
                }
                Ok(())
            }
            Stmt::DoWhile { .. } => self.iterate(statement, None),
            Stmt::For {
                variable,
                initial,
                limit,
                step,
                body,
            } => {
                let start = self.eval_numeric(initial)?;
                self.set_var_numeric(variable, start);
                let state = LoopState {
                    step: self.eval_numeric(step)?,
                    limit: self.eval_numeric(limit)?,
                };
                if Self::loop_condition_holds(start, state) {
                    self.enter_block(body, Some(statement), Some(state));
                }
                Ok(())
            }
            Stmt::Print { expressions } => {
                for expression in expressions {
                    let text = self.representation(expression)?;
                    self.write_output(&text)?;
                }
                self.write_output("\n")
            }
            Stmt::Input { variable } => {
                self.write_output("? ")?;
                self.output
                    .flush()
                    .map_err(|error| BasicError::internal_error(error.to_string()))?;

                let mut line = String::new();
                self.input
                    .read_line(&mut line)
                    .map_err(|error| BasicError::internal_error(error.to_string()))?;

                let value: i64 = line.trim().parse().map_err(|_| {
                    BasicError::runtime_error("User input error: expected an integer".to_string())
                })?;
                self.set_var_numeric(variable, Number::Int(value));
                Ok(())
            }
            Stmt::LetNumeric { variable, value } => {
                let value = self.eval_numeric(value)?;
                self.set_var_numeric(variable, value);
                Ok(())
            }
            Stmt::LetString { variable, value } => {
                let value = self.eval_string(value)?;
                self.set_var_string(variable, value);
                Ok(())
            }
            Stmt::Goto { label } => self.jump(label),
            Stmt::Stop => {
                self.stop();
                Ok(())
            }
            Stmt::Exit { name } => self.exit_block(name),
            Stmt::Empty => Ok(()),
        }
    }

    /// The re-entry step of a block statement, invoked when its body frame
    /// is first entered (DO) or runs off its end (DO and FOR).
    fn iterate(&mut self, statement: &'p Stmt, loop_state: Option<LoopState>) -> Result<(), BasicError> {
        match statement {
            Stmt::DoWhile { condition, body } => {
                if self.eval_numeric(condition)?.is_true() {
                    self.enter_block(body, Some(statement), None);
                }
                Ok(())
            }
            Stmt::For { variable, body, .. } => {
                let state = match loop_state {
                    Some(state) => state,
                    None => unreachable!("FOR frame without loop state"),
                };
                let next = self.get_var_numeric(variable)? + state.step;
                self.set_var_numeric(variable, next);
                if Self::loop_condition_holds(next, state) {
                    self.enter_block(body, Some(statement), Some(state));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn loop_condition_holds(value: Number, state: LoopState) -> bool {
        let zero = Number::Int(0);
        (state.step > zero && value <= state.limit)
            || (state.step < zero && value >= state.limit)
    }

    // ----- expressions -----

    /// What PRINT shows: a numeric expression renders as its value, a
    /// string expression as itself.
    fn representation(&mut self, expression: &Expr) -> Result<String, BasicError> {
        match expression {
            Expr::Numeric(expression) => Ok(self.eval_numeric(expression)?.to_string()),
            Expr::Str(expression) => self.eval_string(expression),
        }
    }

    fn eval_numeric(&mut self, expression: &NumericExpr) -> Result<Number, BasicError> {
        match expression {
            NumericExpr::Constant(value) => Ok(*value),
            NumericExpr::Variable(name) => self.get_var_numeric(name),
            NumericExpr::Arith { left, right, op } => {
                let left = self.eval_numeric(left)?;
                let right = self.eval_numeric(right)?;
                match op {
                    ArithOp::Add => Ok(left + right),
                    ArithOp::Subtract => Ok(left - right),
                    ArithOp::Multiply => Ok(left * right),
                    ArithOp::Divide => left.divide(right),
                    ArithOp::Modulo => left.modulo(right),
                }
            }
            NumericExpr::Relational { left, right, op } => {
                let left = self.eval_numeric(left)?;
                let right = self.eval_numeric(right)?;
                let result = match op {
                    RelationalOp::Equal => left == right,
                    RelationalOp::NotEqual => left != right,
                    RelationalOp::Less => left < right,
                    RelationalOp::LessEqual => left <= right,
                    RelationalOp::Greater => left > right,
                    RelationalOp::GreaterEqual => left >= right,
                };
                Ok(Number::from(result))
            }
            NumericExpr::Boolean { left, right, op } => match op {
                BooleanOp::Not => {
                    let value = self.eval_numeric(left)?;
                    Ok(Number::from(!value.is_true()))
                }
                BooleanOp::And | BooleanOp::Or => {
                    let right = match right {
                        Some(right) => right,
                        None => unreachable!("binary boolean operator without a right operand"),
                    };
                    let left_true = self.eval_numeric(left)?.is_true();
                    let result = match op {
                        BooleanOp::And => left_true && self.eval_numeric(right)?.is_true(),
                        BooleanOp::Or => left_true || self.eval_numeric(right)?.is_true(),
                        BooleanOp::Not => unreachable!(),
                    };
                    Ok(Number::from(result))
                }
            },
        }
    }

    fn eval_string(&mut self, expression: &StringExpr) -> Result<String, BasicError> {
        match expression {
            StringExpr::Literal(value) => Ok(value.clone()),
            StringExpr::Variable(name) => self.get_var_string(name),
            StringExpr::Concat { left, right } => {
                let left = self.eval_string(left)?;
                let right = self.eval_string(right)?;
                Ok(left + &right)
            }
        }
    }

    // ----- variable store -----

    /// Overwrite the innermost binding of `name`, or create one in the
    /// current top frame.
    pub fn set_var_numeric(&mut self, name: &str, value: Number) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.numeric_vars.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(top) = self.frames.last_mut() {
            top.numeric_vars.insert(name.to_string(), value);
        }
    }

    pub fn set_var_string(&mut self, name: &str, value: String) {
        for frame in self.frames.iter_mut().rev() {
            if let Some(slot) = frame.string_vars.get_mut(name) {
                *slot = value;
                return;
            }
        }
        if let Some(top) = self.frames.last_mut() {
            top.string_vars.insert(name.to_string(), value);
        }
    }

    pub fn get_var_numeric(&self, name: &str) -> Result<Number, BasicError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.numeric_vars.get(name) {
                return Ok(*value);
            }
        }
        Err(BasicError::runtime_error(format!(
            "Variable {} undefined",
            name
        )))
    }

    pub fn get_var_string(&self, name: &str) -> Result<String, BasicError> {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.string_vars.get(name) {
                return Ok(value.clone());
            }
        }
        Err(BasicError::runtime_error(format!(
            "Variable {} undefined",
            name
        )))
    }

    fn write_output(&mut self, text: &str) -> Result<(), BasicError> {
        self.output
            .write_all(text.as_bytes())
            .map_err(|error| BasicError::internal_error(error.to_string()))
    }
}
