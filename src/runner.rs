use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Run a program through the whole pipeline, reporting any error to stderr.
pub fn run(source: &str, filename: &str) {
    let lexer = Lexer::new(source, filename);

    let mut parser = match Parser::new(lexer) {
        Ok(parser) => parser,
        Err(error) => {
            error.report(source);
            return;
        }
    };

    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source);
            return;
        }
    };

    let mut interpreter = Interpreter::new(&program);
    if let Err(error) = interpreter.run() {
        error.report(source);
    }
}
