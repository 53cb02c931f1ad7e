use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// Physical position of a lexeme in the source text.
///
/// Line numbers are 1-based and columns 0-based, matching what the lexer
/// tracks. `offset` is the byte position used for diagnostic spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub filename: String,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Location {
    pub fn new(filename: &str, line: usize, column: usize, offset: usize) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Lexer,
    Syntax,
    Runtime,
    Internal,
}

#[derive(Debug, Clone)]
pub struct BasicError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

impl BasicError {
    pub fn new(kind: ErrorKind, message: String, location: Option<Location>) -> Self {
        Self {
            kind,
            message,
            location,
        }
    }

    pub fn lexer_error(location: Location, message: String) -> Self {
        Self::new(ErrorKind::Lexer, message, Some(location))
    }

    pub fn syntax_error(location: Option<Location>, message: String) -> Self {
        Self::new(ErrorKind::Syntax, message, location)
    }

    pub fn runtime_error(message: String) -> Self {
        Self::new(ErrorKind::Runtime, message, None)
    }

    pub fn internal_error(message: String) -> Self {
        Self::new(ErrorKind::Internal, message, None)
    }

    fn category(&self) -> &'static str {
        match self.kind {
            ErrorKind::Lexer => "Lexer error",
            ErrorKind::Syntax => "Syntax error",
            ErrorKind::Runtime => "Runtime error",
            ErrorKind::Internal => "Internal error",
        }
    }

    /// Print the error to stderr. Errors that carry a source location are
    /// rendered as a full diagnostic against `source`; the rest fall back to
    /// the plain one-line form.
    pub fn report(&self, source: &str) {
        let location = match &self.location {
            Some(location) => location,
            None => {
                eprintln!("{}", self);
                return;
            }
        };

        let color = match self.kind {
            ErrorKind::Lexer => Color::Red,
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Runtime | ErrorKind::Internal => Color::Magenta,
        };

        let filename = location.filename.as_str();
        let start = location.offset.min(source.len());
        let end = (start + 1).min(source.len()).max(start);

        Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", self.category().fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .eprint((filename, Source::from(source)))
            .unwrap();
    }
}

impl fmt::Display for BasicError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", self.category(), location, self.message),
            None => write!(f, "{}: {}", self.category(), self.message),
        }
    }
}

impl std::error::Error for BasicError {}
