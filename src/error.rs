use std::error;
use std::fmt;

use crate::compiler::CodegenError;
use crate::parser::ParseError;

#[derive(Debug, Clone)]
pub struct Error<T> {
    pub kind: T,
    file: Option<std::path::PathBuf>,
    snippet: Option<Snippet>,
    contexts: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(offset: usize) -> Self {
        Self { offset, len: 1 }
    }
    pub const fn with_len(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }
    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Self {
        let start = self.offset.min(other.offset);
        let end = self.end().max(other.end());
        Self::with_len(start, end - start)
    }
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
    pub const fn as_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
    pub fn snippet_from_source(&self, source: &SourceMetadata) -> Option<Snippet> {
        let mut offset = 0;
        for (i, line) in source.input().split_terminator('\n').enumerate() {
            let next_offset = offset + line.len() + 1;
            if next_offset > self.offset {
                let col = self.offset - offset;
                return Some(Snippet {
                    position: Position { line: i, col },
                    // markers never run past the end of the line
                    width: self.len.clamp(1, (line.len() - col.min(line.len())).max(1)),
                    line: line.to_string(),
                });
            }
            offset = next_offset;
        }
        // end of input: point just past the last line
        let (i, line) = source.input().split_terminator('\n').enumerate().last()?;
        Some(Snippet {
            position: Position {
                line: i,
                col: line.len(),
            },
            width: 1,
            line: line.to_string(),
        })
    }
}

#[derive(Debug)]
pub struct SourceMetadata<'a> {
    file: Option<std::path::PathBuf>,
    source: &'a str,
}

impl<'a> SourceMetadata<'a> {
    pub const fn input(&self) -> &'a str {
        self.source
    }
    pub const fn new(source: &'a str) -> Self {
        Self { file: None, source }
    }
    #[must_use]
    pub fn with_file(mut self, file: std::path::PathBuf) -> Self {
        self.file = Some(file);
        self
    }
}

impl<T> Error<T> {
    pub const fn new(kind: T) -> Self {
        Self {
            kind,
            snippet: None,
            file: None,
            contexts: Vec::new(),
        }
    }
    pub fn map_kind<F, U>(self, mapper: F) -> Error<U>
    where
        F: Fn(T) -> U,
    {
        Error {
            kind: mapper(self.kind),
            snippet: self.snippet,
            file: self.file,
            contexts: self.contexts,
        }
    }
    #[must_use]
    pub fn with_source(mut self, span: Span, source: &SourceMetadata) -> Self {
        self.file = source.file.clone();
        self.snippet = span.snippet_from_source(source);
        self
    }
    #[must_use]
    pub fn add_context(mut self, ctx: &'static str) -> Self {
        self.contexts.push(ctx);
        self
    }
    pub fn position(&self) -> Option<Position> {
        self.snippet.as_ref().map(|snip| snip.position)
    }
    pub fn contexts(&self) -> &[&'static str] {
        &self.contexts
    }
}

#[derive(Debug, Clone)]
pub struct Snippet {
    position: Position,
    width: usize,
    line: String,
}

#[derive(Debug)]
pub enum WantedSpec<T> {
    Specific(T),
    Description(&'static str),
}

impl<T: fmt::Display> fmt::Display for WantedSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Description(desc) => f.write_str(desc),
            Self::Specific(t) => write!(f, "{}", t),
        }
    }
}

/// Zero-based line and column of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: usize,
    pub line: usize,
}

impl<T: error::Error + 'static> error::Error for Error<T> {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T: fmt::Display> fmt::Display for Error<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let whiles = self
            .contexts
            .iter()
            .copied()
            .fold(String::new(), |acc, next| acc + "\nwhile " + next);
        let snippet = if let Some(snip) = &self.snippet {
            snip
        } else {
            return write!(f, "{}(no location info){}", self.kind, whiles);
        };
        let file = self
            .file
            .as_ref()
            .and_then(|x| x.to_str())
            .unwrap_or("<unknown source>");

        write!(
            f,
            "\
{kind}
   --> {file}:{line}:{col}
    |
{line:3} | {snippet}
    | {pad}{marker}{whiles}",
            pad = " ".repeat(snippet.position.col),
            marker = "^".repeat(snippet.width),
            line = snippet.position.line + 1,
            col = snippet.position.col + 1,
            file = file,
            kind = self.kind,
            snippet = snippet.line,
            whiles = whiles,
        )
    }
}

/// Any error that stops a compilation, whichever stage raised it.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Codegen(#[from] CodegenError),
}
