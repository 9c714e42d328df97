use crate::ast::{Expr, ExprId, ExprKind};
use crate::error::*;
use crate::lexer::*;

mod block;
mod expr;
mod identifier;
mod program;
mod statement;

pub struct Parser<'source> {
    lexer: Lexer<'source>,
    current_tok: Option<Token<'source>>,
    next_expr: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source SourceMetadata<'source>) -> Self {
        Self {
            lexer: Lexer::new(source),
            current_tok: None,
            next_expr: 0,
        }
    }
    pub fn peek_token(&mut self) -> ParseRes<Option<TokenKind>> {
        if self.current_tok.is_none() {
            let next_tok_opt = self
                .lexer
                .next_token()
                .map_err(|e| e.map_kind(ParseErrorKind::LexError))?;
            self.current_tok = next_tok_opt;
        }
        Ok(self.current_tok.as_ref().map(|x| x.kind))
    }
    pub fn peek_keyword(&mut self) -> ParseRes<Option<Keyword>> {
        Ok(match self.peek_token()? {
            Some(TokenKind::Keyword(kw)) => Some(kw),
            _ => None,
        })
    }
    /// Span of the token under the cursor, or of the end of input.
    pub fn current_token_span(&mut self) -> Span {
        match &self.current_tok {
            Some(tok) => tok.source.span,
            None => self.lexer.current_span(),
        }
    }
    /// Source of the last peeked token. Empty at the end of input.
    pub fn current_token_source(&self) -> &'source str {
        self.current_tok.as_ref().map_or("", |x| x.source.source)
    }
    pub fn accept_current(&mut self) {
        self.current_tok = None;
    }
    pub fn emit_error_at<T>(&self, span: Span, kind: ParseErrorKind) -> ParseRes<T> {
        Err(ParseError::new(kind).with_source(span, self.lexer.get_metadata()))
    }
    pub fn expect_a_token(&mut self, wanted: Option<WantedSpec<TokenKind>>) -> ParseRes<TokenKind> {
        let span = self.lexer.current_span();
        self.peek_token()?.map_or_else(
            || self.emit_error_at(span, ParseErrorKind::UnexpectedEOF { wanted }),
            Ok,
        )
    }
    pub fn reject_current_token<T>(&mut self, reason: ParseErrorKind) -> ParseRes<T> {
        let span = self.current_token_span();
        self.emit_error_at(span, reason)
    }
    pub fn expect_token(&mut self, kind: TokenKind) -> ParseRes<()> {
        self.expect_a_token(Some(WantedSpec::Specific(kind)))
            .and_then(|tok| {
                if tok != kind {
                    self.reject_current_token(ParseErrorKind::Expected {
                        wanted: WantedSpec::Specific(kind),
                        found: tok,
                    })
                } else {
                    Ok(())
                }
            })
    }
    /// Expects `kind` and consumes it, returning its span.
    pub fn consume(&mut self, kind: TokenKind) -> ParseRes<Span> {
        self.expect_token(kind)?;
        let span = self.current_token_span();
        self.accept_current();
        Ok(span)
    }
    pub fn keyword(&mut self, kw: Keyword) -> ParseRes<Span> {
        self.consume(TokenKind::Keyword(kw))
    }
    /// Consumes the current token only if it is `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> ParseRes<bool> {
        if self.peek_token()? == Some(kind) {
            self.accept_current();
            Ok(true)
        } else {
            Ok(false)
        }
    }
    pub fn parse<T>(&mut self) -> ParseRes<T>
    where
        T: Parse,
    {
        T::parse(self)
    }
    pub fn with_context<F, T>(&mut self, context: &'static str, mut cont: F) -> ParseRes<T>
    where
        F: FnMut(&mut Self) -> ParseRes<T>,
    {
        cont(self).map_err(|x| x.add_context(context))
    }
    /// Builds an expression node, giving it the next id.
    pub fn new_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = ExprId(self.next_expr);
        self.next_expr += 1;
        Expr { id, span, kind }
    }
    /// Parses a whole program and makes sure nothing follows it.
    pub fn parse_program(&mut self) -> ParseRes<crate::ast::Program> {
        let program = self.parse()?;
        if let Some(tok) = self.peek_token()? {
            return self.reject_current_token(ParseErrorKind::Expected {
                wanted: WantedSpec::Description("`fun` or end of input"),
                found: tok,
            });
        }
        tracing::debug!(target: "parser", "parsed {} expressions", self.next_expr);
        Ok(program)
    }
}

pub type ParseRes<T> = Result<T, ParseError>;
pub type ParseError = Error<ParseErrorKind>;

#[derive(Debug)]
pub enum ParseErrorKind {
    LexError(LexErrorKind),
    Expected {
        wanted: WantedSpec<TokenKind>,
        found: TokenKind,
    },
    UnexpectedEOF {
        wanted: Option<WantedSpec<TokenKind>>,
    },
    InvalidNumber(String),
}

pub trait Parse: Sized {
    fn parse(parser: &mut Parser) -> ParseRes<Self>;
}

use std::error;
impl error::Error for ParseErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        if let Self::LexError(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

use std::fmt;
impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LexError(err) => write!(f, "error while lexing source: {}", err),
            Self::UnexpectedEOF { wanted } => {
                write!(f, "unexpected end of input")?;
                if let Some(wanted) = wanted {
                    write!(f, ", expected {}", wanted)
                } else {
                    Ok(())
                }
            }
            Self::Expected { wanted, found } => {
                write!(f, "expected {}, but found instead {}", wanted, found)
            }
            Self::InvalidNumber(src) => {
                write!(f, "number literal `{}` does not fit in 64 bits", src)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    pub(crate) fn parse_source(source: &str) -> ParseRes<Program> {
        let meta = SourceMetadata::new(source).with_file("<test program>".into());
        let program = Parser::new(&meta).parse_program()?;
        Ok(program)
    }

    #[test]
    fn reports_expected_and_found() {
        let err = parse_source("fun int main() print(1 endfun").unwrap_err();
        let rendered = err.to_string();
        assert!(
            rendered.contains("expected closing parentheses ')'"),
            "{rendered}"
        );
        assert!(rendered.contains("found instead keyword `endfun`"), "{rendered}");
        assert!(rendered.contains("while parsing statement"), "{rendered}");
    }

    #[test]
    fn reports_lexical_errors() {
        let err = parse_source("var int x;\nfun int main() x = 1 # 2 endfun").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::LexError(LexErrorKind::UnexpectedChar('#'))
        ));
        assert_eq!(err.position().map(|p| (p.line, p.col)), Some((1, 21)));
    }

    #[test]
    fn reports_end_of_input() {
        let err = parse_source("fun int main() print(1)").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::UnexpectedEOF {
                wanted: Some(WantedSpec::Specific(TokenKind::Keyword(Keyword::EndFun)))
            }
        ));
    }

    #[test]
    fn rejects_trailing_tokens() {
        let err = parse_source("fun int main() print(1) endfun print(2)").unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                found: TokenKind::Keyword(Keyword::Print),
                ..
            }
        ));
    }

    #[test]
    fn rejects_huge_literals() {
        let err = parse_source("fun int main() print(99999999999999999999) endfun").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidNumber(_)));
    }

    #[test]
    fn parsing_is_deterministic() -> anyhow::Result<()> {
        const SOURCE: &str = "var int g;\nfun int f(int a, int b) return(a * (b + g)) endfun";
        let first = parse_source(SOURCE)?;
        let second = parse_source(SOURCE)?;
        assert_eq!(first.to_string(), second.to_string());
        let ids = |p: &Program| p.expressions().iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        Ok(())
    }

    #[test]
    fn printed_programs_parse_back() -> anyhow::Result<()> {
        const SOURCE: &str = r#"
var int x, y;
var bool flag;
fun int fact(int n,)
  var int acc;
  acc = 1;
  while 0 < n do
    acc = acc * n;
    n = n - 1
  endwhile;
  return(acc)
endfun
fun int main()
  x = fact(5) + 2 * 3 - 1;
  if x == 125 then print(x) else print(0 - 1) endif;
  flag = true;
  return()
endfun
"#;
        let first = parse_source(SOURCE)?;
        let printed = first.to_string();
        let second = parse_source(&printed)?;
        assert_eq!(printed, second.to_string());
        let ids = |p: &Program| p.expressions().iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        Ok(())
    }
}
