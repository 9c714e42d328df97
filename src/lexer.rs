use crate::error::{self, SourceMetadata, Span, WantedSpec};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

impl Error for LexErrorKind {}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(kw) => write!(f, "keyword `{}`", kw),
            Self::Identifier => write!(f, "identifier"),
            Self::Number => write!(f, "number"),
            Self::OpenParen => write!(f, "opening parentheses '('"),
            Self::CloseParen => write!(f, "closing parentheses ')'"),
            Self::Comma => write!(f, "comma ','"),
            Self::Semicolon => write!(f, "semicolon ';'"),
            Self::Operator { kind } => write!(f, "operator `{}`", kind),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Equals => "=",
            Operator::DoubleEquals => "==",
            Operator::AngleLeft => "<",
            Operator::AngleLeftEquals => "<=",
        })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(ch) => write!(f, "unrecognized character {:?}", ch),
            Self::Expected { wanted, found } => {
                write!(f, "unexpected {:?}\nexpected {}", found, wanted)
            }
        }
    }
}

pub struct LexerIter<'a> {
    lexer: Lexer<'a>,
    eof: bool,
}

pub type LexError = error::Error<LexErrorKind>;

impl<'a> Iterator for LexerIter<'a> {
    type Item = Result<Token<'a>, LexError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            None
        } else {
            let next = self.lexer.next_token();
            if matches!(next, Ok(None) | Err(_)) {
                self.eof = true;
            }
            next.transpose()
        }
    }
}

impl<'a> std::iter::FusedIterator for LexerIter<'a> {}

impl<'a> IntoIterator for Lexer<'a> {
    type IntoIter = LexerIter<'a>;
    type Item = <Self::IntoIter as Iterator>::Item;
    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            eof: false,
        }
    }
}

#[derive(Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub source: Source<'a>,
}

impl<'a> Token<'a> {
    pub const fn new(kind: TokenKind, source: Source<'a>) -> Self {
        Self { kind, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenParen,
    CloseParen,
    Comma,
    Semicolon,
    Number,
    Identifier,
    Keyword(Keyword),
    Operator { kind: Operator },
}

impl TokenKind {
    pub const fn as_operator(self) -> Option<Operator> {
        if let TokenKind::Operator { kind } = self {
            Some(kind)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Equals,
    DoubleEquals,
    AngleLeft,
    AngleLeftEquals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Var,
    Fun,
    EndFun,
    Print,
    Return,
    If,
    Then,
    Else,
    EndIf,
    While,
    Do,
    EndWhile,
    True,
    False,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Keyword> = [
        Keyword::Var,
        Keyword::Fun,
        Keyword::EndFun,
        Keyword::Print,
        Keyword::Return,
        Keyword::If,
        Keyword::Then,
        Keyword::Else,
        Keyword::EndIf,
        Keyword::While,
        Keyword::Do,
        Keyword::EndWhile,
        Keyword::True,
        Keyword::False,
    ]
    .into_iter()
    .map(|kw| (kw.as_str(), kw))
    .collect();
}

impl Keyword {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Fun => "fun",
            Self::EndFun => "endfun",
            Self::Print => "print",
            Self::Return => "return",
            Self::If => "if",
            Self::Then => "then",
            Self::Else => "else",
            Self::EndIf => "endif",
            Self::While => "while",
            Self::Do => "do",
            Self::EndWhile => "endwhile",
            Self::True => "true",
            Self::False => "false",
        }
    }
    pub fn lookup(word: &str) -> Option<Self> {
        KEYWORDS.get(word).copied()
    }
}

#[derive(Debug)]
pub struct Source<'a> {
    pub span: Span,
    pub source: &'a str,
}

pub struct Lexer<'a> {
    input: std::iter::Peekable<std::str::CharIndices<'a>>,
    metadata: &'a SourceMetadata<'a>,
}

#[derive(Debug)]
pub enum LexErrorKind {
    Expected {
        wanted: error::WantedSpec<char>,
        found: char,
    },
    UnexpectedChar(char),
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a SourceMetadata<'a>) -> Self {
        Self {
            input: input.input().char_indices().peekable(),
            metadata: input,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        self.skip_whitespace();
        let start = self.current_offset();
        let punctuation = self.choice::<TokenKind>(&[
            &|lexer: &mut Self| lexer.eat_char('(').map(|_| TokenKind::OpenParen),
            &|lexer: &mut Self| lexer.eat_char(')').map(|_| TokenKind::CloseParen),
            &|lexer: &mut Self| lexer.eat_char(',').map(|_| TokenKind::Comma),
            &|lexer: &mut Self| lexer.eat_char(';').map(|_| TokenKind::Semicolon),
        ]);
        if let Some(kind) = punctuation {
            return Ok(Some(Token::new(kind, self.source_until_current(start))));
        }
        if let Some(src) = self.identifier() {
            let kind = Keyword::lookup(src.source).map_or(TokenKind::Identifier, TokenKind::Keyword);
            return Ok(Some(Token::new(kind, src)));
        }
        if let Some(kind) = self.operator() {
            return Ok(Some(Token::new(
                TokenKind::Operator { kind },
                self.source_until_current(start),
            )));
        }
        if let Some(src) = self.number().map_err(|e| e.add_context("number"))? {
            return Ok(Some(Token::new(TokenKind::Number, src)));
        }
        match self.input.peek().copied() {
            None => Ok(None),
            Some((pos, ch)) => Err(self.error(pos, LexErrorKind::UnexpectedChar(ch))),
        }
    }

    fn choice<T>(&mut self, choices: &[&dyn Fn(&mut Self) -> Option<T>]) -> Option<T> {
        for x in choices {
            if let Some(t) = x(self) {
                return Some(t);
            }
        }
        None
    }

    // two-char operators go first so that `<=` never lexes as `<` `=`
    fn operator(&mut self) -> Option<Operator> {
        self.choice::<Operator>(&[
            &|lexer: &mut Self| lexer.eat_str("==").map(|_| Operator::DoubleEquals),
            &|lexer: &mut Self| lexer.eat_str("<=").map(|_| Operator::AngleLeftEquals),
            &|lexer: &mut Self| lexer.eat_char('<').map(|_| Operator::AngleLeft),
            &|lexer: &mut Self| lexer.eat_char('=').map(|_| Operator::Equals),
            &|lexer: &mut Self| lexer.eat_char('+').map(|_| Operator::Plus),
            &|lexer: &mut Self| lexer.eat_char('-').map(|_| Operator::Minus),
            &|lexer: &mut Self| lexer.eat_char('*').map(|_| Operator::Star),
            &|lexer: &mut Self| lexer.eat_char('/').map(|_| Operator::Slash),
        ])
    }

    fn identifier(&mut self) -> Option<Source<'a>> {
        let (start, _) = self.skip_if(|c| c.is_ascii_alphabetic() || c == '_')?;
        self.skip_while(|c| c.is_ascii_alphanumeric() || c == '_');
        Some(self.source_until_current(start))
    }

    fn number(&mut self) -> Result<Option<Source<'a>>, LexError> {
        let start = match self.skip_if(|c| c.is_ascii_digit()) {
            Some((pos, _)) => pos,
            None => return Ok(None),
        };
        self.skip_while(|c| c.is_ascii_digit());
        if let Some((pos, ch)) = self
            .input
            .peek()
            .filter(|(_, ch)| !is_delimeter(*ch))
            .copied()
        {
            return Err(self.error(
                pos,
                LexErrorKind::Expected {
                    wanted: WantedSpec::Description("delimeter or space after number"),
                    found: ch,
                },
            ));
        }
        Ok(Some(self.source_until_current(start)))
    }

    fn eat_str(&mut self, str: &str) -> Option<usize> {
        let current_offset = self.current_offset();
        if self.metadata.input()[current_offset..].starts_with(str) {
            for _ in str.chars() {
                self.advance();
            }
            Some(current_offset)
        } else {
            None
        }
    }

    fn skip_while<F>(&mut self, filter: F)
    where
        F: Fn(char) -> bool,
    {
        while self.input.peek().filter(|(_, ch)| filter(*ch)).is_some() {
            self.input.next();
        }
    }

    fn skip_if<F>(&mut self, filter: F) -> Option<(usize, char)>
    where
        F: Fn(char) -> bool,
    {
        let (pos, ch) = *self.input.peek()?;
        if filter(ch) {
            self.advance();
            Some((pos, ch))
        } else {
            None
        }
    }

    fn skip_whitespace(&mut self) {
        self.skip_while(char::is_whitespace);
    }

    fn advance(&mut self) {
        self.input.next();
    }

    fn source_until_current(&mut self, start: usize) -> Source<'a> {
        let current = self.current_offset();
        Source {
            span: Span::with_len(start, current - start),
            source: &self.metadata.input()[start..current],
        }
    }

    fn eat_char(&mut self, ch: char) -> Option<usize> {
        let (pos, _) = self.input.next_if(|(_, x)| *x == ch)?;
        Some(pos)
    }

    fn error(&self, position: usize, kind: LexErrorKind) -> LexError {
        LexError::new(kind).with_source(Span::new(position), self.metadata)
    }

    pub fn current_span(&mut self) -> Span {
        Span::new(self.current_offset())
    }

    pub const fn get_metadata(&self) -> &SourceMetadata {
        self.metadata
    }

    fn current_offset(&mut self) -> usize {
        self.input
            .peek()
            .map(|(x, _)| *x)
            .unwrap_or_else(|| self.metadata.input().len())
    }
}

#[inline]
fn is_delimeter(ch: char) -> bool {
    ch.is_whitespace() || ch.is_ascii_punctuation()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Result<Vec<TokenKind>, LexError> {
        let meta = SourceMetadata::new(source);
        Lexer::new(&meta)
            .into_iter()
            .map(|tok| tok.map(|tok| tok.kind))
            .collect()
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(
            kinds("while x do endwhile").unwrap(),
            vec![
                TokenKind::Keyword(Keyword::While),
                TokenKind::Identifier,
                TokenKind::Keyword(Keyword::Do),
                TokenKind::Keyword(Keyword::EndWhile),
            ]
        );
        // prefixes of keywords are plain names
        assert_eq!(kinds("ifx endiff").unwrap(), vec![TokenKind::Identifier; 2]);
    }

    #[test]
    fn comparison_operators_take_two_chars() {
        let op = |kind| TokenKind::Operator { kind };
        assert_eq!(
            kinds("a<=b==c<d=e").unwrap(),
            vec![
                TokenKind::Identifier,
                op(Operator::AngleLeftEquals),
                TokenKind::Identifier,
                op(Operator::DoubleEquals),
                TokenKind::Identifier,
                op(Operator::AngleLeft),
                TokenKind::Identifier,
                op(Operator::Equals),
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn tokens_keep_their_source() {
        let meta = SourceMetadata::new("  print(42);");
        let tokens: Vec<_> = Lexer::new(&meta).into_iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[2].source.source, "42");
        assert_eq!(tokens[2].source.span, Span::with_len(8, 2));
    }

    #[test]
    fn unknown_characters_are_errors() {
        let err = kinds("x = 3 $ 4").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::UnexpectedChar('$')));
        assert_eq!(err.position().map(|p| p.col), Some(6));
    }

    #[test]
    fn numbers_need_a_delimiter() {
        let err = kinds("12ab").unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::Expected { found: 'a', .. }));
    }
}
