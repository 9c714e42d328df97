use super::{Parse, ParseRes, Parser};
use crate::ast::Identifier;
use crate::lexer::TokenKind;

impl Parse for Identifier {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parser.with_context("parsing identifier", |parser| {
            parser.expect_token(TokenKind::Identifier)?;
            let name = parser.current_token_source().to_string();
            let span = parser.current_token_span();
            parser.accept_current();
            Ok(Self { name, span })
        })
    }
}
