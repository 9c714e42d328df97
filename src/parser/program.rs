use super::{Parse, ParseRes, Parser};
use crate::ast::{Body, FunDec, FunDecList, Identifier, Parameter, Program};
use crate::lexer::{Keyword, TokenKind};

impl Parse for Program {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        let globals = parser.parse()?;
        let functions = parser.parse()?;
        Ok(Program { globals, functions })
    }
}

impl Parse for FunDecList {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        let mut functions = Vec::new();
        while parser.peek_keyword()? == Some(Keyword::Fun) {
            functions.push(parser.parse()?);
        }
        Ok(Self(functions))
    }
}

impl Parse for FunDec {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parser.with_context("parsing function", |parser| {
            parser.keyword(Keyword::Fun)?;
            let Identifier {
                name: return_type, ..
            } = parser.parse()?;
            let name = parser.parse()?;
            parser.consume(TokenKind::OpenParen)?;
            let mut params = Vec::new();
            // `(int a, int b)`, a trailing comma is tolerated
            while parser.peek_token()? == Some(TokenKind::Identifier) {
                let Identifier { name: ty, .. } = parser.parse()?;
                let name = parser.parse()?;
                params.push(Parameter { ty, name });
                if !parser.eat(TokenKind::Comma)? {
                    break;
                }
            }
            parser.consume(TokenKind::CloseParen)?;
            let body: Body = parser.parse()?;
            parser.keyword(Keyword::EndFun)?;
            Ok(Self {
                return_type,
                name,
                params,
                body,
            })
        })
    }
}
