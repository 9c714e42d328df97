use super::{Parse, ParseRes, Parser};
use crate::ast::{Body, Identifier, StatementList, VarDec, VarDecList};
use crate::lexer::{Keyword, TokenKind};

impl Parse for Body {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parser.with_context("parsing body", |parser| {
            let decls = parser.parse()?;
            let statements = parser.parse()?;
            Ok(Self { decls, statements })
        })
    }
}

impl Parse for VarDecList {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        let mut decls = Vec::new();
        while parser.peek_keyword()? == Some(Keyword::Var) {
            decls.push(parser.parse()?);
        }
        Ok(Self(decls))
    }
}

impl Parse for VarDec {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parser.with_context("parsing variable declaration", |parser| {
            parser.keyword(Keyword::Var)?;
            let Identifier { name: ty, .. } = parser.parse()?;
            let mut names = Vec::new();
            loop {
                let Identifier { name, .. } = parser.parse()?;
                names.push(name);
                if !parser.eat(TokenKind::Comma)? {
                    break;
                }
            }
            parser.consume(TokenKind::Semicolon)?;
            Ok(Self { ty, names })
        })
    }
}

impl Parse for StatementList {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        let mut statements = vec![parser.parse()?];
        while parser.eat(TokenKind::Semicolon)? {
            statements.push(parser.parse()?);
        }
        Ok(Self(statements))
    }
}
