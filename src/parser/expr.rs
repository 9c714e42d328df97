use super::{Parse, ParseErrorKind, ParseRes, Parser, WantedSpec};
use crate::ast::{Associativity, BinaryOp, Expr, ExprKind, Identifier};
use crate::lexer::{Keyword, TokenKind};

impl Parse for Expr {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parse_primary(parser)
            .and_then(|lhs| {
                parse_binary_expression(parser, lhs, 0)
                    .map_err(|e| e.add_context("parsing binary expression"))
            })
            .map_err(|x| x.add_context("parsing expression"))
    }
}

fn peek_binary_op(parser: &mut Parser) -> ParseRes<Option<BinaryOp>> {
    Ok(parser
        .peek_token()?
        .and_then(TokenKind::as_operator)
        .and_then(BinaryOp::from_operator))
}

// literal, variable, call or parenthesis
fn parse_primary(parser: &mut Parser) -> ParseRes<Expr> {
    parser.with_context("parsing primary expression", |parser| {
        match parser.expect_a_token(Some(WantedSpec::Description("expression")))? {
            TokenKind::OpenParen => {
                parser.accept_current();
                let e = parser.parse()?;
                parser
                    .consume(TokenKind::CloseParen)
                    .map_err(|x| x.add_context("as the end of the expression"))?;
                Ok(e)
            }
            TokenKind::Number => {
                let source = parser.current_token_source();
                let span = parser.current_token_span();
                let num = source.parse::<i64>().map_or_else(
                    |_| parser.reject_current_token(ParseErrorKind::InvalidNumber(source.to_string())),
                    Ok,
                )?;
                parser.accept_current();
                Ok(parser.new_expr(ExprKind::Number(num), span))
            }
            TokenKind::Keyword(kw @ (Keyword::True | Keyword::False)) => {
                let span = parser.current_token_span();
                parser.accept_current();
                Ok(parser.new_expr(ExprKind::Bool(kw == Keyword::True), span))
            }
            TokenKind::Identifier => {
                let name: Identifier = parser.parse()?;
                if parser.eat(TokenKind::OpenParen)? {
                    parse_call(parser, name)
                } else {
                    Ok(parser.new_expr(ExprKind::Variable(name.name), name.span))
                }
            }
            tok => parser.reject_current_token(ParseErrorKind::Expected {
                found: tok,
                wanted: WantedSpec::Description("open paren, literal or identifier"),
            }),
        }
    })
}

// the name and `(` are already consumed
fn parse_call(parser: &mut Parser, name: Identifier) -> ParseRes<Expr> {
    parser.with_context("parsing function call", |parser| {
        let mut args = vec![parser.parse()?];
        while parser.eat(TokenKind::Comma)? {
            args.push(parser.parse()?);
        }
        let close = parser.consume(TokenKind::CloseParen)?;
        let span = name.span.to(close);
        Ok(parser.new_expr(
            ExprKind::Call {
                name: name.clone(),
                args,
            },
            span,
        ))
    })
}

fn parse_binary_expression(
    parser: &mut Parser,
    mut lhs: Expr,
    min_precedence: u8,
) -> ParseRes<Expr> {
    let mut compared = false;
    while let Some(op) = peek_binary_op(parser)?.filter(|x| x.precedence() >= min_precedence) {
        if op.associativity() == Associativity::None {
            // a second comparison is left for the caller to reject
            if compared {
                break;
            }
            compared = true;
        }
        parser.accept_current();
        let mut rhs = parse_primary(parser)?;
        while let Some(op2) =
            peek_binary_op(parser)?.filter(|op2| op2.precedence() > op.precedence())
        {
            rhs = parse_binary_expression(parser, rhs, op2.precedence())?;
        }
        let span = lhs.span.to(rhs.span);
        lhs = parser.new_expr(
            ExprKind::Binary {
                operator: op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        );
    }
    Ok(lhs)
}
