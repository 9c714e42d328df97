use super::{Parse, ParseErrorKind, ParseRes, Parser, WantedSpec};
use crate::ast::{Expr, Statement};
use crate::lexer::{Keyword, Operator, TokenKind};

impl Parse for Statement {
    fn parse(parser: &mut Parser) -> ParseRes<Self> {
        parser.with_context("parsing statement", |parser| {
            match parser.expect_a_token(Some(WantedSpec::Description("statement")))? {
                TokenKind::Identifier => {
                    let target = parser.parse()?;
                    parser.consume(TokenKind::Operator {
                        kind: Operator::Equals,
                    })?;
                    let value = parser.parse()?;
                    Ok(Self::Assign { target, value })
                }
                TokenKind::Keyword(Keyword::Print) => {
                    parser.accept_current();
                    parser.consume(TokenKind::OpenParen)?;
                    let e = parser.parse()?;
                    parser.consume(TokenKind::CloseParen)?;
                    Ok(Self::Print(e))
                }
                TokenKind::Keyword(Keyword::Return) => {
                    parser.accept_current();
                    parser.consume(TokenKind::OpenParen)?;
                    // `return()` returns nothing
                    if parser.eat(TokenKind::CloseParen)? {
                        return Ok(Self::Return(None));
                    }
                    let e: Expr = parser.parse()?;
                    parser.consume(TokenKind::CloseParen)?;
                    Ok(Self::Return(Some(e)))
                }
                TokenKind::Keyword(Keyword::If) => {
                    parser.accept_current();
                    let condition = parser.parse()?;
                    parser.keyword(Keyword::Then)?;
                    let then_body = parser.parse()?;
                    let else_body = if parser.peek_keyword()? == Some(Keyword::Else) {
                        parser.accept_current();
                        Some(parser.parse()?)
                    } else {
                        None
                    };
                    parser.keyword(Keyword::EndIf)?;
                    Ok(Self::If {
                        condition,
                        then_body,
                        else_body,
                    })
                }
                TokenKind::Keyword(Keyword::While) => {
                    parser.accept_current();
                    let condition = parser.parse()?;
                    parser.keyword(Keyword::Do)?;
                    let body = parser.parse()?;
                    parser.keyword(Keyword::EndWhile)?;
                    Ok(Self::While { condition, body })
                }
                tok => parser.reject_current_token(ParseErrorKind::Expected {
                    wanted: WantedSpec::Description(
                        "statement (assignment, `print`, `return`, `if` or `while`)",
                    ),
                    found: tok,
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{ExprKind, Statement};
    use crate::parser::tests::parse_source;

    fn statements(body: &str) -> anyhow::Result<Vec<Statement>> {
        let program = parse_source(&format!("fun int main() {} endfun", body))?;
        let function = program.functions.0.into_iter().next().unwrap();
        Ok(function.body.statements.0)
    }

    #[test]
    fn bare_return_has_no_value() -> anyhow::Result<()> {
        let parsed = statements("return()")?;
        assert!(matches!(parsed[0], Statement::Return(None)));
        Ok(())
    }

    #[test]
    fn else_is_optional() -> anyhow::Result<()> {
        let parsed = statements("if a < 1 then print(1) endif; if a then print(1) else print(2) endif")?;
        assert!(matches!(parsed[0], Statement::If { else_body: None, .. }));
        assert!(matches!(parsed[1], Statement::If { else_body: Some(_), .. }));
        Ok(())
    }

    #[test]
    fn loops_hold_bodies_with_declarations() -> anyhow::Result<()> {
        let parsed = statements("while i < 10 do var int t; t = i; i = t + 1 endwhile")?;
        let Statement::While { condition, body } = &parsed[0] else {
            panic!("expected a loop, got {:?}", parsed[0]);
        };
        assert!(matches!(condition.kind, ExprKind::Binary { .. }));
        assert_eq!(body.decls.0[0].names, ["t"]);
        assert_eq!(body.statements.0.len(), 2);
        Ok(())
    }

    #[test]
    fn assignment_needs_equals() {
        let err = statements("x 1").unwrap_err();
        assert!(err.to_string().contains("operator `=`"), "{err}");
    }

    #[test]
    fn print_needs_parentheses() {
        assert!(statements("print 1").is_err());
    }
}
