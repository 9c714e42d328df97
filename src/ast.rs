//! The tree produced by the parser and read by the labeling pass and the code generator.
use crate::error::Span;
use crate::lexer::Operator;

use std::fmt;

#[derive(Debug)]
pub struct Program {
    pub globals: VarDecList,
    pub functions: FunDecList,
}

#[derive(Debug, Default)]
pub struct FunDecList(pub Vec<FunDec>);

#[derive(Debug)]
pub struct FunDec {
    pub return_type: String,
    pub name: Identifier,
    pub params: Vec<Parameter>,
    pub body: Body,
}

#[derive(Debug)]
pub struct Parameter {
    pub ty: String,
    pub name: Identifier,
}

#[derive(Debug)]
pub struct Body {
    pub decls: VarDecList,
    pub statements: StatementList,
}

/// Declarations in source order; this order decides frame slots.
#[derive(Debug, Default)]
pub struct VarDecList(pub Vec<VarDec>);

/// `var <ty> a, b, c;`
#[derive(Debug)]
pub struct VarDec {
    pub ty: String,
    pub names: Vec<String>,
}

/// Never empty once parsed.
//#[derive(Debug)]
pub struct StatementList(pub Vec<Statement>);

impl fmt::Debug for StatementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg_struct = f.debug_struct("StatementList");
        for (i, stmt) in self.0.iter().enumerate() {
            dbg_struct.field(&i.to_string(), stmt);
        }
        dbg_struct.finish()
    }
}

#[derive(Debug)]
pub enum Statement {
    Assign {
        target: Identifier,
        value: Expr,
    },
    Print(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_body: Body,
        else_body: Option<Body>,
    },
    While {
        condition: Expr,
        body: Body,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Dense index handed out by the parser in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub usize);

#[derive(Debug)]
pub struct Expr {
    pub id: ExprId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug)]
pub enum ExprKind {
    Number(i64),
    Bool(bool),
    Variable(String),
    Binary {
        operator: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: Identifier,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Leaves only ever touch the accumulator when evaluated.
    pub const fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Variable(_)
        )
    }

    /// Pre-order walk over this expression and all of its subexpressions.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        visit(self);
        match &self.kind {
            ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Variable(_) => {}
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            ExprKind::Call { args, .. } => args.iter().for_each(|arg| arg.walk(visit)),
        }
    }
}

impl Body {
    pub fn walk_exprs<'a>(&'a self, visit: &mut impl FnMut(&'a Expr)) {
        for statement in &self.statements.0 {
            match statement {
                Statement::Assign { value: e, .. }
                | Statement::Print(e)
                | Statement::Return(Some(e)) => e.walk(visit),
                Statement::Return(None) => {}
                Statement::If {
                    condition,
                    then_body,
                    else_body,
                } => {
                    condition.walk(visit);
                    then_body.walk_exprs(visit);
                    if let Some(else_body) = else_body {
                        else_body.walk_exprs(visit);
                    }
                }
                Statement::While { condition, body } => {
                    condition.walk(visit);
                    body.walk_exprs(visit);
                }
            }
        }
    }

    /// Declarations of this body followed by those of nested bodies, in source order.
    pub fn all_decls(&self) -> Vec<&VarDec> {
        let mut decls: Vec<&VarDec> = self.decls.0.iter().collect();
        for statement in &self.statements.0 {
            match statement {
                Statement::If {
                    then_body,
                    else_body,
                    ..
                } => {
                    decls.extend(then_body.all_decls());
                    if let Some(else_body) = else_body {
                        decls.extend(else_body.all_decls());
                    }
                }
                Statement::While { body, .. } => decls.extend(body.all_decls()),
                Statement::Assign { .. } | Statement::Print(_) | Statement::Return(_) => {}
            }
        }
        decls
    }
}

impl Program {
    /// Every expression of the program, pre-order, function by function.
    pub fn expressions(&self) -> Vec<&Expr> {
        let mut exprs = Vec::new();
        for function in &self.functions.0 {
            function.body.walk_exprs(&mut |e| exprs.push(e));
        }
        exprs
    }
}

impl VarDecList {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().flat_map(|dec| dec.names.iter().map(String::as_str))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    /// `a < b < c` is rejected rather than grouped
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    Less,
    LessEqual,
}

impl BinaryOp {
    pub const fn from_operator(op: Operator) -> Option<Self> {
        Some(match op {
            Operator::Plus => Self::Add,
            Operator::Minus => Self::Subtract,
            Operator::Star => Self::Multiply,
            Operator::Slash => Self::Divide,
            Operator::DoubleEquals => Self::Equals,
            Operator::AngleLeft => Self::Less,
            Operator::AngleLeftEquals => Self::LessEqual,
            // assignment is a statement, not an operator
            Operator::Equals => return None,
        })
    }
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Equals | Self::Less | Self::LessEqual => 1,
            Self::Add | Self::Subtract => 2,
            Self::Multiply | Self::Divide => 3,
        }
    }
    pub const fn associativity(self) -> Associativity {
        match self {
            Self::Equals | Self::Less | Self::LessEqual => Associativity::None,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide => Associativity::Left,
        }
    }
    /// Operands may be evaluated in either order.
    pub const fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::Multiply | Self::Equals)
    }
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equals => "==",
            Self::Less => "<",
            Self::LessEqual => "<=",
        }
    }
}

// Printing produces source that parses back into the same tree.

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::Number(n) => write!(f, "{}", n),
            ExprKind::Bool(b) => write!(f, "{}", b),
            ExprKind::Variable(name) => f.write_str(name),
            ExprKind::Binary { operator, lhs, rhs } => write!(f, "({} {} {})", lhs, operator, rhs),
            ExprKind::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for VarDec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "var {} {};", self.ty, self.names.join(", "))
    }
}

impl fmt::Display for VarDecList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for dec in &self.0 {
            writeln!(f, "{}", dec)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Assign { target, value } => write!(f, "{} = {}", target, value),
            Self::Print(e) => write!(f, "print({})", e),
            Self::Return(Some(e)) => write!(f, "return({})", e),
            Self::Return(None) => write!(f, "return()"),
            Self::If {
                condition,
                then_body,
                else_body: Some(else_body),
            } => write!(f, "if {} then\n{}else\n{}endif", condition, then_body, else_body),
            Self::If {
                condition,
                then_body,
                else_body: None,
            } => write!(f, "if {} then\n{}endif", condition, then_body),
            Self::While { condition, body } => write!(f, "while {} do\n{}endwhile", condition, body),
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.decls)?;
        let statements = self.statements.0.iter().map(ToString::to_string);
        writeln!(f, "{}", itertools::join(statements, ";\n"))
    }
}

impl fmt::Display for FunDec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|param| format!("{} {}", param.ty, param.name));
        write!(
            f,
            "fun {} {}({})\n{}endfun",
            self.return_type,
            self.name,
            itertools::join(params, ", "),
            self.body
        )
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.globals)?;
        for function in &self.functions.0 {
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}
