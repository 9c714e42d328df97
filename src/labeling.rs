//! Sethi–Ullman style register-need labeling.
//!
//! Every expression gets a weight: the number of registers (or temporaries) its evaluation
//! needs. The weights are kept in a side table keyed by [`ExprId`], filled once by
//! [`label_program`] and only read afterwards by the code generator to pick evaluation order
//! and decide when a spill can be skipped.
use crate::ast::{Body, Expr, ExprId, ExprKind, Program, Statement};
use std::collections::HashMap;

pub type Weight = u32;

#[derive(Debug, Default)]
pub struct Weights {
    inner: HashMap<ExprId, Weight>,
}

impl Weights {
    pub fn weight(&self, expr: &Expr) -> Option<Weight> {
        self.inner.get(&expr.id).copied()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    fn set(&mut self, expr: &Expr, weight: Weight) -> Weight {
        let previous = self.inner.insert(expr.id, weight);
        debug_assert!(previous.is_none(), "expression {:?} labeled twice", expr.id);
        weight
    }
}

pub fn label_program(program: &Program) -> Weights {
    let mut weights = Weights::default();
    for function in &program.functions.0 {
        tracing::debug!(target: "labeling", "labeling function `{}`", function.name);
        label_body(&function.body, &mut weights);
    }
    weights
}

fn label_body(body: &Body, weights: &mut Weights) {
    for statement in &body.statements.0 {
        match statement {
            Statement::Assign { value: e, .. } | Statement::Print(e) | Statement::Return(Some(e)) => {
                label_expr(e, true, weights);
            }
            Statement::Return(None) => {}
            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                label_expr(condition, true, weights);
                label_body(then_body, weights);
                if let Some(else_body) = else_body {
                    label_body(else_body, weights);
                }
            }
            Statement::While { condition, body } => {
                label_expr(condition, true, weights);
                label_body(body, weights);
            }
        }
    }
}

/// `is_left` is true for left operands and for expressions that stand on their own.
fn label_expr(expr: &Expr, is_left: bool, weights: &mut Weights) -> Weight {
    let weight = match &expr.kind {
        ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Variable(_) => Weight::from(is_left),
        ExprKind::Binary { lhs, rhs, .. } => {
            let l = label_expr(lhs, true, weights);
            let r = label_expr(rhs, false, weights);
            if l == r {
                l + 1
            } else {
                l.max(r)
            }
        }
        // each argument starts from a fresh register context
        ExprKind::Call { args, .. } => args
            .iter()
            .map(|arg| label_expr(arg, true, weights))
            .max()
            .unwrap_or(0),
    };
    tracing::trace!(target: "labeling", "{} => weight = {}", expr, weight);
    weights.set(expr, weight)
}

/// One line per expression, pre-order: the expression and its weight.
pub fn describe_weights(program: &Program, weights: &Weights) -> Vec<String> {
    program
        .expressions()
        .into_iter()
        .map(|expr| match weights.weight(expr) {
            Some(weight) => format!("{} => {}", expr, weight),
            None => format!("{} => (unlabeled)", expr),
        })
        .collect()
}
