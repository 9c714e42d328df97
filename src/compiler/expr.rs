use super::{AssemblyOutput, CodegenErrorKind, CodegenRes, Context};
use crate::assembly::{
    ByteRegister, Condition, DwordRegister, Instruction, Operand, ACCUMULATOR, ARGUMENT_REGISTERS,
    SECONDARY,
};
use crate::ast::{BinaryOp, Expr, ExprKind, Identifier};

/// Evaluates `expr` into the accumulator.
pub fn compile_expr(expr: &Expr, ctx: &mut Context) -> CodegenRes<AssemblyOutput> {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Bool(_) | ExprKind::Variable(_) => {
            let mut output = AssemblyOutput::new();
            output.push_instruction(Instruction::Movq {
                source: leaf_operand(expr, ctx)?,
                target: ACCUMULATOR.into(),
            });
            Ok(output)
        }
        ExprKind::Binary { operator, lhs, rhs } => compile_binary(*operator, lhs, rhs, ctx),
        ExprKind::Call { name, args } => compile_call(name, args, ctx),
    }
}

fn leaf_operand(expr: &Expr, ctx: &Context) -> CodegenRes<Operand> {
    match &expr.kind {
        ExprKind::Number(value) => Ok(Operand::Immediate(*value)),
        ExprKind::Bool(value) => Ok(Operand::Immediate(i64::from(*value))),
        ExprKind::Variable(name) => ctx.locate(name, expr.span),
        ExprKind::Binary { .. } | ExprKind::Call { .. } => {
            unreachable!("{} is not a leaf", expr)
        }
    }
}

fn to_secondary() -> Instruction {
    Instruction::Movq {
        source: ACCUMULATOR.into(),
        target: SECONDARY.into(),
    }
}

// leaves the left operand in the accumulator and the right one in the secondary register
fn compile_binary(
    operator: BinaryOp,
    lhs: &Expr,
    rhs: &Expr,
    ctx: &mut Context,
) -> CodegenRes<AssemblyOutput> {
    let l = ctx.weight(lhs)?;
    let r = ctx.weight(rhs)?;
    tracing::trace!(target: "codegen::expr", "{} {} {} (weights {} / {})", lhs, operator, rhs, l, r);
    let mut output = AssemblyOutput::new();
    if operator.is_commutative() && r == 0 {
        output.extend(compile_expr(lhs, ctx)?);
        output.push_instruction(to_secondary());
        output.extend(compile_expr(rhs, ctx)?);
    } else if operator.is_commutative() && r > l {
        output.extend(compile_expr(rhs, ctx)?);
        output.push_instruction(ctx.spill());
        output.extend(compile_expr(lhs, ctx)?);
        output.push_instruction(to_secondary());
        output.push_instruction(ctx.restore(ACCUMULATOR));
        output.push_instruction(Instruction::Xchgq(ACCUMULATOR, SECONDARY));
    } else {
        output.extend(compile_expr(lhs, ctx)?);
        output.push_instruction(ctx.spill());
        output.extend(compile_expr(rhs, ctx)?);
        output.push_instruction(to_secondary());
        output.push_instruction(ctx.restore(ACCUMULATOR));
    }
    output.extend(apply_binary(operator));
    Ok(output)
}

fn apply_binary(operator: BinaryOp) -> AssemblyOutput {
    let mut output = AssemblyOutput::new();
    let condition = match operator {
        BinaryOp::Add => {
            output.push_instruction(Instruction::Addq {
                source: SECONDARY.into(),
                target: ACCUMULATOR,
            });
            return output;
        }
        BinaryOp::Subtract => {
            output.push_instruction(Instruction::Subq {
                source: SECONDARY.into(),
                target: ACCUMULATOR,
            });
            return output;
        }
        BinaryOp::Multiply => {
            output.push_instruction(Instruction::Imulq {
                source: SECONDARY,
                target: ACCUMULATOR,
            });
            return output;
        }
        BinaryOp::Divide => {
            output.push_instruction(Instruction::Cqto);
            output.push_instruction(Instruction::Idivq(SECONDARY));
            return output;
        }
        BinaryOp::Equals => Condition::Equal,
        BinaryOp::Less => Condition::Less,
        BinaryOp::LessEqual => Condition::LessEqual,
    };
    // cmpq sets flags from %rax - %rcx, so the condition reads "lhs <cc> rhs"
    output.push_instruction(Instruction::Cmpq {
        source: SECONDARY.into(),
        target: ACCUMULATOR,
    });
    output.push_instruction(Instruction::Movl {
        source: Operand::Immediate(0),
        target: DwordRegister::Eax,
    });
    output.push_instruction(Instruction::Set {
        condition,
        target: ByteRegister::Al,
    });
    output.push_instruction(Instruction::Movzbq {
        source: ByteRegister::Al,
        target: ACCUMULATOR,
    });
    output
}

fn compile_call(name: &Identifier, args: &[Expr], ctx: &mut Context) -> CodegenRes<AssemblyOutput> {
    if args.len() > ARGUMENT_REGISTERS.len() {
        return Err(ctx.error(
            name.span,
            CodegenErrorKind::TooManyArguments {
                name: name.name.clone(),
                count: args.len(),
            },
        ));
    }
    let mut output = AssemblyOutput::new();
    // leaves cannot disturb registers that are already filled
    let direct = args.iter().skip(1).all(Expr::is_leaf);
    tracing::debug!(
        target: "codegen::call",
        "call to `{}` with {} arguments ({})",
        name,
        args.len(),
        if direct { "direct" } else { "staged on the stack" }
    );
    if direct {
        for (arg, register) in args.iter().zip(ARGUMENT_REGISTERS) {
            output.extend(compile_expr(arg, ctx)?);
            output.push_instruction(Instruction::Movq {
                source: ACCUMULATOR.into(),
                target: register.into(),
            });
        }
    } else {
        for arg in args {
            output.extend(compile_expr(arg, ctx)?);
            output.push_instruction(ctx.spill());
        }
        for register in ARGUMENT_REGISTERS[..args.len()].iter().rev() {
            output.push_instruction(ctx.restore(*register));
        }
    }
    output.extend(ctx.aligned_call(name.name.as_str()));
    Ok(output)
}
