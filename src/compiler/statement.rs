use super::expr::compile_expr;
use super::{AssemblyOutput, CodegenRes, Context};
use crate::assembly::{
    Condition, DwordRegister, Instruction, Label, Operand, Register, ACCUMULATOR,
};
use crate::ast::{Body, Expr, Statement};

/// Declarations only bind names to their reserved slots; statements produce the code.
pub fn compile_body(body: &Body, ctx: &mut Context) -> CodegenRes<AssemblyOutput> {
    for name in body.decls.names() {
        ctx.declare_local(name);
    }
    let mut output = AssemblyOutput::new();
    for statement in &body.statements.0 {
        output.extend(compile_statement(statement, ctx)?);
    }
    Ok(output)
}

fn compile_statement(statement: &Statement, ctx: &mut Context) -> CodegenRes<AssemblyOutput> {
    match statement {
        Statement::Assign { target, value } => {
            let mut output = compile_expr(value, ctx)?;
            output.push_instruction(Instruction::Movq {
                source: ACCUMULATOR.into(),
                target: ctx.locate(&target.name, target.span)?,
            });
            Ok(output)
        }
        Statement::Print(value) => {
            let mut output = compile_expr(value, ctx)?;
            output.push_instruction(Instruction::Movq {
                source: ACCUMULATOR.into(),
                target: Register::Rsi.into(),
            });
            output.push_instruction(Instruction::Leaq {
                source: Operand::RipRelative(Label::PrintFormat.to_string()),
                target: Register::Rdi,
            });
            // variadic: %al holds the number of vector registers used
            output.push_instruction(Instruction::Movl {
                source: Operand::Immediate(0),
                target: DwordRegister::Eax,
            });
            output.extend(ctx.aligned_call("printf@PLT"));
            Ok(output)
        }
        Statement::Return(value) => compile_return(value.as_ref(), ctx),
        Statement::If {
            condition,
            then_body,
            else_body,
        } => {
            let (else_label, end_label) = ctx.labels().if_labels();
            let mut output = compile_condition(condition, else_label.clone(), ctx)?;
            output.extend(compile_body(then_body, ctx)?);
            output.push_instruction(Instruction::Jump {
                condition: None,
                label: end_label.clone(),
            });
            output.push_label(else_label);
            if let Some(else_body) = else_body {
                output.extend(compile_body(else_body, ctx)?);
            }
            output.push_label(end_label);
            Ok(output)
        }
        Statement::While { condition, body } => {
            let (loop_label, end_label) = ctx.labels().while_labels();
            let mut output = AssemblyOutput::new();
            output.push_label(loop_label.clone());
            output.extend(compile_condition(condition, end_label.clone(), ctx)?);
            output.extend(compile_body(body, ctx)?);
            output.push_instruction(Instruction::Jump {
                condition: None,
                label: loop_label,
            });
            output.push_label(end_label);
            Ok(output)
        }
    }
}

// jumps to `otherwise` when the condition evaluates to zero
fn compile_condition(
    condition: &Expr,
    otherwise: Label,
    ctx: &mut Context,
) -> CodegenRes<AssemblyOutput> {
    let mut output = compile_expr(condition, ctx)?;
    output.push_instruction(Instruction::Cmpq {
        source: Operand::Immediate(0),
        target: ACCUMULATOR,
    });
    output.push_instruction(Instruction::Jump {
        condition: Some(Condition::Equal),
        label: otherwise,
    });
    Ok(output)
}

fn compile_return(value: Option<&Expr>, ctx: &mut Context) -> CodegenRes<AssemblyOutput> {
    let mut output = match value {
        Some(value) => compile_expr(value, ctx)?,
        None => {
            let mut output = AssemblyOutput::new();
            output.push_instruction(Instruction::Movq {
                source: Operand::Immediate(0),
                target: ACCUMULATOR.into(),
            });
            output
        }
    };
    output.push_instruction(Instruction::Jump {
        condition: None,
        label: ctx.return_label(),
    });
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::super::tests::compile_source;
    use super::*;
    use crate::assembly::Assembly;
    use std::collections::HashSet;

    #[test]
    fn branch_labels_are_unique() -> anyhow::Result<()> {
        let output = compile_source(
            "fun int main() var int i; i = 0;
             while i < 3 do
                if i == 1 then print(i) endif;
                while i < 2 do i = i + 1 endwhile;
                if i < 0 then print(0) else print(1) endif
             endwhile;
             if true then print(2) endif
             endfun",
        )?;
        let labels: Vec<_> = output
            .iter()
            .filter_map(|asm| match asm {
                Assembly::Label(label) => Some(label.to_string()),
                _ => None,
            })
            .collect();
        let unique: HashSet<_> = labels.iter().collect();
        assert_eq!(labels.len(), unique.len(), "{labels:?}");
        for expected in [".Lwhile1", ".Lelse2", ".Lendwhile3", ".Lendif4", ".Lelse5"] {
            assert!(labels.iter().any(|l| l == expected), "{expected} in {labels:?}");
        }
        Ok(())
    }

    #[test]
    fn if_without_else_still_emits_the_else_label() -> anyhow::Result<()> {
        let text = compile_source("fun int main() if 1 < 2 then print(1) endif endfun")?.to_string();
        let expected = "\tcmpq   $0, %rax\n\tje     .Lelse1\n";
        assert!(text.contains(expected), "{text}");
        assert!(text.contains("\tjmp    .Lendif1\n.Lelse1:\n.Lendif1:\n"), "{text}");
        Ok(())
    }

    #[test]
    fn bare_return_yields_zero() -> anyhow::Result<()> {
        let text = compile_source("fun int main() return() endfun")?.to_string();
        assert!(text.contains("\tmovq   $0, %rax\n\tjmp    .Lend_main\n"), "{text}");
        Ok(())
    }

    #[test]
    fn print_passes_format_and_value() -> anyhow::Result<()> {
        let text = compile_source("var int g;\nfun int main() g = 4; print(g) endfun")?.to_string();
        assert!(text.contains("\tmovq   %rax, g(%rip)\n"), "{text}");
        assert!(text.contains(
            "\tmovq   %rax, %rsi\n\tleaq   .Lprint_fmt(%rip), %rdi\n\tmovl   $0, %eax\n\tcall   printf@PLT\n"
        ), "{text}");
        Ok(())
    }
}
