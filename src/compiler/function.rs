use super::stack::StackFrame;
use super::statement::compile_body;
use super::{AssemblyOutput, CodegenErrorKind, CodegenRes, Context, FunctionScope, ProgramContext};
use crate::assembly::{Directive, Instruction, Label, Operand, Register, ARGUMENT_REGISTERS};
use crate::ast::FunDec;

pub fn compile_function(
    function: &FunDec,
    program: &mut ProgramContext,
) -> CodegenRes<AssemblyOutput> {
    let name = &function.name.name;
    if function.params.len() > ARGUMENT_REGISTERS.len() {
        return Err(program.error(
            function.name.span,
            CodegenErrorKind::TooManyParameters {
                name: name.clone(),
                count: function.params.len(),
            },
        ));
    }
    let frame = StackFrame::for_function(function);
    let reserved = frame.reserved_size();
    tracing::debug!(
        target: "codegen::function",
        "function `{}`: {} slots, {} bytes reserved",
        name,
        frame.slots(),
        reserved
    );

    let mut output = AssemblyOutput::new();
    output.push_directive(Directive::Global(name.clone()));
    output.push_label(Label::Symbol(name.clone()));
    output.push_instruction(Instruction::Pushq(Register::Rbp));
    output.push_instruction(Instruction::Movq {
        source: Register::Rsp.into(),
        target: Register::Rbp.into(),
    });
    if reserved != 0 {
        output.push_instruction(Instruction::Subq {
            source: Operand::Immediate(reserved),
            target: Register::Rsp,
        });
    }
    // parameters occupy the first slots, in order
    for (slot, register) in ARGUMENT_REGISTERS.iter().take(function.params.len()).enumerate() {
        output.push_instruction(Instruction::Movq {
            source: (*register).into(),
            target: Operand::Memory {
                base: Register::Rbp,
                offset: StackFrame::slot_offset(slot),
            },
        });
    }

    let mut ctx = Context::new(
        program,
        FunctionScope {
            name: name.clone(),
            frame,
        },
    );
    let body = compile_body(&function.body, &mut ctx)
        .map_err(|e| e.add_context("generating function body"))?;
    output.extend(body);

    output.push_label(Label::FunctionEnd(name.clone()));
    output.push_instruction(Instruction::Leave);
    output.push_instruction(Instruction::Ret);
    Ok(output)
}
