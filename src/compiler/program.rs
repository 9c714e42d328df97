use super::function::compile_function;
use super::{AssemblyOutput, CodegenRes, ProgramContext};
use crate::assembly::{Directive, Label};
use crate::ast::Program;
use crate::error::SourceMetadata;
use crate::labeling::Weights;
use itertools::Itertools;

/// `printf` format for `print`, escaped for `.string`.
const PRINT_FORMAT: &str = "%ld \\n";

/// Generates the whole assembly file: data section, every function, then the stack note.
pub fn compile_program(
    program: &Program,
    weights: &Weights,
    source: &SourceMetadata,
) -> CodegenRes<AssemblyOutput> {
    let mut ctx = ProgramContext::new(weights, source);
    let mut output = AssemblyOutput::new();

    output.push_directive(Directive::Data);
    output.push_label(Label::PrintFormat);
    output.push_directive(Directive::String(PRINT_FORMAT.to_string()));
    let globals: Vec<&str> = program.globals.names().unique().collect();
    tracing::debug!(target: "codegen::program", "globals: {}", globals.iter().join(", "));
    for name in globals {
        ctx.declare_global(name);
        output.push_label(Label::Symbol(name.to_string()));
        output.push_directive(Directive::Quad(0));
    }

    output.push_directive(Directive::Text);
    for function in &program.functions.0 {
        output.extend(compile_function(function, &mut ctx)?);
    }
    output.push_directive(Directive::Section(
        ".note.GNU-stack,\"\",@progbits".to_string(),
    ));
    Ok(output)
}
