//! x86-64 code generation from a labeled tree.
mod expr;
mod function;
pub mod labels;
mod program;
pub mod stack;
mod statement;

pub use program::compile_program;

use crate::assembly::*;
use crate::error::{self, SourceMetadata, Span};
use crate::labeling::{Weight, Weights};
use labels::LabelGenerator;
use stack::StackFrame;
use std::collections::vec_deque::Iter;
use std::collections::{HashSet, VecDeque};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum CodegenErrorKind {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error(
        "call to `{name}` passes {count} arguments, but at most {} fit in registers",
        ARGUMENT_REGISTERS.len()
    )]
    TooManyArguments { name: String, count: usize },
    #[error(
        "function `{name}` declares {count} parameters, but at most {} fit in registers",
        ARGUMENT_REGISTERS.len()
    )]
    TooManyParameters { name: String, count: usize },
    #[error("expression was never labeled with a weight")]
    MissingWeight,
}

pub type CodegenError = error::Error<CodegenErrorKind>;
pub type CodegenRes<T> = Result<T, CodegenError>;

#[repr(transparent)]
#[derive(Debug, Default)]
pub struct AssemblyOutput {
    inner: VecDeque<Assembly>,
}

impl AssemblyOutput {
    #[inline]
    pub fn push_asm(&mut self, asm: impl Into<Assembly>) {
        self.inner.push_back(asm.into());
    }
    #[inline]
    pub fn push_instruction(&mut self, instruction: Instruction) {
        self.push_asm(instruction)
    }
    #[inline]
    pub fn push_directive(&mut self, directive: Directive) {
        self.push_asm(directive)
    }
    #[inline]
    pub fn push_label(&mut self, label: Label) {
        self.push_asm(label)
    }
    pub fn iter(&self) -> Iter<Assembly> {
        self.inner.iter()
    }
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.inner.iter().filter_map(|asm| match asm {
            Assembly::Instruction(instr) => Some(instr),
            _ => None,
        })
    }
    pub fn new() -> Self {
        Self {
            inner: VecDeque::new(),
        }
    }
    pub fn extend(&mut self, mut other: Self) {
        self.inner.extend(other.inner.drain(..));
    }
}

impl fmt::Display for AssemblyOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for asm in &self.inner {
            writeln!(f, "{}", asm)?;
        }
        Ok(())
    }
}

/// State shared by every function of one compilation.
pub struct ProgramContext<'a> {
    weights: &'a Weights,
    source: &'a SourceMetadata<'a>,
    globals: HashSet<String>,
    labels: LabelGenerator,
}

impl<'a> ProgramContext<'a> {
    pub fn new(weights: &'a Weights, source: &'a SourceMetadata<'a>) -> Self {
        Self {
            weights,
            source,
            globals: HashSet::new(),
            labels: LabelGenerator::default(),
        }
    }

    pub fn error(&self, span: Span, kind: CodegenErrorKind) -> CodegenError {
        CodegenError::new(kind).with_source(span, self.source)
    }

    pub fn declare_global(&mut self, name: &str) {
        self.globals.insert(name.to_string());
    }
}

/// The function whose body is being generated.
#[derive(Debug)]
pub struct FunctionScope {
    pub name: String,
    pub frame: StackFrame,
}

/// Mutable state while generating one function body.
pub struct Context<'p, 'a> {
    program: &'p mut ProgramContext<'a>,
    function: FunctionScope,
    /// accumulator pushes not popped yet
    spilled: usize,
}

impl<'p, 'a> Context<'p, 'a> {
    pub fn new(program: &'p mut ProgramContext<'a>, function: FunctionScope) -> Self {
        Self {
            program,
            function,
            spilled: 0,
        }
    }

    pub fn error(&self, span: Span, kind: CodegenErrorKind) -> CodegenError {
        self.program.error(span, kind)
    }

    pub fn weight(&self, expr: &crate::ast::Expr) -> CodegenRes<Weight> {
        self.program
            .weights
            .weight(expr)
            .ok_or_else(|| self.error(expr.span, CodegenErrorKind::MissingWeight))
    }

    pub fn labels(&mut self) -> &mut LabelGenerator {
        &mut self.program.labels
    }

    /// Shared exit of the current function.
    pub fn return_label(&self) -> Label {
        Label::FunctionEnd(self.function.name.clone())
    }

    /// Binds a local from this point of the function on.
    pub fn declare_local(&mut self, name: &str) -> i64 {
        self.function.frame.declare(name)
    }

    /// Where a variable lives; locals shadow globals.
    pub fn locate(&self, name: &str, span: Span) -> CodegenRes<Operand> {
        if let Some(offset) = self.function.frame.offset_of(name) {
            Ok(Operand::Memory {
                base: Register::Rbp,
                offset,
            })
        } else if self.program.globals.contains(name) {
            Ok(Operand::RipRelative(name.to_string()))
        } else {
            Err(self.error(span, CodegenErrorKind::UnknownVariable(name.to_string())))
        }
    }

    pub fn spill(&mut self) -> Instruction {
        self.spilled += 1;
        Instruction::Pushq(ACCUMULATOR)
    }

    pub fn restore(&mut self, register: Register) -> Instruction {
        debug_assert!(self.spilled > 0, "popping a value that was never pushed");
        self.spilled -= 1;
        Instruction::Popq(register)
    }

    /// `call`, padding the stack when an odd number of spills would misalign it.
    pub fn aligned_call(&self, function: impl Into<String>) -> AssemblyOutput {
        let mut output = AssemblyOutput::new();
        let misaligned = self.spilled % 2 == 1;
        if misaligned {
            output.push_instruction(Instruction::Subq {
                source: Operand::Immediate(8),
                target: Register::Rsp,
            });
        }
        output.push_instruction(Instruction::Call(function.into()));
        if misaligned {
            output.push_instruction(Instruction::Addq {
                source: Operand::Immediate(8),
                target: Register::Rsp,
            });
        }
        output
    }
}
