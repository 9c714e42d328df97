//! Typed model of the x86-64 (AT&T syntax) text the compiler emits.
use crate::{format_instr, format_instr_args, write_instruction};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    Directive(Directive),
    Label(Label),
    Instruction(Instruction),
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Directive(direct) => write!(f, "{}", direct),
            Self::Instruction(instr) => write!(f, "\t{}", instr),
            Self::Label(name) => write!(f, "{}:", name),
        }
    }
}

impl From<Instruction> for Assembly {
    fn from(instr: Instruction) -> Self {
        Self::Instruction(instr)
    }
}

impl From<Directive> for Assembly {
    fn from(directive: Directive) -> Self {
        Self::Directive(directive)
    }
}

impl From<Label> for Assembly {
    fn from(label: Label) -> Self {
        Self::Label(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `.data`
    Data,
    /// `.text`
    Text,
    Global(String),
    /// NUL-terminated string literal, already escaped
    String(String),
    /// 8-byte slot with an initial value
    Quad(i64),
    /// `.section` with its flags, written verbatim
    Section(String),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Data => write!(f, ".data"),
            Self::Text => write!(f, ".text"),
            Self::Global(name) => write!(f, ".globl {}", name),
            Self::String(s) => write!(f, "\t.string \"{}\"", s),
            Self::Quad(value) => write!(f, "\t.quad {}", value),
            Self::Section(section) => write!(f, ".section {}", section),
        }
    }
}

/// Jump targets and data labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    /// A symbol visible to the linker: functions and globals
    Symbol(String),
    Else(usize),
    EndIf(usize),
    While(usize),
    EndWhile(usize),
    /// Shared exit of a function, target of every `return`
    FunctionEnd(String),
    /// The `printf` format string in `.data`
    PrintFormat,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Symbol(name) => f.write_str(name),
            Self::Else(n) => write!(f, ".Lelse{}", n),
            Self::EndIf(n) => write!(f, ".Lendif{}", n),
            Self::While(n) => write!(f, ".Lwhile{}", n),
            Self::EndWhile(n) => write!(f, ".Lendwhile{}", n),
            Self::FunctionEnd(name) => write!(f, ".Lend_{}", name),
            Self::PrintFormat => f.write_str(".Lprint_fmt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Move a quadword
    Movq { source: Operand, target: Operand },
    /// Move a doubleword; writing a 32 bit register clears its upper half
    Movl { source: Operand, target: DwordRegister },
    /// Zero-extend a byte register into a quadword one
    Movzbq { source: ByteRegister, target: Register },
    /// Load the address of a memory operand
    Leaq { source: Operand, target: Register },
    Pushq(Register),
    Popq(Register),
    Xchgq(Register, Register),
    /// `target += source`
    Addq { source: Operand, target: Register },
    /// `target -= source`
    Subq { source: Operand, target: Register },
    /// `target *= source` (signed)
    Imulq { source: Register, target: Register },
    /// Sign-extend `%rax` into `%rdx:%rax`
    Cqto,
    /// Signed divide `%rdx:%rax` by the operand, quotient in `%rax`
    Idivq(Register),
    /// Set flags from `target - source`
    Cmpq { source: Operand, target: Register },
    /// Set a byte register to 1 if the condition holds, 0 otherwise
    Set {
        condition: Condition,
        target: ByteRegister,
    },
    /// Jump, unconditionally when there is no condition
    Jump {
        condition: Option<Condition>,
        label: Label,
    },
    Call(String),
    Leave,
    Ret,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Movq { source, target } => write_instruction!(f, "movq", source, target),
            Self::Movl { source, target } => write_instruction!(f, "movl", source, target),
            Self::Movzbq { source, target } => write_instruction!(f, "movzbq", source, target),
            Self::Leaq { source, target } => write_instruction!(f, "leaq", source, target),
            Self::Pushq(register) => write_instruction!(f, "pushq", register),
            Self::Popq(register) => write_instruction!(f, "popq", register),
            Self::Xchgq(a, b) => write_instruction!(f, "xchgq", a, b),
            Self::Addq { source, target } => write_instruction!(f, "addq", source, target),
            Self::Subq { source, target } => write_instruction!(f, "subq", source, target),
            Self::Imulq { source, target } => write_instruction!(f, "imulq", source, target),
            Self::Cqto => write_instruction!(f, "cqto"),
            Self::Idivq(register) => write_instruction!(f, "idivq", register),
            Self::Cmpq { source, target } => write_instruction!(f, "cmpq", source, target),
            Self::Set { condition, target } => {
                write_instruction!(f, format!("set{}", condition), target)
            }
            Self::Jump {
                condition: Some(condition),
                label,
            } => write_instruction!(f, format!("j{}", condition), label),
            Self::Jump {
                condition: None,
                label,
            } => write_instruction!(f, "jmp", label),
            Self::Call(name) => write_instruction!(f, "call", name),
            Self::Leave => write_instruction!(f, "leave"),
            Self::Ret => write_instruction!(f, "ret"),
        }
    }
}

#[macro_export]
macro_rules! format_instr_args {
    () => { "" };
    ($arg:expr) => { "{}" };
    ($first:expr, $($rest:expr),+) => {
        concat!("{}, ", format_instr_args!($($rest),+))
    }
}

#[macro_export]
macro_rules! format_instr {
    ($name:expr) => { format_args!("{}", $name) };
    ($name:expr, $($args:expr),+) => {
        format_args!(concat!("{:6} ", format_instr_args!($($args),+)), $name, $($args),+)
    };
}

#[macro_export]
macro_rules! write_instruction {
    ($formatter:expr, $name:expr) => {
        $formatter.write_fmt(format_instr!($name))
    };
    ($formatter:expr, $name:expr, $($args:expr),+) => { $formatter.write_fmt(format_instr!($name, $($args),+)) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(i64),
    /// `offset(%base)`
    Memory { base: Register, offset: i64 },
    /// `symbol(%rip)`, used for globals and the print format
    RipRelative(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{}", reg),
            Self::Immediate(value) => write!(f, "${}", value),
            Self::Memory { base, offset } => write!(f, "{}({})", offset, base),
            Self::RipRelative(symbol) => write!(f, "{}(%rip)", symbol),
        }
    }
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Self::Register(register)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equal,
    Less,
    LessEqual,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Equal => "e",
            Self::Less => "l",
            Self::LessEqual => "le",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Rax,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
    Rbp,
    Rsp,
}

/// Where expression results live.
pub const ACCUMULATOR: Register = Register::Rax;
/// Holds the other operand of a binary operation.
pub const SECONDARY: Register = Register::Rcx;
/// System V integer argument registers, in order.
pub const ARGUMENT_REGISTERS: [Register; 6] = [
    Register::Rdi,
    Register::Rsi,
    Register::Rdx,
    Register::Rcx,
    Register::R8,
    Register::R9,
];

impl Register {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rax => "rax",
            Self::Rcx => "rcx",
            Self::Rdx => "rdx",
            Self::Rsi => "rsi",
            Self::Rdi => "rdi",
            Self::R8 => "r8",
            Self::R9 => "r9",
            Self::Rbp => "rbp",
            Self::Rsp => "rsp",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "%{}", self.name())
    }
}

/// 32 bit view of the accumulator, cleared before variadic calls and comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwordRegister {
    Eax,
}

impl fmt::Display for DwordRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Eax => write!(f, "%eax"),
        }
    }
}

/// Low byte of the accumulator, the only one `set<cc>` writes here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRegister {
    Al,
}

impl fmt::Display for ByteRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Al => write!(f, "%al"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_att_syntax() {
        let load = Instruction::Movq {
            source: Operand::Memory {
                base: Register::Rbp,
                offset: -16,
            },
            target: Operand::Register(ACCUMULATOR),
        };
        assert_eq!(load.to_string(), "movq   -16(%rbp), %rax");
        let store = Instruction::Movq {
            source: ACCUMULATOR.into(),
            target: Operand::RipRelative("counter".into()),
        };
        assert_eq!(store.to_string(), "movq   %rax, counter(%rip)");
        let clear = Instruction::Movl {
            source: Operand::Immediate(0),
            target: DwordRegister::Eax,
        };
        assert_eq!(clear.to_string(), "movl   $0, %eax");
    }

    #[test]
    fn renders_conditions_into_mnemonics() {
        let set = Instruction::Set {
            condition: Condition::LessEqual,
            target: ByteRegister::Al,
        };
        assert_eq!(set.to_string(), "setle  %al");
        let jump = Instruction::Jump {
            condition: Some(Condition::Equal),
            label: Label::Else(3),
        };
        assert_eq!(jump.to_string(), "je     .Lelse3");
        assert_eq!(Instruction::Ret.to_string(), "ret");
    }

    #[test]
    fn lines_are_indented_by_kind() {
        assert_eq!(Assembly::from(Label::FunctionEnd("main".into())).to_string(), ".Lend_main:");
        assert_eq!(Assembly::from(Instruction::Cqto).to_string(), "\tcqto");
        assert_eq!(Assembly::from(Directive::Quad(0)).to_string(), "\t.quad 0");
    }
}
