use crate::ast::FunDec;
use std::collections::HashMap;

/// Every local takes one 8-byte slot.
pub const SLOT_SIZE: i64 = 8;

/// Frame layout of one function: slot `i` (0-based) lives at `-(i + 1) * 8(%rbp)`, right
/// below the saved frame pointer.
///
/// Every slot the function will need is counted up front, but a local only becomes visible
/// once it is declared, so a nested `var` rebinds its name from that point on.
#[derive(Debug, Default)]
pub struct StackFrame {
    offsets: HashMap<String, i64>,
    declared: usize,
    reserved: usize,
}

impl StackFrame {
    /// Binds the parameters and reserves slots for every declaration of the body, nested
    /// ones included.
    pub fn for_function(function: &FunDec) -> Self {
        let locals: usize = function
            .body
            .all_decls()
            .iter()
            .map(|decl| decl.names.len())
            .sum();
        let mut frame = Self {
            reserved: function.params.len() + locals,
            ..Self::default()
        };
        for param in &function.params {
            frame.declare(&param.name.name);
        }
        frame
    }

    /// Gives `name` the next slot. A name declared twice points at its latest slot.
    pub fn declare(&mut self, name: &str) -> i64 {
        debug_assert!(self.declared < self.reserved, "`{}` has no reserved slot", name);
        let offset = Self::slot_offset(self.declared);
        self.declared += 1;
        self.offsets.insert(name.to_string(), offset);
        offset
    }

    pub const fn slot_offset(slot: usize) -> i64 {
        -(slot as i64 + 1) * SLOT_SIZE
    }

    pub fn offset_of(&self, name: &str) -> Option<i64> {
        self.offsets.get(name).copied()
    }

    pub const fn slots(&self) -> usize {
        self.reserved
    }

    /// Bytes to subtract from `%rsp`, keeping it 16-byte aligned.
    pub const fn reserved_size(&self) -> i64 {
        align_to_stack(self.reserved as i64 * SLOT_SIZE)
    }
}

const fn align_to_stack(amount: i64) -> i64 {
    (amount + 15) / 16 * 16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceMetadata;
    use crate::parser::Parser;

    /// Declares every local in the order the generator meets them.
    fn frame_of(source: &str) -> anyhow::Result<StackFrame> {
        let meta = SourceMetadata::new(source);
        let program = Parser::new(&meta).parse_program()?;
        let function = &program.functions.0[0];
        let mut frame = StackFrame::for_function(function);
        for decl in function.body.all_decls() {
            for name in &decl.names {
                frame.declare(name);
            }
        }
        Ok(frame)
    }

    #[test]
    fn parameters_then_locals_with_constant_stride() -> anyhow::Result<()> {
        let frame = frame_of(
            "fun int f(int a, int b) var int c, d; var bool e; return(a) endfun",
        )?;
        let offsets: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| frame.offset_of(name).unwrap())
            .collect();
        assert_eq!(offsets, [-8, -16, -24, -32, -40]);
        assert_eq!(frame.slots(), 5);
        assert_eq!(frame.reserved_size(), 48);
        Ok(())
    }

    #[test]
    fn nested_declarations_get_slots() -> anyhow::Result<()> {
        let frame = frame_of(
            "fun int f() var int a; if a then var int b; b = 1 else var int c; c = 2 endif; while a do var int d; d = 3 endwhile endfun",
        )?;
        assert_eq!(frame.offset_of("b"), Some(-16));
        assert_eq!(frame.offset_of("c"), Some(-24));
        assert_eq!(frame.offset_of("d"), Some(-32));
        assert_eq!(frame.reserved_size(), 32);
        Ok(())
    }

    #[test]
    fn locals_are_invisible_until_declared() -> anyhow::Result<()> {
        let meta = SourceMetadata::new("fun int f(int n) var int a; return(n) endfun");
        let program = Parser::new(&meta).parse_program()?;
        let frame = StackFrame::for_function(&program.functions.0[0]);
        assert_eq!(frame.offset_of("n"), Some(-8));
        assert_eq!(frame.offset_of("a"), None);
        assert_eq!(frame.reserved_size(), 16);
        Ok(())
    }

    #[test]
    fn empty_frames_reserve_nothing() -> anyhow::Result<()> {
        let frame = frame_of("fun int f() return(1) endfun")?;
        assert_eq!(frame.reserved_size(), 0);
        Ok(())
    }

    #[test]
    fn redeclared_names_use_the_latest_slot() -> anyhow::Result<()> {
        let frame = frame_of("fun int f() var int x; var int x; return(x) endfun")?;
        assert_eq!(frame.offset_of("x"), Some(-16));
        assert_eq!(frame.slots(), 2);
        Ok(())
    }
}
