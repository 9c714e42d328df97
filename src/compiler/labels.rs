use crate::assembly::Label;

/// Hands out the numbers behind branch labels. One per compilation, never reset, so
/// label pairs of different control structures cannot collide.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    current: usize,
}

impl LabelGenerator {
    pub fn next_number(&mut self) -> usize {
        self.current += 1;
        self.current
    }
    /// `(else, end)` targets of an `if`
    pub fn if_labels(&mut self) -> (Label, Label) {
        let n = self.next_number();
        (Label::Else(n), Label::EndIf(n))
    }
    /// `(loop top, end)` targets of a `while`
    pub fn while_labels(&mut self) -> (Label, Label) {
        let n = self.next_number();
        (Label::While(n), Label::EndWhile(n))
    }
}
