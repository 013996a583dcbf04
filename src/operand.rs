//! Operand tokenizer.
//!
//! Turns an operand as written in the table (`(HL+)`, `SP+r8`, `d16`, ...)
//! into an [`AddressingMode`]. Condition codes and literal operands (`00H`)
//! are left to the mnemonic family that expects them.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl Register {
    pub fn parse(name: &str) -> Option<Self> {
        use Register::*;
        Some(match name {
            "A" => A,
            "B" => B,
            "C" => C,
            "D" => D,
            "E" => E,
            "H" => H,
            "L" => L,
            "AF" => AF,
            "BC" => BC,
            "DE" => DE,
            "HL" => HL,
            "SP" => SP,
            _ => return None,
        })
    }

    pub fn is_pair(self) -> bool {
        use Register::*;
        matches!(self, AF | BC | DE | HL | SP)
    }

    /// Name of the `RegIndex` variant selecting this register.
    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            A => "A",
            B => "B",
            C => "C",
            D => "D",
            E => "E",
            H => "H",
            L => "L",
            AF => "AF",
            BC => "BC",
            DE => "DE",
            HL => "HL",
            SP => "SP",
        }
    }

    /// Accessor method on the register file, e.g. `hl`.
    pub fn accessor(self) -> String {
        self.name().to_ascii_lowercase()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
}

impl Condition {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "NZ" => Condition::NZ,
            "Z" => Condition::Z,
            "NC" => Condition::NC,
            "C" => Condition::C,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Condition::NZ => "NZ",
            Condition::Z => "Z",
            Condition::NC => "NC",
            Condition::C => "C",
        }
    }
}

/// How an operand's value or storage location is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "register", rename_all = "snake_case")]
pub enum AddressingMode {
    /// `A`, `HL`
    Register(Register),
    /// `(BC)`: through the pair's 16-bit value.
    PairIndirect(Register),
    /// `d8`
    ImmediateByte,
    /// `d16`, `a16`
    ImmediateWord,
    /// `(a16)`: word address from the instruction stream.
    AbsoluteIndirect,
    /// `(a8)`: instruction-stream byte above the high-memory base.
    HighMemoryOffset,
    /// `(C)`: register value above the high-memory base.
    OffsetByRegister(Register),
    /// `(HL+)`
    AutoIncrement(Register),
    /// `(HL-)`
    AutoDecrement(Register),
    /// `r8`
    RelativeByte,
    /// `SP+r8`
    StackOffset,
}

impl AddressingMode {
    pub fn parse(text: &str) -> Option<Self> {
        let tokens = tokenize(text)?;
        use Token::*;
        match tokens.as_slice() {
            [Word(w)] => bare(w),
            [Word(sp), Plus, Word(off)] if sp == "SP" && bare(off) == Some(AddressingMode::RelativeByte) => {
                Some(AddressingMode::StackOffset)
            }
            [Open, Word(w), Close] => indirect(w),
            [Open, Word(w), Plus, Close] => Register::parse(w)
                .filter(|r| r.is_pair())
                .map(AddressingMode::AutoIncrement),
            [Open, Word(w), Minus, Close] => Register::parse(w)
                .filter(|r| r.is_pair())
                .map(AddressingMode::AutoDecrement),
            _ => None,
        }
    }

    pub fn is_indirect(self) -> bool {
        use AddressingMode::*;
        matches!(
            self,
            PairIndirect(_)
                | AbsoluteIndirect
                | HighMemoryOffset
                | OffsetByRegister(_)
                | AutoIncrement(_)
                | AutoDecrement(_)
        )
    }

    pub fn register(self) -> Option<Register> {
        match self {
            AddressingMode::Register(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_pair_register(self) -> bool {
        self.register().is_some_and(Register::is_pair)
    }
}

fn bare(word: &str) -> Option<AddressingMode> {
    match word {
        "d8" => Some(AddressingMode::ImmediateByte),
        "d16" | "a16" => Some(AddressingMode::ImmediateWord),
        "r8" => Some(AddressingMode::RelativeByte),
        w => Register::parse(w).map(AddressingMode::Register),
    }
}

fn indirect(word: &str) -> Option<AddressingMode> {
    if let Some(r) = Register::parse(word) {
        return match r {
            Register::C => Some(AddressingMode::OffsetByRegister(r)),
            r if r.is_pair() => Some(AddressingMode::PairIndirect(r)),
            _ => None,
        };
    }
    match word {
        "a16" => Some(AddressingMode::AbsoluteIndirect),
        "a8" => Some(AddressingMode::HighMemoryOffset),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Plus,
    Minus,
    Word(String),
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.trim().chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            c if c.is_ascii_alphanumeric() => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_alphanumeric() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
                continue;
            }
            _ => return None,
        }
        chars.next();
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AddressingMode as M;

    #[test]
    fn bare_operands() {
        assert_eq!(AddressingMode::parse("A"), Some(M::Register(Register::A)));
        assert_eq!(AddressingMode::parse("HL"), Some(M::Register(Register::HL)));
        assert_eq!(AddressingMode::parse("d8"), Some(M::ImmediateByte));
        assert_eq!(AddressingMode::parse("d16"), Some(M::ImmediateWord));
        assert_eq!(AddressingMode::parse("a16"), Some(M::ImmediateWord));
        assert_eq!(AddressingMode::parse("r8"), Some(M::RelativeByte));
        assert_eq!(AddressingMode::parse("SP+r8"), Some(M::StackOffset));
    }

    #[test]
    fn indirect_operands() {
        assert_eq!(AddressingMode::parse("(BC)"), Some(M::PairIndirect(Register::BC)));
        assert_eq!(AddressingMode::parse("(a16)"), Some(M::AbsoluteIndirect));
        assert_eq!(AddressingMode::parse("(a8)"), Some(M::HighMemoryOffset));
        assert_eq!(AddressingMode::parse("(C)"), Some(M::OffsetByRegister(Register::C)));
        assert_eq!(AddressingMode::parse("(HL+)"), Some(M::AutoIncrement(Register::HL)));
        assert_eq!(AddressingMode::parse("(HL-)"), Some(M::AutoDecrement(Register::HL)));
        assert!(AddressingMode::parse("(HL-)").unwrap().is_indirect());
    }

    #[test]
    fn unknown_shapes_rejected() {
        for t in ["", "00H", "NZ", "(B)", "(A+)", "SP+d8", "(HL", "x y", "HL,BC"] {
            assert_eq!(AddressingMode::parse(t), None, "operand {t:?}");
        }
    }

    #[test]
    fn conditions() {
        assert_eq!(Condition::parse("NC"), Some(Condition::NC));
        assert_eq!(Condition::parse("PO"), None);
        assert_eq!(Register::parse("C").map(|r| r.accessor()), Some("c".to_string()));
    }
}
