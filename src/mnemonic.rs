use serde::Serialize;

/// Generator family a mnemonic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Load,
    RelativeJump,
    Return,
    Call,
    Jump,
    Increment,
    Decrement,
    Add { carry: bool },
    Subtract { carry: bool },
    And,
    Or,
    Xor,
    Compare,
    Push,
    Pop,
    Restart,
    Prefix,
    /// Anything else: a same-named zero-argument primitive.
    Nullary,
}

#[derive(Debug, Clone, Copy)]
pub struct MnemonicDesc {
    pub mnemonic: &'static str,
    pub family: Family,
}

pub const TABLE: &[MnemonicDesc] = &[
    MnemonicDesc {
        mnemonic: "LD",
        family: Family::Load,
    },
    MnemonicDesc {
        mnemonic: "LDH",
        family: Family::Load,
    },
    MnemonicDesc {
        mnemonic: "JR",
        family: Family::RelativeJump,
    },
    MnemonicDesc {
        mnemonic: "RET",
        family: Family::Return,
    },
    MnemonicDesc {
        mnemonic: "RETI",
        family: Family::Return,
    },
    MnemonicDesc {
        mnemonic: "CALL",
        family: Family::Call,
    },
    MnemonicDesc {
        mnemonic: "JP",
        family: Family::Jump,
    },
    MnemonicDesc {
        mnemonic: "INC",
        family: Family::Increment,
    },
    MnemonicDesc {
        mnemonic: "DEC",
        family: Family::Decrement,
    },
    MnemonicDesc {
        mnemonic: "ADD",
        family: Family::Add { carry: false },
    },
    MnemonicDesc {
        mnemonic: "ADC",
        family: Family::Add { carry: true },
    },
    MnemonicDesc {
        mnemonic: "SUB",
        family: Family::Subtract { carry: false },
    },
    MnemonicDesc {
        mnemonic: "SBC",
        family: Family::Subtract { carry: true },
    },
    MnemonicDesc {
        mnemonic: "AND",
        family: Family::And,
    },
    MnemonicDesc {
        mnemonic: "OR",
        family: Family::Or,
    },
    MnemonicDesc {
        mnemonic: "XOR",
        family: Family::Xor,
    },
    MnemonicDesc {
        mnemonic: "CP",
        family: Family::Compare,
    },
    MnemonicDesc {
        mnemonic: "PUSH",
        family: Family::Push,
    },
    MnemonicDesc {
        mnemonic: "POP",
        family: Family::Pop,
    },
    MnemonicDesc {
        mnemonic: "RST",
        family: Family::Restart,
    },
    MnemonicDesc {
        mnemonic: "PREFIX",
        family: Family::Prefix,
    },
];

impl Family {
    pub fn classify(mnemonic: &str) -> Family {
        TABLE
            .iter()
            .find(|d| d.mnemonic.eq_ignore_ascii_case(mnemonic))
            .map(|d| d.family)
            .unwrap_or(Family::Nullary)
    }

    /// Families whose primitive reports an extra cost when the branch is taken.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Family::RelativeJump | Family::Return | Family::Call | Family::Jump
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Load => "load",
            Family::RelativeJump => "relative_jump",
            Family::Return => "return",
            Family::Call => "call",
            Family::Jump => "jump",
            Family::Increment => "increment",
            Family::Decrement => "decrement",
            Family::Add { carry: false } => "add",
            Family::Add { carry: true } => "add_with_carry",
            Family::Subtract { carry: false } => "subtract",
            Family::Subtract { carry: true } => "subtract_with_carry",
            Family::And => "and",
            Family::Or => "or",
            Family::Xor => "xor",
            Family::Compare => "compare",
            Family::Push => "push",
            Family::Pop => "pop",
            Family::Restart => "restart",
            Family::Prefix => "prefix",
            Family::Nullary => "nullary",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_and_fallback() {
        assert_eq!(Family::classify("LDH"), Family::Load);
        assert_eq!(Family::classify("adc"), Family::Add { carry: true });
        assert_eq!(Family::classify("RETI"), Family::Return);
        assert_eq!(Family::classify("HALT"), Family::Nullary);
        assert!(Family::classify("JR").is_branch());
        assert!(!Family::classify("RST").is_branch());
    }
}
