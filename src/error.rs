use crate::opcode::Opcode;

#[derive(thiserror::Error, Debug)]
pub enum CompileError {
    #[error("I/O error while reading the opcode table: {0}")]
    Io(#[from] std::io::Error),
    #[error("record for {opcode} truncated at line {line}: missing {missing}")]
    TruncatedRecord {
        opcode: Opcode,
        line: usize,
        missing: &'static str,
    },
    #[error("table ended at line {line} before {opcode}")]
    UnexpectedEnd { opcode: Opcode, line: usize },
    #[error("record at line {line} follows the last opcode 0xff")]
    TrailingRecords { line: usize },
    #[error("line {line}: expected a blank separator, found {found:?}")]
    Misaligned { line: usize, found: String },
    #[error("{opcode}: invalid cycle token {token:?}")]
    InvalidCycles { opcode: Opcode, token: String },
    #[error("invalid flags line {text:?}")]
    InvalidFlags { text: String },
    #[error("{opcode}: unsupported operand {operand:?} in `{instruction}`")]
    UnsupportedOperand {
        opcode: Opcode,
        instruction: String,
        operand: String,
    },
    #[error("{opcode}: `{instruction}` is missing an operand")]
    MissingOperand { opcode: Opcode, instruction: String },
    #[error("{opcode}: invalid restart target {token:?}")]
    InvalidRestart { opcode: Opcode, token: String },
    #[error("arm for {got} written out of order (expected {expected})")]
    OutOfOrder { expected: Opcode, got: Opcode },
    #[error("ticks_per_cycle must be non-zero")]
    ZeroCycleDivisor,
}

impl CompileError {
    /// Errors that can be rendered as a diagnostic arm instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CompileError::InvalidCycles { .. }
                | CompileError::UnsupportedOperand { .. }
                | CompileError::MissingOperand { .. }
                | CompileError::InvalidRestart { .. }
        )
    }
}

pub type Result<T, E = CompileError> = std::result::Result<T, E>;
