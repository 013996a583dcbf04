use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};
use crate::opcode::{OpcodeSet, RESERVED_OPCODES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Abort on the first malformed record.
    Strict,
    /// Render malformed records as `compile_error!` arms and keep going.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStyle {
    /// `taken/not_taken`, as written in the table.
    Pair,
    /// Only the not-taken component; the primitive adds the taken extra.
    NotTaken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub ticks_per_cycle: u32,
    pub high_memory_base: u16,
    pub reserved: Vec<u8>,
    pub strictness: Strictness,
    pub cost_style: CostStyle,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            ticks_per_cycle: 4, // one machine cycle = four clock ticks
            high_memory_base: 0xff00,
            reserved: RESERVED_OPCODES.to_vec(),
            strictness: Strictness::Strict,
            cost_style: CostStyle::Pair,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let cfg: CompilerConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_cycle == 0 {
            return Err(CompileError::ZeroCycleDivisor);
        }
        Ok(())
    }

    pub fn reserved_set(&self) -> OpcodeSet {
        OpcodeSet::from_values(&self.reserved)
    }

    pub fn is_lenient(&self) -> bool {
        self.strictness == Strictness::Lenient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = CompilerConfig::from_json(r#"{ "strictness": "lenient", "cost_style": "not_taken" }"#).unwrap();
        assert!(cfg.is_lenient());
        assert_eq!(cfg.cost_style, CostStyle::NotTaken);
        assert_eq!(cfg.ticks_per_cycle, 4);
        assert_eq!(cfg.high_memory_base, 0xff00);
        assert_eq!(cfg.reserved_set().len(), 11);
    }

    #[test]
    fn zero_divisor_rejected() {
        let err = CompilerConfig::from_json(r#"{ "ticks_per_cycle": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("non-zero"));
    }
}
