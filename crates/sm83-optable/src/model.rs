use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use sm83_opgen::cycles::CycleCost;
use sm83_opgen::mnemonic::Family;
use sm83_opgen::operand::AddressingMode;
use sm83_opgen::table::FlagEffects;
use sm83_opgen::{ArmEmitter, CompilerConfig, DispatchEmitter, Slot, TableReader};

#[derive(Debug, Clone, Serialize)]
pub struct OperandOut {
    pub text: String,
    /// `None` for condition codes and literals such as `00H`.
    pub mode: Option<AddressingMode>,
}

/// One opcode as the compiler sees it.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub opcode: u8,
    pub reserved: bool,
    pub instruction: Option<String>,
    pub family: Option<Family>,
    pub operands: Vec<OperandOut>,
    /// Raw clock ticks as written in the table.
    pub ticks: Option<CycleCost>,
    pub cycles: Option<CycleCost>,
    pub flags: Option<FlagEffects>,
    pub arm: String,
}

pub fn entries_from_str(text: &str, cfg: &CompilerConfig) -> Result<Vec<Entry>> {
    cfg.validate()?;
    let reader = TableReader::new(text.as_bytes(), cfg.reserved_set());
    let emitter = DispatchEmitter::new(cfg);
    let mut out = Vec::with_capacity(256);
    for entry in reader {
        let entry = entry?;
        let arm = emitter.emit(&entry)?.to_string();
        let e = match &entry.slot {
            Slot::Reserved => Entry {
                opcode: entry.opcode.value(),
                reserved: true,
                instruction: None,
                family: None,
                operands: Vec::new(),
                ticks: None,
                cycles: None,
                flags: None,
                arm,
            },
            Slot::Record(rec) => {
                let ticks = rec.cost()?;
                Entry {
                    opcode: entry.opcode.value(),
                    reserved: false,
                    instruction: Some(rec.instruction()),
                    family: Some(Family::classify(&rec.mnemonic)),
                    operands: rec
                        .operand_list()
                        .into_iter()
                        .map(|t| OperandOut { text: t.to_string(), mode: AddressingMode::parse(t) })
                        .collect(),
                    ticks: Some(ticks),
                    cycles: Some(ticks.scaled_down(cfg.ticks_per_cycle)),
                    flags: Some(rec.flag_effects()?),
                    arm,
                }
            }
        };
        debug!(opcode = e.opcode, reserved = e.reserved, "table entry");
        out.push(e);
    }
    Ok(out)
}

pub fn load_table(path: &Path, cfg: &CompilerConfig) -> Result<Vec<Entry>> {
    let text = std::fs::read_to_string(path)?;
    entries_from_str(&text, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = include_str!("../../../data/ops.txt");

    #[test]
    fn table_maps_all_opcodes() {
        let entries = entries_from_str(TABLE, &CompilerConfig::default()).unwrap();
        assert_eq!(entries.len(), 256);
        assert!(entries[0xd3].reserved);
        let ld = &entries[0x7e];
        assert_eq!(ld.instruction.as_deref(), Some("LD A,(HL)"));
        assert_eq!(ld.family, Some(Family::Load));
        assert_eq!(ld.cycles, Some(CycleCost::Fixed { cycles: 2 }));
        assert!(matches!(ld.operands[1].mode, Some(AddressingMode::PairIndirect(_))));
        let jr = &entries[0x20];
        assert_eq!(jr.operands[0].mode, None);
        assert_eq!(jr.ticks, Some(CycleCost::Conditional { taken: 12, not_taken: 8 }));
    }

    #[test]
    fn flags_are_parsed() {
        let entries = entries_from_str(TABLE, &CompilerConfig::default()).unwrap();
        let fx = entries[0x04].flags.unwrap();
        assert!(fx.computed.contains(sm83_opgen::table::Flags::Z));
        assert!(fx.reset.contains(sm83_opgen::table::Flags::N));
    }
}
