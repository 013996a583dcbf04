pub mod config;
pub mod cycles;
pub mod emit;
pub mod error;
pub mod mnemonic;
pub mod opcode;
pub mod operand;
pub mod table;
pub mod writer;

pub use config::{CompilerConfig, CostStyle, Strictness};
pub use emit::{Arm, ArmEmitter, ArmKind, DispatchEmitter};
pub use error::CompileError;
pub use opcode::Opcode;
pub use table::{InstructionRecord, Slot, TableEntry, TableReader};
pub use writer::ArmWriter;

use std::io::{BufRead, Write};

use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub arms: usize,
    pub code: usize,
    pub undefined: usize,
    pub diagnostics: usize,
    /// Every opcode through 0xff was emitted.
    pub complete: bool,
}

/// Reads the opcode table from `input` and streams one dispatch arm per
/// opcode to `output`.
pub fn compile<R: BufRead, W: Write>(
    input: R,
    output: W,
    cfg: &CompilerConfig,
) -> error::Result<Summary> {
    cfg.validate()?;
    let reader = TableReader::new(input, cfg.reserved_set()).lenient(cfg.is_lenient());
    let emitter = DispatchEmitter::new(cfg);
    let mut writer = ArmWriter::new(output);
    let mut summary = Summary::default();

    for entry in reader {
        let entry = entry?;
        let arm = match emitter.emit(&entry) {
            Ok(arm) => arm,
            Err(err) if cfg.is_lenient() && err.is_recoverable() => {
                warn!(opcode = %entry.opcode, %err, "emitting diagnostic arm");
                let cost = match &entry.slot {
                    Slot::Record(rec) => {
                        let branch = mnemonic::Family::classify(&rec.mnemonic).is_branch();
                        emitter.render_cost(rec, branch).ok()
                    }
                    Slot::Reserved => None,
                };
                Arm::diagnostic(entry.opcode, &err, cost)
            }
            Err(err) => return Err(err),
        };
        debug!(opcode = %arm.opcode, kind = ?arm.kind, "emit arm");
        match arm.kind {
            ArmKind::Code => summary.code += 1,
            ArmKind::Undefined => summary.undefined += 1,
            ArmKind::Diagnostic => summary.diagnostics += 1,
        }
        writer.write_arm(&arm)?;
    }

    summary.arms = writer.written();
    summary.complete = writer.is_complete();
    writer.finish()?;
    info!(
        arms = summary.arms,
        undefined = summary.undefined,
        diagnostics = summary.diagnostics,
        complete = summary.complete,
        "compiled opcode table"
    );
    Ok(summary)
}

/// [`compile`] into a string.
pub fn compile_to_string(table: &str, cfg: &CompilerConfig) -> error::Result<(String, Summary)> {
    let mut out = Vec::new();
    let summary = compile(table.as_bytes(), &mut out, cfg)?;
    Ok((String::from_utf8_lossy(&out).into_owned(), summary))
}
