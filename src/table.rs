//! Reader for the fixed-format opcode table.
//!
//! Each record spans four lines:
//!
//! ```text
//! LD A,(HL)      mnemonic and operands
//! 1  8           label (instruction length) and cycle token
//! - - - -        flag effects (Z N H C)
//!                blank separator
//! ```
//!
//! Records are bound to opcodes purely by position. Reserved opcodes consume
//! no record unless the table carries an explicit placeholder for them.

use std::io::{BufRead, Lines};
use std::iter::Peekable;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cycles::CycleCost;
use crate::error::{CompileError, Result};
use crate::opcode::{Opcode, OpcodeSet};

const PLACEHOLDER_MNEMONICS: &[&str] = &["-", "XX", "UNDEFINED", "ILLEGAL"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructionRecord {
    pub opcode: Opcode,
    /// 1-based line of the mnemonic.
    pub line: usize,
    pub mnemonic: String,
    pub operands: String,
    pub label: String,
    pub cycle_token: String,
    pub flags: String,
}

impl InstructionRecord {
    /// Operand tokens split on commas; empty for zero-operand mnemonics.
    pub fn operand_list(&self) -> Vec<&str> {
        if self.operands.is_empty() {
            return Vec::new();
        }
        self.operands.split(',').map(str::trim).collect()
    }

    /// The record as written, e.g. `JP Z,a16`.
    pub fn instruction(&self) -> String {
        if self.operands.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, self.operands)
        }
    }

    pub fn cost(&self) -> Result<CycleCost> {
        CycleCost::parse(&self.cycle_token).ok_or_else(|| CompileError::InvalidCycles {
            opcode: self.opcode,
            token: self.cycle_token.clone(),
        })
    }

    pub fn flag_effects(&self) -> Result<FlagEffects> {
        FlagEffects::parse(&self.flags)
    }
}

bitflags! {
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags: u8 {
const Z = 1 << 7; // Zero
const N = 1 << 6; // Subtract
const H = 1 << 5; // Half carry
const C = 1 << 4; // Carry
}
}

/// What an instruction does to each flag, from the table's third line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagEffects {
    pub reset: Flags,
    pub set: Flags,
    pub computed: Flags,
}

impl FlagEffects {
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || CompileError::InvalidFlags {
            text: text.to_string(),
        };
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != 4 {
            return Err(invalid());
        }
        let mut fx = FlagEffects {
            reset: Flags::empty(),
            set: Flags::empty(),
            computed: Flags::empty(),
        };
        for (tok, flag) in tokens.iter().zip([Flags::Z, Flags::N, Flags::H, Flags::C]) {
            match *tok {
                "-" => {}
                "0" => fx.reset |= flag,
                "1" => fx.set |= flag,
                t if t.len() == 1 && t.bytes().all(|b| b.is_ascii_uppercase()) => {
                    fx.computed |= flag
                }
                _ => return Err(invalid()),
            }
        }
        Ok(fx)
    }

    pub fn affected(&self) -> Flags {
        self.reset | self.set | self.computed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Reserved opcode; gets the fallback arm.
    Reserved,
    Record(InstructionRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub opcode: Opcode,
    pub slot: Slot,
}

/// Yields one [`TableEntry`] per opcode, 0x00 through 0xff, in order.
pub struct TableReader<R: BufRead> {
    lines: Peekable<Lines<R>>,
    line: usize,
    next: Option<Opcode>,
    reserved: OpcodeSet,
    stop_on_short_input: bool,
    done: bool,
}

impl<R: BufRead> TableReader<R> {
    pub fn new(input: R, reserved: OpcodeSet) -> Self {
        Self {
            lines: input.lines().peekable(),
            line: 0,
            next: Some(Opcode::FIRST),
            reserved,
            stop_on_short_input: false,
            done: false,
        }
    }

    /// When set, a table that ends early or runs past 0xff is logged and
    /// the iteration simply stops.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.stop_on_short_input = lenient;
        self
    }

    fn next_line(&mut self) -> Option<std::io::Result<String>> {
        let l = self.lines.next()?;
        self.line += 1;
        Some(l)
    }

    fn peek_is_placeholder(&mut self) -> bool {
        match self.lines.peek() {
            Some(Ok(l)) => l
                .split_whitespace()
                .next()
                .is_some_and(|w| PLACEHOLDER_MNEMONICS.contains(&w.to_ascii_uppercase().as_str())),
            _ => false,
        }
    }

    /// Consumes blank lines; true when only blank lines remained.
    fn rest_is_blank(&mut self) -> Result<bool> {
        loop {
            match self.lines.peek() {
                None => return Ok(true),
                Some(Ok(l)) if !l.trim().is_empty() => return Ok(false),
                _ => {}
            }
            if let Some(Err(e)) = self.next_line() {
                return Err(e.into());
            }
        }
    }

    fn required_line(&mut self, opcode: Opcode, missing: &'static str) -> Result<String> {
        match self.next_line() {
            Some(l) => Ok(l?),
            None => Err(CompileError::TruncatedRecord {
                opcode,
                line: self.line + 1,
                missing,
            }),
        }
    }

    fn read_record(&mut self, opcode: Opcode) -> Result<Option<InstructionRecord>> {
        let blank = match self.lines.peek() {
            None => return Ok(None),
            Some(Ok(l)) => l.trim().is_empty(),
            Some(Err(_)) => false,
        };
        if blank {
            if self.rest_is_blank()? {
                return Ok(None);
            }
            let found = match self.lines.peek() {
                Some(Ok(l)) => l.clone(),
                _ => String::new(),
            };
            return Err(CompileError::Misaligned {
                line: self.line + 1,
                found,
            });
        }
        let head = self.required_line(opcode, "mnemonic line")?;
        let line = self.line;
        let head = head.trim();
        let (mnemonic, operands) = match head.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (head, ""),
        };

        let cycle_line = self.required_line(opcode, "cycle line")?;
        let mut cycle_parts = cycle_line.split_whitespace();
        let label = cycle_parts.next().unwrap_or_default().to_string();
        let cycle_token = cycle_parts.next().unwrap_or_default().to_string();

        let flags = self.required_line(opcode, "flags line")?.trim().to_string();

        // The separator may be absent after the final record.
        if let Some(sep) = self.next_line() {
            let sep = sep?;
            if !sep.trim().is_empty() {
                return Err(CompileError::Misaligned {
                    line: self.line,
                    found: sep,
                });
            }
        }

        Ok(Some(InstructionRecord {
            opcode,
            line,
            mnemonic: mnemonic.to_ascii_uppercase(),
            operands: operands.to_string(),
            label,
            cycle_token,
            flags,
        }))
    }

    fn step(&mut self) -> Result<Option<TableEntry>> {
        let Some(opcode) = self.next else {
            self.done = true;
            if self.rest_is_blank()? {
                return Ok(None);
            }
            if self.stop_on_short_input {
                warn!(line = self.line + 1, "ignoring records past opcode 0xff");
                return Ok(None);
            }
            return Err(CompileError::TrailingRecords {
                line: self.line + 1,
            });
        };

        let slot = if self.reserved.contains(opcode) {
            if self.peek_is_placeholder() {
                self.read_record(opcode)?;
            }
            Slot::Reserved
        } else {
            match self.read_record(opcode)? {
                Some(rec) => Slot::Record(rec),
                None => {
                    self.done = true;
                    if self.stop_on_short_input {
                        warn!(%opcode, "table ended early");
                        return Ok(None);
                    }
                    return Err(CompileError::UnexpectedEnd {
                        opcode,
                        line: self.line + 1,
                    });
                }
            }
        };
        debug!(%opcode, ?slot, "read table entry");
        self.next = opcode.next();
        Ok(Some(TableEntry { opcode, slot }))
    }
}

impl<R: BufRead> Iterator for TableReader<R> {
    type Item = Result<TableEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
