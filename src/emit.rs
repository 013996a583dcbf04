//! Dispatch-arm generation.
//!
//! Every arm is a literal fragment of the form
//! `0x7e => { self.ld_byte(...); 2 },` written against the interpreter API:
//! `self.regs` accessors, `self.mmu.read_byte`, `fetch_ins_byte`/`fetch_ins_word`
//! and one primitive per mnemonic family.

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

use crate::config::{CompilerConfig, CostStyle};
use crate::cycles::CycleCost;
use crate::error::{CompileError, Result};
use crate::mnemonic::Family;
use crate::opcode::Opcode;
use crate::operand::{AddressingMode, Condition, Register};
use crate::table::{InstructionRecord, Slot, TableEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmKind {
    Code,
    Undefined,
    Diagnostic,
}

/// Generated code for one opcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arm {
    pub opcode: Opcode,
    pub kind: ArmKind,
    pub statements: Vec<String>,
    /// Control-flow call whose reported extra cost is added to `cost`.
    pub branch: Option<String>,
    pub cost: String,
}

impl Arm {
    pub fn undefined(opcode: Opcode) -> Self {
        Arm {
            opcode,
            kind: ArmKind::Undefined,
            statements: vec!["self.undefined_op(opcode);".to_string()],
            branch: None,
            cost: "1".to_string(),
        }
    }

    /// Stands in for a record that could not be compiled. The
    /// `compile_error!` keeps the spliced interpreter from building.
    pub fn diagnostic(opcode: Opcode, err: &CompileError, cost: Option<String>) -> Self {
        Arm {
            opcode,
            kind: ArmKind::Diagnostic,
            statements: vec![format!("compile_error!({:?});", err.to_string())],
            branch: None,
            cost: cost.unwrap_or_else(|| "0".to_string()),
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {{ ", self.opcode)?;
        for s in &self.statements {
            write!(f, "{s} ")?;
        }
        if let Some(call) = &self.branch {
            write!(f, "{call} as u8 + ")?;
        }
        write!(f, "{} }},", self.cost)
    }
}

pub trait ArmEmitter {
    fn emit(&self, entry: &TableEntry) -> Result<Arm>;
}

/// Statements plus the optional branch call, before the cost is attached.
#[derive(Debug)]
struct Code {
    statements: Vec<String>,
    branch: Option<String>,
}

impl Code {
    fn stmt(s: String) -> Self {
        Code {
            statements: vec![s],
            branch: None,
        }
    }

    fn branch(call: String) -> Self {
        Code {
            statements: Vec::new(),
            branch: Some(call),
        }
    }
}

/// Emits SM83 dispatch arms, one generator per mnemonic family.
#[derive(Debug, Clone)]
pub struct DispatchEmitter {
    ticks_per_cycle: u32,
    high_memory_base: u16,
    cost_style: CostStyle,
}

impl DispatchEmitter {
    pub fn new(cfg: &CompilerConfig) -> Self {
        Self {
            ticks_per_cycle: cfg.ticks_per_cycle.max(1),
            high_memory_base: cfg.high_memory_base,
            cost_style: cfg.cost_style,
        }
    }

    /// Machine-cycle cost of a record, rendered for the arm.
    pub fn render_cost(&self, rec: &InstructionRecord, branch: bool) -> Result<String> {
        let cost = rec.cost()?.scaled_down(self.ticks_per_cycle);
        Ok(match (cost, self.cost_style) {
            (CycleCost::Conditional { .. }, CostStyle::NotTaken) if branch => {
                cost.base().to_string()
            }
            _ => cost.to_string(),
        })
    }

    pub fn emit_record(&self, rec: &InstructionRecord) -> Result<Arm> {
        let family = Family::classify(&rec.mnemonic);
        let code = match family {
            Family::Load => self.load(rec)?,
            Family::RelativeJump => self.relative_jump(rec)?,
            Family::Return => self.ret(rec)?,
            Family::Call => self.call(rec)?,
            Family::Jump => self.jump(rec)?,
            Family::Increment => self.step(rec, "inc")?,
            Family::Decrement => self.step(rec, "dec")?,
            Family::Add { carry } => self.add(rec, carry)?,
            Family::Subtract { carry } => self.sub(rec, carry)?,
            Family::And => self.logic(rec, "and")?,
            Family::Or => self.logic(rec, "or")?,
            Family::Xor => self.logic(rec, "xor")?,
            Family::Compare => self.logic(rec, "cp")?,
            Family::Push => self.push(rec)?,
            Family::Pop => self.pop(rec)?,
            Family::Restart => self.restart(rec)?,
            Family::Prefix => Code::stmt("self.decode_cb();".to_string()),
            Family::Nullary => Code::stmt(format!("self.{}();", rec.mnemonic.to_ascii_lowercase())),
        };
        let cost = self.render_cost(rec, code.branch.is_some())?;
        Ok(Arm {
            opcode: rec.opcode,
            kind: ArmKind::Code,
            statements: code.statements,
            branch: code.branch,
            cost,
        })
    }

    // Operand resolution

    fn mode(&self, rec: &InstructionRecord, text: &str) -> Result<AddressingMode> {
        AddressingMode::parse(text).ok_or_else(|| unsupported(rec, text))
    }

    fn address(&self, mode: AddressingMode) -> Option<String> {
        use AddressingMode::*;
        Some(match mode {
            PairIndirect(p) | AutoIncrement(p) | AutoDecrement(p) => {
                format!("self.regs.{}()", p.accessor())
            }
            AbsoluteIndirect => "self.fetch_ins_word()".to_string(),
            HighMemoryOffset => format!("self.fetch_ins_byte() as u16 + {:#06x}", self.high_memory_base),
            OffsetByRegister(r) => format!(
                "self.regs.{}() as u16 + {:#06x}",
                r.accessor(),
                self.high_memory_base
            ),
            _ => return None,
        })
    }

    fn byte_source(&self, mode: AddressingMode) -> Option<String> {
        match mode {
            AddressingMode::Register(r) if !r.is_pair() => Some(format!("self.regs.{}()", r.accessor())),
            AddressingMode::ImmediateByte => Some("self.fetch_ins_byte()".to_string()),
            m => self.address(m).map(|a| format!("self.mmu.read_byte({a})")),
        }
    }

    /// `(selector, address)` arguments naming where a result is stored.
    fn store_target(&self, mode: AddressingMode, word: bool) -> Option<(String, String)> {
        match mode {
            AddressingMode::Register(r) if r.is_pair() == word => Some((reg_index(r), "0".to_string())),
            AddressingMode::Register(_) => None,
            m => self.address(m).map(|a| ("None".to_string(), a)),
        }
    }

    fn byte_operand(&self, rec: &InstructionRecord, text: &str) -> Result<String> {
        let mode = self.mode(rec, text)?;
        self.byte_source(mode).ok_or_else(|| unsupported(rec, text))
    }

    // Families

    fn load(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 2..=2)?;
        let dst = self.mode(rec, ops[0])?;
        let src = self.mode(rec, ops[1])?;
        let word = dst.is_pair_register() || src.is_pair_register() || src == AddressingMode::StackOffset;
        if word {
            return self.load_word(rec, &ops, dst, src);
        }

        let value = self.byte_source(src).ok_or_else(|| unsupported(rec, ops[1]))?;
        let (sel, addr) = self.store_target(dst, false).ok_or_else(|| unsupported(rec, ops[0]))?;
        let mut code = Code::stmt(format!("self.ld_byte({value}, {sel}, {addr});"));
        code.statements.extend(post_adjust(src));
        code.statements.extend(post_adjust(dst));
        Ok(code)
    }

    fn load_word(
        &self,
        rec: &InstructionRecord,
        ops: &[&str],
        dst: AddressingMode,
        src: AddressingMode,
    ) -> Result<Code> {
        let (sel, addr) = match dst {
            AddressingMode::AbsoluteIndirect => self.store_target(dst, true),
            AddressingMode::Register(_) => self.store_target(dst, true),
            _ => None,
        }
        .ok_or_else(|| unsupported(rec, ops[0]))?;

        let value = match src {
            AddressingMode::Register(r) if r.is_pair() => format!("self.regs.{}()", r.accessor()),
            AddressingMode::ImmediateWord => "self.fetch_ins_word()".to_string(),
            AddressingMode::StackOffset => return Ok(stack_offset_load(&sel, &addr)),
            _ => return Err(unsupported(rec, ops[1])),
        };
        Ok(Code::stmt(format!("self.ld_word({value}, {sel}, {addr});")))
    }

    fn split_condition<'r>(&self, rec: &InstructionRecord, ops: &[&'r str], arity: usize) -> Result<(Option<Condition>, Vec<&'r str>)> {
        if ops.len() > arity {
            let cc = Condition::parse(ops[0]).ok_or_else(|| unsupported(rec, ops[0]))?;
            Ok((Some(cc), ops[1..].to_vec()))
        } else {
            Ok((None, ops.to_vec()))
        }
    }

    fn relative_jump(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        let (cc, rest) = self.split_condition(rec, &ops, 1)?;
        if self.mode(rec, rest[0])? != AddressingMode::RelativeByte {
            return Err(unsupported(rec, rest[0]));
        }
        Ok(conditional("self.jr", "", cc))
    }

    fn ret(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 0..=1)?;
        let (cc, _) = self.split_condition(rec, &ops, 0)?;
        Ok(conditional("self.ret", "", cc))
    }

    fn call(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        let (cc, rest) = self.split_condition(rec, &ops, 1)?;
        if self.mode(rec, rest[0])? != AddressingMode::ImmediateWord {
            return Err(unsupported(rec, rest[0]));
        }
        Ok(conditional("self.call", "", cc))
    }

    fn jump(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        let (cc, rest) = self.split_condition(rec, &ops, 1)?;
        // `JP (HL)` jumps to the value of HL, not through it.
        let target = match self.mode(rec, rest[0])? {
            AddressingMode::ImmediateWord => "self.fetch_ins_word()".to_string(),
            AddressingMode::PairIndirect(r) | AddressingMode::Register(r) if r == Register::HL => {
                format!("self.regs.{}()", r.accessor())
            }
            _ => return Err(unsupported(rec, rest[0])),
        };
        Ok(conditional("self.jump", &format!("{target}, "), cc))
    }

    fn step(&self, rec: &InstructionRecord, primitive: &str) -> Result<Code> {
        let ops = expect_operands(rec, 1..=1)?;
        let mode = self.mode(rec, ops[0])?;
        let (sel, addr) = match mode {
            AddressingMode::Register(r) => (reg_index(r), "0".to_string()),
            AddressingMode::PairIndirect(_) => self.store_target(mode, false).ok_or_else(|| unsupported(rec, ops[0]))?,
            _ => return Err(unsupported(rec, ops[0])),
        };
        Ok(Code::stmt(format!("self.{primitive}({sel}, {addr});")))
    }

    fn add(&self, rec: &InstructionRecord, carry: bool) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        let src = ops[ops.len() - 1];
        if ops.len() == 2 {
            let dst = self.mode(rec, ops[0])?;
            match dst {
                AddressingMode::Register(Register::A) => {}
                AddressingMode::Register(Register::HL) if !carry => {
                    let src_mode = self.mode(rec, src)?;
                    if !src_mode.is_pair_register() {
                        return Err(unsupported(rec, src));
                    }
                    return Ok(Code::stmt(format!(
                        "self.add_word(self.regs.{}(), RegIndex::HL);",
                        src_mode.register().map(Register::accessor).unwrap_or_default()
                    )));
                }
                AddressingMode::Register(Register::SP) if !carry => {
                    if self.mode(rec, src)? != AddressingMode::RelativeByte {
                        return Err(unsupported(rec, src));
                    }
                    return Ok(Code::stmt(
                        "self.add_word(self.fetch_ins_byte() as i8 as i16 as u16, RegIndex::SP);".to_string(),
                    ));
                }
                _ => return Err(unsupported(rec, ops[0])),
            }
        }
        let value = self.byte_operand(rec, src)?;
        Ok(Code::stmt(format!("self.add_byte({value}, {carry});")))
    }

    fn sub(&self, rec: &InstructionRecord, carry: bool) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        if ops.len() == 2 && ops[0] != "A" {
            return Err(unsupported(rec, ops[0]));
        }
        let value = self.byte_operand(rec, ops[ops.len() - 1])?;
        Ok(Code::stmt(format!("self.sub_byte({value}, {carry});")))
    }

    fn logic(&self, rec: &InstructionRecord, primitive: &str) -> Result<Code> {
        let ops = expect_operands(rec, 1..=2)?;
        if ops.len() == 2 && ops[0] != "A" {
            return Err(unsupported(rec, ops[0]));
        }
        let value = self.byte_operand(rec, ops[ops.len() - 1])?;
        Ok(Code::stmt(format!("self.{primitive}({value});")))
    }

    fn pair(&self, rec: &InstructionRecord) -> Result<Register> {
        let ops = expect_operands(rec, 1..=1)?;
        self.mode(rec, ops[0])?
            .register()
            .filter(|r| r.is_pair())
            .ok_or_else(|| unsupported(rec, ops[0]))
    }

    fn push(&self, rec: &InstructionRecord) -> Result<Code> {
        let r = self.pair(rec)?;
        Ok(Code::stmt(format!("self.push(self.regs.{}());", r.accessor())))
    }

    fn pop(&self, rec: &InstructionRecord) -> Result<Code> {
        let r = self.pair(rec)?;
        Ok(Code::stmt(format!("self.pop({});", reg_variant(r))))
    }

    fn restart(&self, rec: &InstructionRecord) -> Result<Code> {
        let ops = expect_operands(rec, 1..=1)?;
        let target = parse_restart(ops[0]).ok_or_else(|| CompileError::InvalidRestart {
            opcode: rec.opcode,
            token: ops[0].to_string(),
        })?;
        Ok(Code::stmt(format!("self.rst({:#06x});", target as u16)))
    }
}

impl ArmEmitter for DispatchEmitter {
    fn emit(&self, entry: &TableEntry) -> Result<Arm> {
        match &entry.slot {
            Slot::Reserved => Ok(Arm::undefined(entry.opcode)),
            Slot::Record(rec) => self.emit_record(rec),
        }
    }
}

fn unsupported(rec: &InstructionRecord, operand: &str) -> CompileError {
    CompileError::UnsupportedOperand {
        opcode: rec.opcode,
        instruction: rec.instruction(),
        operand: operand.to_string(),
    }
}

fn expect_operands<'r>(rec: &'r InstructionRecord, arity: RangeInclusive<usize>) -> Result<Vec<&'r str>> {
    let ops = rec.operand_list();
    if ops.len() < *arity.start() {
        return Err(CompileError::MissingOperand {
            opcode: rec.opcode,
            instruction: rec.instruction(),
        });
    }
    if ops.len() > *arity.end() {
        return Err(unsupported(rec, &ops[*arity.end()..].join(",")));
    }
    Ok(ops)
}

fn reg_variant(r: Register) -> String {
    format!("RegIndex::{}", r.name())
}

fn reg_index(r: Register) -> String {
    format!("Some({})", reg_variant(r))
}

fn post_adjust(mode: AddressingMode) -> Option<String> {
    let (p, op) = match mode {
        AddressingMode::AutoIncrement(p) => (p, "wrapping_add"),
        AddressingMode::AutoDecrement(p) => (p, "wrapping_sub"),
        _ => return None,
    };
    let acc = p.accessor();
    Some(format!("self.regs.set_{acc}(self.regs.{acc}().{op}(1));"))
}

/// Control-flow call with an optional condition. Conditioned forms become a
/// branch term; unconditioned ones are a plain statement.
fn conditional(primitive: &str, args: &str, cc: Option<Condition>) -> Code {
    match cc {
        Some(cc) => Code::branch(format!("{primitive}({args}Some(Condition::{}))", cc.name())),
        None => Code::stmt(format!("{primitive}({args}None);")),
    }
}

/// `LD HL,SP+r8`: Z and N cleared, H and C from the unsigned low-byte add.
fn stack_offset_load(sel: &str, addr: &str) -> Code {
    Code {
        statements: vec![
            "let sp = self.regs.sp();".to_string(),
            "let offset = self.fetch_ins_byte();".to_string(),
            "self.regs.set_zflag(false);".to_string(),
            "self.regs.set_sflag(false);".to_string(),
            "self.regs.set_hflag((sp & 0x000f) + (offset as u16 & 0x000f) > 0x000f);".to_string(),
            "self.regs.set_cflag((sp & 0x00ff) + offset as u16 > 0x00ff);".to_string(),
            format!("self.ld_word(sp.wrapping_add(offset as i8 as i16 as u16), {sel}, {addr});"),
        ],
        branch: None,
    }
}

/// `38H` -> 0x38.
fn parse_restart(token: &str) -> Option<u8> {
    let digits = token
        .strip_suffix('H')
        .or_else(|| token.strip_suffix('h'))
        .unwrap_or(token);
    if digits.len() != 2 {
        return None;
    }
    u8::from_str_radix(digits, 16).ok()
}
