use std::io::Write;

use crate::emit::Arm;
use crate::error::{CompileError, Result};
use crate::opcode::Opcode;

/// Streams arms one line at a time, refusing anything out of order.
pub struct ArmWriter<W: Write> {
    out: W,
    expected: Option<Opcode>,
    written: usize,
}

impl<W: Write> ArmWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            expected: Some(Opcode::FIRST),
            written: 0,
        }
    }

    pub fn write_arm(&mut self, arm: &Arm) -> Result<()> {
        match self.expected {
            Some(expected) if expected == arm.opcode => {}
            expected => {
                return Err(CompileError::OutOfOrder {
                    expected: expected.unwrap_or(Opcode::LAST),
                    got: arm.opcode,
                })
            }
        }
        writeln!(self.out, "{arm}")?;
        self.expected = arm.opcode.next();
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// True once 0xff has been written.
    pub fn is_complete(&self) -> bool {
        self.expected.is_none()
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_in_order_and_rejects_gaps() {
        let mut w = ArmWriter::new(Vec::new());
        w.write_arm(&Arm::undefined(Opcode(0))).unwrap();
        w.write_arm(&Arm::undefined(Opcode(1))).unwrap();
        let err = w.write_arm(&Arm::undefined(Opcode(3))).unwrap_err();
        assert!(matches!(
            err,
            CompileError::OutOfOrder { expected: Opcode(2), got: Opcode(3) }
        ));
        assert_eq!(w.written(), 2);
        assert!(!w.is_complete());
        let out = String::from_utf8(w.finish().unwrap()).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.starts_with("0x00 => {"));
    }
}
