use std::fmt;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

/// Opcodes the SM83 leaves undefined; each gets the fallback arm.
pub const RESERVED_OPCODES: [u8; 11] = [
    0xd3, 0xe3, 0xe4, 0xf4, 0xdb, 0xeb, 0xec, 0xfc, 0xdd, 0xed, 0xfd,
];

/// One-byte instruction identifier. Assigned from input order, never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Opcode(pub u8);

impl Opcode {
    pub const FIRST: Opcode = Opcode(0x00);
    pub const LAST: Opcode = Opcode(0xff);

    pub fn value(self) -> u8 {
        self.0
    }

    /// Following opcode, or `None` after 0xff.
    pub fn next(self) -> Option<Opcode> {
        self.0.checked_add(1).map(Opcode)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

/// Membership mask over all 256 opcodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeSet {
    bits: BitArr!(for 256, in u64),
}

impl OpcodeSet {
    pub fn empty() -> Self {
        Self { bits: BitArray::ZERO }
    }

    pub fn reserved() -> Self {
        Self::from_values(&RESERVED_OPCODES)
    }

    pub fn from_values(values: &[u8]) -> Self {
        let mut set = Self::empty();
        for &v in values {
            set.insert(Opcode(v));
        }
        set
    }

    pub fn insert(&mut self, op: Opcode) {
        self.bits.set(op.0 as usize, true);
    }

    pub fn contains(&self, op: Opcode) -> bool {
        self.bits[op.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    pub fn iter(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.bits.iter_ones().map(|i| Opcode(i as u8))
    }
}

impl Default for OpcodeSet {
    fn default() -> Self {
        Self::reserved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_set_has_eleven_members() {
        let set = OpcodeSet::reserved();
        assert_eq!(set.len(), 11);
        assert!(set.contains(Opcode(0xd3)));
        assert!(set.contains(Opcode(0xfd)));
        assert!(!set.contains(Opcode(0xcb)));
        let listed: Vec<u8> = set.iter().map(Opcode::value).collect();
        assert_eq!(listed.first(), Some(&0xd3));
        assert_eq!(listed.last(), Some(&0xfd));
    }

    #[test]
    fn opcode_display_and_next() {
        assert_eq!(Opcode(0x0a).to_string(), "0x0a");
        assert_eq!(Opcode(0xfe).next(), Some(Opcode::LAST));
        assert_eq!(Opcode::LAST.next(), None);
    }
}
