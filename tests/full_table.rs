use pretty_assertions::assert_eq;

use sm83_opgen::opcode::RESERVED_OPCODES;
use sm83_opgen::{compile_to_string, CompilerConfig};

const TABLE: &str = include_str!("../data/ops.txt");

fn compiled() -> String {
    let (out, summary) = compile_to_string(TABLE, &CompilerConfig::default()).unwrap();
    assert!(summary.complete);
    out
}

#[test]
fn one_arm_per_opcode_in_order() {
    let out = compiled();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 256);
    for (i, line) in lines.iter().enumerate() {
        let prefix = format!("0x{i:02x} => {{ ");
        assert!(line.starts_with(&prefix), "line {i}: {line}");
        assert!(line.ends_with(" },"), "line {i}: {line}");
    }
}

#[test]
fn reserved_opcodes_get_fallback_arm() {
    let out = compiled();
    let lines: Vec<&str> = out.lines().collect();
    for op in RESERVED_OPCODES {
        assert_eq!(
            lines[op as usize],
            format!("0x{op:02x} => {{ self.undefined_op(opcode); 1 }},")
        );
    }
    let undefined = lines.iter().filter(|l| l.contains("undefined_op")).count();
    assert_eq!(undefined, 11);
}

#[test]
fn summary_counts() {
    let (_, summary) = compile_to_string(TABLE, &CompilerConfig::default()).unwrap();
    assert_eq!(summary.arms, 256);
    assert_eq!(summary.undefined, 11);
    assert_eq!(summary.code, 245);
    assert_eq!(summary.diagnostics, 0);
}

#[test]
fn spot_checks() {
    let out = compiled();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0x00], "0x00 => { self.nop(); 1 },");
    assert_eq!(lines[0x10], "0x10 => { self.stop(); 1 },");
    assert_eq!(
        lines[0x2a],
        "0x2a => { self.ld_byte(self.mmu.read_byte(self.regs.hl()), Some(RegIndex::A), 0); self.regs.set_hl(self.regs.hl().wrapping_add(1)); 2 },"
    );
    assert_eq!(
        lines[0x32],
        "0x32 => { self.ld_byte(self.regs.a(), None, self.regs.hl()); self.regs.set_hl(self.regs.hl().wrapping_sub(1)); 2 },"
    );
    assert_eq!(lines[0x76], "0x76 => { self.halt(); 1 },");
    assert_eq!(lines[0xc9], "0xc9 => { self.ret(None); 4 },");
    assert_eq!(lines[0xcb], "0xcb => { self.decode_cb(); 1 },");
    assert_eq!(lines[0xcd], "0xcd => { self.call(None); 6 },");
    assert_eq!(lines[0xff], "0xff => { self.rst(0x0038); 4 },");
}

#[test]
fn conditioned_control_flow_has_taken_term() {
    let out = compiled();
    let lines: Vec<&str> = out.lines().collect();
    for op in [0x20, 0x28, 0x30, 0x38, 0xc0, 0xc2, 0xc4, 0xc8, 0xca, 0xcc, 0xd0, 0xd2, 0xd4, 0xd8, 0xda, 0xdc] {
        assert!(lines[op].contains("Some(Condition::"), "{}", lines[op]);
        assert!(lines[op].contains(" as u8 + "), "{}", lines[op]);
    }
    for op in [0x18, 0xc3, 0xc9, 0xcd, 0xd9, 0xe9] {
        assert!(!lines[op].contains(" as u8 + "), "{}", lines[op]);
    }
}

#[test]
fn restart_targets() {
    let out = compiled();
    let lines: Vec<&str> = out.lines().collect();
    for k in 0..8usize {
        let op = 0xc7 + 8 * k;
        assert!(
            lines[op].contains(&format!("self.rst({:#06x});", 8 * k)),
            "{}",
            lines[op]
        );
    }
}

#[test]
fn placeholder_records_match_sparse_table() {
    let mut records = TABLE.split("\n\n").map(str::trim_end).filter(|r| !r.is_empty());
    let mut padded = String::new();
    for op in 0..=255u8 {
        if RESERVED_OPCODES.contains(&op) {
            padded.push_str("XX\n1  4\n- - - -\n\n");
        } else {
            padded.push_str(records.next().unwrap());
            padded.push_str("\n\n");
        }
    }
    assert!(records.next().is_none());

    let (out, summary) = compile_to_string(&padded, &CompilerConfig::default()).unwrap();
    assert!(summary.complete);
    assert_eq!(summary.undefined, RESERVED_OPCODES.len());
    assert_eq!(out, compiled());
}

#[test]
fn crlf_table_matches() {
    let (out, _) = compile_to_string(&TABLE.replace('\n', "\r\n"), &CompilerConfig::default()).unwrap();
    assert_eq!(out, compiled());
}
