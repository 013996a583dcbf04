use sm83_opgen::{compile_to_string, CompileError, CompilerConfig, CostStyle, Strictness};

/// Table with `records` at the front and NOPs for every other unreserved slot.
fn table_with(records: &[(&str, &str)]) -> String {
    let reserved = CompilerConfig::default().reserved_set();
    let mut out = String::new();
    let mut given = records.iter();
    for op in 0u8..=255 {
        if reserved.contains(sm83_opgen::Opcode(op)) {
            continue;
        }
        let (ins, cycles) = given.next().copied().unwrap_or(("NOP", "4"));
        out.push_str(&format!("{ins}\n1  {cycles}\n- - - -\n\n"));
    }
    out
}

fn line(out: &str, op: usize) -> &str {
    out.lines().nth(op).unwrap()
}

#[test]
fn load_through_hl_into_accumulator() {
    let (out, _) = compile_to_string(&table_with(&[("LD A,(HL)", "8")]), &CompilerConfig::default()).unwrap();
    assert_eq!(
        line(&out, 0),
        "0x00 => { self.ld_byte(self.mmu.read_byte(self.regs.hl()), Some(RegIndex::A), 0); 2 },"
    );
}

#[test]
fn conditional_jump_keeps_cost_pair() {
    let (out, _) = compile_to_string(&table_with(&[("JP Z,a16", "16/12")]), &CompilerConfig::default()).unwrap();
    assert_eq!(
        line(&out, 0),
        "0x00 => { self.jump(self.fetch_ins_word(), Some(Condition::Z)) as u8 + 4/3 },"
    );
}

#[test]
fn reserved_d3_is_undefined() {
    let (out, _) = compile_to_string(&table_with(&[]), &CompilerConfig::default()).unwrap();
    assert_eq!(line(&out, 0xd3), "0xd3 => { self.undefined_op(opcode); 1 },");
    assert_eq!(line(&out, 0xd4), "0xd4 => { self.nop(); 1 },");
}

#[test]
fn bad_cycle_token_fails_fast() {
    let err = compile_to_string(&table_with(&[("NOP", "4x")]), &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::InvalidCycles { .. }));
}

#[test]
fn lenient_mode_renders_diagnostics() {
    let cfg = CompilerConfig {
        strictness: Strictness::Lenient,
        ..CompilerConfig::default()
    };
    let table = table_with(&[("LD B,(q)", "8"), ("NOP", "??")]);
    let (out, summary) = compile_to_string(&table, &cfg).unwrap();
    assert_eq!(summary.diagnostics, 2);
    assert_eq!(summary.arms, 256);
    assert!(line(&out, 0).contains("compile_error!("));
    assert!(line(&out, 0).ends_with(" 2 },"));
    assert!(line(&out, 1).ends_with(" 0 },"));
}

#[test]
fn lenient_branch_diagnostic_follows_cost_style() {
    let cfg = CompilerConfig {
        strictness: Strictness::Lenient,
        cost_style: CostStyle::NotTaken,
        ..CompilerConfig::default()
    };
    let table = table_with(&[("JP Z,(q)", "16/12"), ("ADD A,(q)", "16/12")]);
    let (out, summary) = compile_to_string(&table, &cfg).unwrap();
    assert_eq!(summary.diagnostics, 2);
    assert!(line(&out, 0).contains("compile_error!("));
    assert!(line(&out, 0).ends_with(" 3 },"), "{}", line(&out, 0));
    // Only branches drop the taken cost.
    assert!(line(&out, 1).ends_with(" 4/3 },"), "{}", line(&out, 1));
}

#[test]
fn short_table_fails_fast_and_lenient_stops() {
    let table = "NOP\n1  4\n- - - -\n\nNOP\n1  4\n- - - -\n";
    let err = compile_to_string(table, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::UnexpectedEnd { .. }));

    let cfg = CompilerConfig {
        strictness: Strictness::Lenient,
        ..CompilerConfig::default()
    };
    let (out, summary) = compile_to_string(table, &cfg).unwrap();
    assert_eq!(out.lines().count(), 2);
    assert!(!summary.complete);
}

#[test]
fn trailing_records_rejected() {
    let mut table = table_with(&[]);
    table.push_str("NOP\n1  4\n- - - -\n");
    let err = compile_to_string(&table, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::TrailingRecords { .. }));
}

#[test]
fn custom_divisor_and_high_base() {
    let cfg = CompilerConfig {
        ticks_per_cycle: 1,
        high_memory_base: 0xfe00,
        ..CompilerConfig::default()
    };
    let (out, _) = compile_to_string(&table_with(&[("LDH A,(a8)", "12")]), &cfg).unwrap();
    assert_eq!(
        line(&out, 0),
        "0x00 => { self.ld_byte(self.mmu.read_byte(self.fetch_ins_byte() as u16 + 0xfe00), Some(RegIndex::A), 0); 12 },"
    );
}
