use std::collections::BTreeMap;
use serde::Serialize;

use crate::model::Entry;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FamilyStat {
    pub family: String,
    pub count: usize,
    pub conditional: usize,
    /// Sum of not-taken machine cycles.
    pub cycles: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub opcodes: usize,
    pub reserved: usize,
    pub families: Vec<FamilyStat>,
}

pub fn family_stats(entries: &[Entry]) -> Report {
    let mut by_family: BTreeMap<&'static str, FamilyStat> = BTreeMap::new();
    let mut reserved = 0usize;
    for e in entries {
        let Some(family) = e.family else { reserved += 1; continue; };
        let stat = by_family.entry(family.name()).or_insert_with(|| FamilyStat {
            family: family.name().to_string(),
            count: 0,
            conditional: 0,
            cycles: 0,
        });
        stat.count += 1;
        if let Some(c) = e.cycles {
            if c.is_conditional() { stat.conditional += 1; }
            stat.cycles += c.base();
        }
    }
    Report { opcodes: entries.len(), reserved, families: by_family.into_values().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entries_from_str;
    use pretty_assertions::assert_eq;
    use sm83_opgen::CompilerConfig;

    #[test]
    fn stats_over_full_table() {
        let entries = entries_from_str(include_str!("../../../data/ops.txt"), &CompilerConfig::default()).unwrap();
        let report = family_stats(&entries);
        assert_eq!(report.opcodes, 256);
        assert_eq!(report.reserved, 11);
        let get = |name: &str| report.families.iter().find(|f| f.family == name).unwrap().clone();
        assert_eq!(get("restart").count, 8);
        assert_eq!(get("push").count, 4);
        assert_eq!(get("relative_jump").conditional, 4);
        assert_eq!(get("return").count, 6);
        assert_eq!(get("prefix").count, 1);
        let total: usize = report.families.iter().map(|f| f.count).sum();
        assert_eq!(total, 245);
    }
}
