use std::fmt;

use serde::Serialize;

/// Timing cost of one instruction, either fixed or split by branch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleCost {
    Fixed { cycles: u32 },
    Conditional { taken: u32, not_taken: u32 },
}

impl CycleCost {
    /// Parses `16` or `12/8`. Returns `None` for anything else.
    pub fn parse(token: &str) -> Option<Self> {
        match token.split_once('/') {
            Some((taken, not_taken)) => Some(CycleCost::Conditional {
                taken: parse_component(taken)?,
                not_taken: parse_component(not_taken)?,
            }),
            None => Some(CycleCost::Fixed {
                cycles: parse_component(token)?,
            }),
        }
    }

    /// Divides every component independently, truncating.
    pub fn scaled_down(self, divisor: u32) -> Self {
        match self {
            CycleCost::Fixed { cycles } => CycleCost::Fixed {
                cycles: cycles / divisor,
            },
            CycleCost::Conditional { taken, not_taken } => CycleCost::Conditional {
                taken: taken / divisor,
                not_taken: not_taken / divisor,
            },
        }
    }

    pub fn is_conditional(self) -> bool {
        matches!(self, CycleCost::Conditional { .. })
    }

    /// Cost when no branch is taken.
    pub fn base(self) -> u32 {
        match self {
            CycleCost::Fixed { cycles } => cycles,
            CycleCost::Conditional { not_taken, .. } => not_taken,
        }
    }
}

fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for CycleCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleCost::Fixed { cycles } => write!(f, "{cycles}"),
            CycleCost::Conditional { taken, not_taken } => write!(f, "{taken}/{not_taken}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_cost_floors() {
        let c = CycleCost::parse("20").unwrap().scaled_down(4);
        assert_eq!(c, CycleCost::Fixed { cycles: 5 });
        assert_eq!(CycleCost::parse("6").unwrap().scaled_down(4).to_string(), "1");
    }

    #[test]
    fn pair_floors_each_side() {
        let c = CycleCost::parse("24/12").unwrap().scaled_down(4);
        assert_eq!(c.to_string(), "6/3");
        assert_eq!(c.base(), 3);
        let odd = CycleCost::parse("13/7").unwrap().scaled_down(4);
        assert_eq!(odd, CycleCost::Conditional { taken: 3, not_taken: 1 });
    }

    #[test]
    fn malformed_tokens_rejected() {
        for t in ["", "x", "12/", "/8", "1/2/3", "-4", "4b"] {
            assert_eq!(CycleCost::parse(t), None, "token {t:?}");
        }
    }
}
