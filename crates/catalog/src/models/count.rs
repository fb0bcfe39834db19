use std::fmt::{Display, Formatter, Result as FmtResult};

/// Aggregate number of assets across the visible packs.
///
/// When `at_least` is set, at least one contributing pack couldn't be
/// counted and the total is a lower bound (displayed with a `+` suffix).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetCount {
    pub total: u64,
    pub at_least: bool,
}
impl AssetCount {
    pub fn add(self, count: u64) -> Self {
        Self {
            total: self.total.saturating_add(count),
            ..self
        }
    }

    pub fn at_least(self) -> Self {
        Self { at_least: true, ..self }
    }
}
impl Display for AssetCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let digits = self.total.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        write!(f, "{}{}", grouped, if self.at_least { "+" } else { "" })
    }
}
