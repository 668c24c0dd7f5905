//! Required Minimum Distribution tables (C8).
//!
//! The IRS requires minimum withdrawals from tax-deferred accounts starting
//! at the statutory RMD age (73 by default, configurable).

use serde::{Deserialize, Serialize};

/// IRS Uniform Lifetime Table for calculating Required Minimum Distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RmdTable {
    pub entries: Vec<RmdTableEntry>,
}

/// Single entry in the RMD table mapping age to IRS divisor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RmdTableEntry {
    pub age: u8,
    pub divisor: f64,
}

impl RmdTable {
    /// IRS Uniform Lifetime Table (2024).
    #[must_use]
    pub fn irs_uniform_lifetime_2024() -> Self {
        const DIVISORS: &[(u8, f64)] = &[
            (73, 26.5),
            (74, 25.5),
            (75, 24.6),
            (76, 23.7),
            (77, 22.9),
            (78, 22.0),
            (79, 21.1),
            (80, 20.2),
            (81, 19.4),
            (82, 18.5),
            (83, 17.7),
            (84, 16.8),
            (85, 16.0),
            (86, 15.2),
            (87, 14.4),
            (88, 13.7),
            (89, 12.9),
            (90, 12.2),
            (91, 11.5),
            (92, 10.8),
            (93, 10.1),
            (94, 9.5),
            (95, 8.9),
            (96, 8.4),
            (97, 7.8),
            (98, 7.3),
            (99, 6.8),
            (100, 6.4),
            (101, 6.0),
            (102, 5.6),
            (103, 5.2),
            (104, 4.9),
            (105, 4.6),
            (106, 4.3),
            (107, 4.1),
            (108, 3.9),
            (109, 3.7),
            (110, 3.5),
            (111, 3.4),
            (112, 3.3),
            (113, 3.1),
            (114, 3.0),
            (115, 2.9),
            (116, 2.8),
            (117, 2.7),
            (118, 2.5),
            (119, 2.3),
            (120, 2.0),
        ];
        RmdTable {
            entries: DIVISORS
                .iter()
                .map(|&(age, divisor)| RmdTableEntry { age, divisor })
                .collect(),
        }
    }

    /// Divisor for a given age, clamped to the table's last entry once the
    /// household ages past it (divisor keeps shrinking toward the minimum
    /// rather than disappearing).
    #[must_use]
    pub fn divisor_for_age(&self, age: u32) -> Option<f64> {
        if let Some(entry) = self.entries.iter().find(|e| u32::from(e.age) == age) {
            return Some(entry.divisor);
        }
        if age > u32::from(self.entries.last()?.age) {
            return self.entries.last().map(|e| e.divisor);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisor_monotonically_decreases() {
        let table = RmdTable::irs_uniform_lifetime_2024();
        let divisors: Vec<f64> = table.entries.iter().map(|e| e.divisor).collect();
        for w in divisors.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn ages_before_rmd_start_have_no_divisor() {
        let table = RmdTable::irs_uniform_lifetime_2024();
        assert_eq!(table.divisor_for_age(72), None);
    }

    #[test]
    fn ages_past_table_end_clamp_to_last_entry() {
        let table = RmdTable::irs_uniform_lifetime_2024();
        assert_eq!(table.divisor_for_age(150), Some(2.0));
    }
}
