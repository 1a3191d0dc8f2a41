use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tunable constants for the weighted ranking.
///
/// Score = base points × field size multiplier × event level multiplier × time decay multiplier.
/// Defaults are the production values; deployments can override them from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RankingParameters {
    /// Ascending by `min_riders`. The last breakpoint whose threshold the field reaches applies.
    pub field_size_breakpoints: Vec<FieldSizeBreakpoint>,
    /// Multiplier per event level, keyed by lowercase level name.
    pub event_levels: BTreeMap<String, Decimal>,
    /// Level assumed for events that do not record one.
    pub default_event_level: String,
    pub unknown_level_multiplier: Decimal,
    pub window_months: u32,
    pub recent_months: u32,
    pub recent_multiplier: Decimal,
    pub older_multiplier: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldSizeBreakpoint {
    pub min_riders: u32,
    pub multiplier: Decimal,
}

impl Default for RankingParameters {
    fn default() -> Self {
        let field_size_breakpoints = [
            (1, 75),
            (2, 77),
            (3, 79),
            (4, 81),
            (5, 83),
            (6, 85),
            (7, 87),
            (8, 89),
            (9, 91),
            (10, 93),
            (11, 95),
            (12, 97),
            (13, 98),
            (14, 99),
            (15, 100),
        ]
        .into_iter()
        .map(|(min_riders, hundredths)| FieldSizeBreakpoint {
            min_riders,
            multiplier: Decimal::new(hundredths, 2),
        })
        .collect();

        let event_levels = BTreeMap::from([
            ("national".to_string(), Decimal::new(100, 2)),
            ("sportmotion".to_string(), Decimal::new(50, 2)),
        ]);

        Self {
            field_size_breakpoints,
            event_levels,
            default_event_level: "national".to_string(),
            unknown_level_multiplier: Decimal::new(50, 2),
            window_months: 24,
            recent_months: 12,
            recent_multiplier: Decimal::new(100, 2),
            older_multiplier: Decimal::new(50, 2),
        }
    }
}

impl RankingParameters {
    pub fn validate(&self) -> Result<(), String> {
        let Some(first) = self.field_size_breakpoints.first() else {
            return Err("field_size_breakpoints must not be empty".to_string());
        };
        if first.min_riders < 1 {
            return Err("field size breakpoints must start at 1 rider or more".to_string());
        }
        for pair in self.field_size_breakpoints.windows(2) {
            if pair[1].min_riders <= pair[0].min_riders {
                return Err("field_size_breakpoints must be strictly ascending by min_riders".to_string());
            }
        }
        for breakpoint in &self.field_size_breakpoints {
            check_multiplier("field size multiplier", breakpoint.multiplier)?;
        }
        for (level, multiplier) in &self.event_levels {
            check_multiplier(&format!("event level '{}'", level), *multiplier)?;
        }
        check_multiplier("unknown_level_multiplier", self.unknown_level_multiplier)?;
        check_multiplier("recent_multiplier", self.recent_multiplier)?;
        check_multiplier("older_multiplier", self.older_multiplier)?;

        if self.window_months == 0 {
            return Err("window_months must be >= 1".to_string());
        }
        if self.recent_months >= self.window_months {
            return Err("recent_months must be shorter than window_months".to_string());
        }

        Ok(())
    }

    pub fn field_size_multiplier(&self, field_size: usize) -> Decimal {
        let mut multiplier = self
            .field_size_breakpoints
            .first()
            .map(|b| b.multiplier)
            .unwrap_or(Decimal::ONE);

        for breakpoint in &self.field_size_breakpoints {
            if field_size >= breakpoint.min_riders as usize {
                multiplier = breakpoint.multiplier;
            } else {
                break;
            }
        }

        multiplier
    }

    /// Returns the level that was applied alongside its multiplier.
    pub fn event_level_multiplier(&self, level: Option<&str>) -> (String, Decimal) {
        let level = level
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.default_event_level.to_lowercase());

        let multiplier = self
            .event_levels
            .get(&level)
            .copied()
            .unwrap_or(self.unknown_level_multiplier);

        (level, multiplier)
    }

    /// Oldest event date still inside the ranking window.
    pub fn window_start(&self, reference: NaiveDate) -> NaiveDate {
        months_before(reference, self.window_months)
    }

    /// `None` means the event falls outside the window and must not be counted.
    pub fn time_decay_multiplier(&self, event_date: NaiveDate, reference: NaiveDate) -> Option<Decimal> {
        if event_date >= months_before(reference, self.recent_months) {
            Some(self.recent_multiplier)
        } else if event_date >= self.window_start(reference) {
            Some(self.older_multiplier)
        } else {
            None
        }
    }
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

fn check_multiplier(name: &str, value: Decimal) -> Result<(), String> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(format!("{} must be in (0, 1], got {}", name, value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(RankingParameters::default().validate().is_ok());
    }

    #[test]
    fn test_field_size_multiplier_bounds() {
        let params = RankingParameters::default();
        assert_eq!(params.field_size_multiplier(0), Decimal::new(75, 2));
        assert_eq!(params.field_size_multiplier(1), Decimal::new(75, 2));
        assert_eq!(params.field_size_multiplier(6), Decimal::new(85, 2));
        assert_eq!(params.field_size_multiplier(15), Decimal::ONE);
        assert_eq!(params.field_size_multiplier(120), Decimal::ONE);
    }

    #[test]
    fn test_event_level_multiplier() {
        let params = RankingParameters::default();
        assert_eq!(params.event_level_multiplier(Some("National")).1, Decimal::ONE);
        assert_eq!(params.event_level_multiplier(Some("sportmotion")).1, Decimal::new(5, 1));
        assert_eq!(
            params.event_level_multiplier(None),
            ("national".to_string(), Decimal::ONE)
        );
        assert_eq!(params.event_level_multiplier(Some("club")).1, Decimal::new(5, 1));
    }

    #[test]
    fn test_time_decay_boundaries() {
        let params = RankingParameters::default();
        let reference = date(2025, 6, 15);

        assert_eq!(params.time_decay_multiplier(reference, reference), Some(Decimal::ONE));
        assert_eq!(params.time_decay_multiplier(date(2024, 6, 15), reference), Some(Decimal::ONE));
        assert_eq!(
            params.time_decay_multiplier(date(2024, 6, 14), reference),
            Some(Decimal::new(5, 1))
        );
        assert_eq!(
            params.time_decay_multiplier(date(2023, 6, 15), reference),
            Some(Decimal::new(5, 1))
        );
        assert_eq!(params.time_decay_multiplier(date(2023, 6, 14), reference), None);
    }

    #[test]
    fn test_validation_rejects_bad_tables() {
        let mut params = RankingParameters::default();
        params.field_size_breakpoints.clear();
        assert!(params.validate().is_err());

        let mut params = RankingParameters::default();
        params.field_size_breakpoints.swap(0, 1);
        assert!(params.validate().is_err());

        let mut params = RankingParameters::default();
        params.older_multiplier = Decimal::new(15, 1);
        assert!(params.validate().is_err());

        let mut params = RankingParameters::default();
        params.recent_months = 24;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_overrides_keep_defaults() {
        let params: RankingParameters =
            serde_json::from_str(r#"{ "window_months": 36, "recent_months": 18 }"#).unwrap();
        assert_eq!(params.window_months, 36);
        assert_eq!(params.recent_months, 18);
        assert_eq!(params.default_event_level, "national");
        assert!(params.validate().is_ok());
    }
}
