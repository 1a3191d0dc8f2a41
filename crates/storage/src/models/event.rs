use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Event {
    pub id: i64,
    /// Primary series, used only when the series has no explicit links.
    pub series_id: Option<i64>,
    pub date: NaiveDate,
    pub name: String,
    pub discipline: Option<String>,
    pub event_level: Option<String>,
}

impl Event {
    /// The event's own discipline. `GRAVITY` names a ranking, not an event, so it yields `None`.
    pub fn discipline(&self) -> Option<Discipline> {
        self.discipline.as_deref().and_then(Discipline::from_event_column)
    }
}

const ENDURO_COLUMN_VALUES: &[&str] = &["ENDURO", "EDR"];
const DOWNHILL_COLUMN_VALUES: &[&str] = &["DH", "DOWNHILL"];

/// Many-to-many link letting one event count toward several series.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SeriesEventLink {
    pub series_id: i64,
    pub event_id: i64,
    pub template_id: Option<i64>,
    pub sort_order: i32,
}

/// Ranking disciplines. `Gravity` is the combined Enduro + Downhill ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Discipline {
    Gravity,
    Enduro,
    #[serde(rename = "DH")]
    Downhill,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gravity => "GRAVITY",
            Self::Enduro => "ENDURO",
            Self::Downhill => "DH",
        }
    }

    pub fn all() -> &'static [Discipline] {
        &[Self::Gravity, Self::Enduro, Self::Downhill]
    }

    /// Event disciplines whose results feed this ranking.
    pub fn event_disciplines(&self) -> &'static [Discipline] {
        match self {
            Self::Gravity => &[Self::Enduro, Self::Downhill],
            Self::Enduro => &[Self::Enduro],
            Self::Downhill => &[Self::Downhill],
        }
    }

    pub fn includes(&self, event_discipline: Discipline) -> bool {
        self.event_disciplines().contains(&event_discipline)
    }

    /// Disciplines scored as the sum of two runs when both runs carry points.
    pub fn is_two_run(&self) -> bool {
        matches!(self, Self::Downhill)
    }

    /// Spellings in `events.discipline` of the events feeding this ranking.
    pub fn event_column_values(&self) -> Vec<&'static str> {
        match self {
            Self::Gravity => [ENDURO_COLUMN_VALUES, DOWNHILL_COLUMN_VALUES].concat(),
            Self::Enduro => ENDURO_COLUMN_VALUES.to_vec(),
            Self::Downhill => DOWNHILL_COLUMN_VALUES.to_vec(),
        }
    }

    fn from_event_column(value: &str) -> Option<Self> {
        let value = value.trim().to_uppercase();
        if ENDURO_COLUMN_VALUES.contains(&value.as_str()) {
            Some(Self::Enduro)
        } else if DOWNHILL_COLUMN_VALUES.contains(&value.as_str()) {
            Some(Self::Downhill)
        } else {
            None
        }
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::Gravity.as_str()) {
            return Ok(Self::Gravity);
        }
        Self::from_event_column(s).ok_or_else(|| {
            format!(
                "Unknown discipline: '{}'. Available: {}",
                s,
                Self::all()
                    .iter()
                    .map(|d| d.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

impl std::fmt::Display for Discipline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discipline_parsing() {
        assert_eq!("dh".parse::<Discipline>(), Ok(Discipline::Downhill));
        assert_eq!("Downhill".parse::<Discipline>(), Ok(Discipline::Downhill));
        assert_eq!("enduro".parse::<Discipline>(), Ok(Discipline::Enduro));
        assert_eq!("GRAVITY".parse::<Discipline>(), Ok(Discipline::Gravity));
        assert!("xc".parse::<Discipline>().is_err());
    }

    #[test]
    fn test_gravity_includes_enduro_and_downhill() {
        assert!(Discipline::Gravity.includes(Discipline::Enduro));
        assert!(Discipline::Gravity.includes(Discipline::Downhill));
        assert!(!Discipline::Enduro.includes(Discipline::Downhill));
        assert!(Discipline::Downhill.is_two_run());
    }

    #[test]
    fn test_gravity_is_not_an_event_discipline() {
        let event = Event {
            id: 1,
            series_id: None,
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            name: "Combined".to_string(),
            discipline: Some("gravity".to_string()),
            event_level: None,
        };
        assert_eq!(event.discipline(), None);

        let values = Discipline::Gravity.event_column_values();
        assert_eq!(values, vec!["ENDURO", "EDR", "DH", "DOWNHILL"]);
        assert!(!values.contains(&"GRAVITY"));
        assert_eq!(Discipline::Enduro.event_column_values(), vec!["ENDURO", "EDR"]);
    }
}
