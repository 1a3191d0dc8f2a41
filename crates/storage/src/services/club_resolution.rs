use serde::Serialize;

/// Which lookup produced a club attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubSource {
    /// Club recorded on the result row
    Explicit,
    /// Rider's membership for the season the event was held in
    Season,
    /// Rider's current club
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClubAttribution {
    pub source: ClubSource,
    pub club_id: i64,
}

/// Picks the club a result counts for: explicit, then season membership, then current club.
pub fn resolve_club(
    explicit: Option<i64>,
    season: Option<i64>,
    current: Option<i64>,
) -> Option<ClubAttribution> {
    explicit
        .map(|club_id| ClubAttribution {
            source: ClubSource::Explicit,
            club_id,
        })
        .or_else(|| {
            season.map(|club_id| ClubAttribution {
                source: ClubSource::Season,
                club_id,
            })
        })
        .or_else(|| {
            current.map(|club_id| ClubAttribution {
                source: ClubSource::Current,
                club_id,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_club_wins() {
        let attribution = resolve_club(Some(1), Some(2), Some(3)).unwrap();
        assert_eq!(attribution.source, ClubSource::Explicit);
        assert_eq!(attribution.club_id, 1);
    }

    #[test]
    fn test_season_before_current() {
        let attribution = resolve_club(None, Some(2), Some(3)).unwrap();
        assert_eq!(attribution.source, ClubSource::Season);
        assert_eq!(attribution.club_id, 2);
    }

    #[test]
    fn test_current_club_last() {
        let attribution = resolve_club(None, None, Some(3)).unwrap();
        assert_eq!(attribution.source, ClubSource::Current);
        assert_eq!(attribution.club_id, 3);
    }

    #[test]
    fn test_no_club_anywhere() {
        assert_eq!(resolve_club(None, None, None), None);
    }
}
