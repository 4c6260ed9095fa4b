//! ESPN scoreboard parsing.
//!
//! The same scoreboard shape is served for basketball and football, so a
//! single parser covers every league.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use common::{Error, Game};
use serde::Deserialize;

/// Turns a raw response body into games.
///
/// `source_url` identifies the request in error messages.
pub trait GameParser: Send + Sync {
    fn parse_games(&self, body: &[u8], source_url: &str) -> Result<Vec<Game>, Error>;
}

// ── Scoreboard response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreboardResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: String,
    pub date: String,
    pub status: EventStatus,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
pub struct EventStatus {
    #[serde(rename = "type")]
    pub kind: StatusType,
}

#[derive(Debug, Deserialize)]
pub struct StatusType {
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct Competition {
    #[serde(rename = "neutralSite", default)]
    pub neutral_site: bool,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Deserialize)]
pub struct Competitor {
    #[serde(rename = "homeAway")]
    pub home_away: String,
    #[serde(default)]
    pub score: Option<serde_json::Value>, // string on the scoreboard, sometimes a number
    pub team: Team,
}

#[derive(Debug, Deserialize)]
pub struct Team {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

// ── Parsing ───────────────────────────────────────────────────────────

/// Parser for `.../scoreboard` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EspnScoreboardParser;

impl GameParser for EspnScoreboardParser {
    fn parse_games(&self, body: &[u8], source_url: &str) -> Result<Vec<Game>, Error> {
        let response: ScoreboardResponse = serde_json::from_slice(body)
            .map_err(|e| Error::parse(source_url, format!("invalid scoreboard JSON: {}", e)))?;

        response
            .events
            .iter()
            .map(|event| parse_event(event, source_url))
            .collect()
    }
}

struct Side<'a> {
    name: &'a str,
    score: u32,
    is_home: bool,
}

fn parse_event(event: &Event, source_url: &str) -> Result<Game, Error> {
    let fail = |message: String| Error::parse(source_url, format!("event {}: {}", event.id, message));

    let [competition] = event.competitions.as_slice() else {
        return Err(fail(format!(
            "expected exactly 1 competition, found {}",
            event.competitions.len()
        )));
    };
    let sides = competition
        .competitors
        .iter()
        .map(|c| -> Result<Side<'_>, Error> {
            Ok(Side {
                name: &c.team.display_name,
                score: parse_score(c.score.as_ref()).map_err(&fail)?,
                is_home: c.home_away == "home",
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let [first, second] = sides.as_slice() else {
        return Err(fail(format!("expected exactly 2 competitors, found {}", sides.len())));
    };

    let (home, away) = if competition.neutral_site || (first.is_home && !second.is_home) {
        (first, second)
    } else if second.is_home && !first.is_home {
        (second, first)
    } else {
        return Err(fail(
            "not a neutral site, and not exactly 1 team is marked as home".into(),
        ));
    };

    let date = parse_espn_date(&event.date).map_err(&fail)?;

    Ok(Game {
        game_id: event.id.clone(),
        home: home.name.to_string(),
        home_score: home.score,
        away: away.name.to_string(),
        away_score: away.score,
        neutral_site: competition.neutral_site,
        completed: event.status.kind.completed,
        date,
    })
}

fn parse_score(raw: Option<&serde_json::Value>) -> Result<u32, String> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| format!("invalid score {}", n)),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(0),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid score {:?}", s)),
        Some(other) => Err(format!("invalid score {}", other)),
    }
}

/// ESPN usually omits seconds (`2020-01-05T00:00Z`), which RFC 3339 rejects.
pub fn parse_espn_date(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).fixed_offset())
        .map_err(|_| format!("invalid date {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> &'static str {
        r#"{
            "events": [
                {
                    "id": "401169778",
                    "date": "2020-01-05T00:00Z",
                    "status": {"type": {"completed": true}},
                    "competitions": [{
                        "neutralSite": false,
                        "competitors": [
                            {"homeAway": "away", "score": "68", "team": {"displayName": "Iowa Hawkeyes"}},
                            {"homeAway": "home", "score": "75", "team": {"displayName": "Nebraska Cornhuskers"}}
                        ]
                    }]
                },
                {
                    "id": "401169779",
                    "date": "2020-01-05T02:30Z",
                    "status": {"type": {"completed": false}},
                    "competitions": [{
                        "neutralSite": true,
                        "competitors": [
                            {"homeAway": "home", "score": 0, "team": {"displayName": "Gonzaga Bulldogs"}},
                            {"homeAway": "away", "team": {"displayName": "Baylor Bears"}}
                        ]
                    }]
                }
            ]
        }"#
    }

    fn wrap(competitors: &str, neutral: bool) -> String {
        format!(
            r#"{{"events": [{{"id": "1", "date": "2020-01-05T00:00Z",
                "status": {{"type": {{"completed": true}}}},
                "competitions": [{{"neutralSite": {}, "competitors": [{}]}}]}}]}}"#,
            neutral, competitors
        )
    }

    #[test]
    fn test_parse_sample() {
        let games = EspnScoreboardParser
            .parse_games(sample_response().as_bytes(), "test")
            .expect("sample should parse");

        assert_eq!(games.len(), 2);
        let first = &games[0];
        assert_eq!(first.game_id, "401169778");
        assert_eq!(first.home, "Nebraska Cornhuskers");
        assert_eq!(first.home_score, 75);
        assert_eq!(first.away, "Iowa Hawkeyes");
        assert_eq!(first.away_score, 68);
        assert!(first.completed);
        assert!(!first.neutral_site);
        assert_eq!(first.date.to_rfc3339(), "2020-01-05T00:00:00+00:00");

        let second = &games[1];
        assert!(second.neutral_site);
        assert!(!second.completed);
        assert_eq!(second.home, "Gonzaga Bulldogs");
        assert_eq!(second.away_score, 0);
    }

    #[test]
    fn test_neutral_site_keeps_positional_order() {
        let body = wrap(
            r#"{"homeAway": "away", "score": "1", "team": {"displayName": "A"}},
               {"homeAway": "away", "score": "2", "team": {"displayName": "B"}}"#,
            true,
        );
        let games = EspnScoreboardParser.parse_games(body.as_bytes(), "test").unwrap();
        assert_eq!(games[0].home, "A");
        assert_eq!(games[0].away, "B");
    }

    #[test]
    fn test_two_home_teams_is_a_parse_error() {
        let body = wrap(
            r#"{"homeAway": "home", "score": "1", "team": {"displayName": "A"}},
               {"homeAway": "home", "score": "2", "team": {"displayName": "B"}}"#,
            false,
        );
        let err = EspnScoreboardParser
            .parse_games(body.as_bytes(), "https://x.test?dates=1")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("dates=1"));
    }

    #[test]
    fn test_wrong_competitor_count_is_a_parse_error() {
        let body = wrap(r#"{"homeAway": "home", "score": "1", "team": {"displayName": "A"}}"#, false);
        assert!(matches!(
            EspnScoreboardParser.parse_games(body.as_bytes(), "test"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            EspnScoreboardParser.parse_games(b"<html>", "test"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_empty_scoreboard() {
        let games = EspnScoreboardParser.parse_games(br#"{"events": []}"#, "test").unwrap();
        assert!(games.is_empty());
    }

    #[test]
    fn test_parse_dates() {
        assert!(parse_espn_date("2019-09-06T00:20Z").is_ok());
        assert!(parse_espn_date("2019-09-06T00:20:00Z").is_ok());
        assert!(parse_espn_date("2019-09-06T00:20:00-05:00").is_ok());
        assert!(parse_espn_date("yesterday").is_err());
    }
}
