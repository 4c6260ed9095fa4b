//! Domain types: games, weeks, seasons, and the fetch units that produce them.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

// ── Schedule records ──────────────────────────────────────────────────

/// A single game as reported by the remote source.
///
/// A later fetch of the same `game_id` wholly replaces an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub home: String,
    pub home_score: u32,
    pub away: String,
    pub away_score: u32,
    /// When true, home/away is positional only.
    pub neutral_site: bool,
    pub completed: bool,
    pub date: DateTime<FixedOffset>,
}

/// Games sharing a week (or round) number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    /// 1-based. Postseason weeks follow the regular season's numbering.
    pub number: u32,
    pub games: Vec<Game>,
}

impl Week {
    pub fn new(number: u32, games: Vec<Game>) -> Self {
        Self { number, games }
    }
}

/// A league season, named by its start year (the 2019 season ends in 2020).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub year: i32,
    pub weeks: Vec<Week>,
    /// Units whose fetch failed, kept so they can be retried later.
    #[serde(default)]
    pub trouble_params: Vec<TimeUnitParams>,
}

impl Season {
    pub fn new(year: i32, weeks: Vec<Week>, trouble_params: Vec<TimeUnitParams>) -> Self {
        Self {
            year,
            weeks,
            trouble_params,
        }
    }

    pub fn games(&self) -> impl Iterator<Item = &Game> {
        self.weeks.iter().flat_map(|w| w.games.iter())
    }

    pub fn game_count(&self) -> usize {
        self.weeks.iter().map(|w| w.games.len()).sum()
    }

    /// Calendar date of the most recent known game, in the game's own offset.
    pub fn latest_game_date(&self) -> Option<NaiveDate> {
        self.games().map(|g| g.date).max().map(|d| d.date_naive())
    }

    /// Highest week number that actually holds games.
    pub fn latest_week_number(&self) -> Option<u32> {
        self.weeks
            .iter()
            .filter(|w| !w.games.is_empty())
            .map(|w| w.number)
            .max()
    }
}

// ── Query coordinates ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Mens,
    Womens,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Mens => "mens",
            Gender::Womens => "womens",
        }
    }
}

/// ESPN basketball group. Postseason tournaments are their own groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasketballGroup {
    D1,
    Ncaa,
    Nit,
    Cbi,
    Cit,
}

impl BasketballGroup {
    pub fn code(&self) -> u32 {
        match self {
            BasketballGroup::D1 => 50,
            BasketballGroup::Ncaa => 100,
            BasketballGroup::Nit => 98,
            BasketballGroup::Cbi => 55,
            BasketballGroup::Cit => 56,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BasketballGroup::D1 => "d1",
            BasketballGroup::Ncaa => "ncaa",
            BasketballGroup::Nit => "nit",
            BasketballGroup::Cbi => "cbi",
            BasketballGroup::Cit => "cit",
        }
    }
}

/// ESPN college football division group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootballGroup {
    Fbs,
    Fcs,
    /// Divisions II and III together.
    D23,
}

impl FootballGroup {
    pub fn code(&self) -> u32 {
        match self {
            FootballGroup::Fbs => 80,
            FootballGroup::Fcs => 81,
            FootballGroup::D23 => 35,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FootballGroup::Fbs => "fbs",
            FootballGroup::Fcs => "fcs",
            FootballGroup::D23 => "d23",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonType {
    Regular,
    Post,
}

impl SeasonType {
    pub fn code(&self) -> u32 {
        match self {
            SeasonType::Regular => 2,
            SeasonType::Post => 3,
        }
    }
}

/// One day of basketball games for a gender and group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DayParams {
    pub date: NaiveDate,
    pub gender: Gender,
    pub group: BasketballGroup,
}

/// One week of football games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekParams {
    pub year: i32,
    pub week: u32,
    pub season_type: SeasonType,
    /// Only college football splits by group.
    pub group: Option<FootballGroup>,
}

/// Exact coordinates needed to re-issue one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeUnitParams {
    DayUnit(DayParams),
    WeekUnit(WeekParams),
}

impl fmt::Display for DayParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.date,
            self.gender.as_str(),
            self.group.name()
        )
    }
}

impl fmt::Display for WeekParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let season_type = match self.season_type {
            SeasonType::Regular => "regular",
            SeasonType::Post => "post",
        };
        write!(f, "{} {} week {}", self.year, season_type, self.week)?;
        if let Some(group) = self.group {
            write!(f, " {}", group.name())?;
        }
        Ok(())
    }
}

impl fmt::Display for TimeUnitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnitParams::DayUnit(day) => day.fmt(f),
            TimeUnitParams::WeekUnit(week) => week.fmt(f),
        }
    }
}
