//! League definitions: which units make up a season, how each unit maps
//! to a scoreboard request, how games are bucketed into weeks, and the
//! per-league clean-up filters.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use common::{
    BasketballGroup, DayParams, Error, FootballGroup, Game, Gender, Season, SeasonType,
    TimeUnitParams, WeekParams,
};
use espn_client::QueryParams;

/// Pure, stateless post-parse transform. `None` drops the game.
pub type GameFilter = fn(Game) -> Option<Game>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum League {
    MensCollegeBasketball,
    WomensCollegeBasketball,
    CollegeFootball,
    Nfl,
}

impl League {
    pub const ALL: [League; 4] = [
        League::MensCollegeBasketball,
        League::WomensCollegeBasketball,
        League::CollegeFootball,
        League::Nfl,
    ];

    /// Identifier used on the command line and as the cache namespace.
    pub fn key(&self) -> &'static str {
        match self {
            League::MensCollegeBasketball => "ncaambb",
            League::WomensCollegeBasketball => "ncaawbb",
            League::CollegeFootball => "ncaafb",
            League::Nfl => "nfl",
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for League {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        League::ALL
            .into_iter()
            .find(|l| l.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = League::ALL.iter().map(|l| l.key()).collect();
                Error::InvalidInput(format!(
                    "unknown league {:?} (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// A month/day relative to a season's start year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDate {
    /// 0 for the start year, 1 for the following calendar year.
    pub year_offset: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub const fn new(year_offset: i32, month: u32, day: u32) -> Self {
        Self {
            year_offset,
            month,
            day,
        }
    }

    pub fn resolve(&self, season_year: i32) -> Result<NaiveDate, Error> {
        let year = season_year.checked_add(self.year_offset).ok_or_else(|| {
            Error::InvalidInput(format!("season year {} is out of range", season_year))
        })?;
        NaiveDate::from_ymd_opt(year, self.month, self.day).ok_or_else(|| {
            Error::InvalidInput(format!("invalid date {}-{}-{}", year, self.month, self.day))
        })
    }
}

/// How a league's season splits into fetch units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// One unit per day per group. Regular-season days run from
    /// `regular_start` up to (not including) `regular_end`; postseason days
    /// from `postseason_start` up to the league's season end.
    Daily {
        gender: Gender,
        regular_start: CalendarDate,
        regular_end: CalendarDate,
        regular_group: BasketballGroup,
        postseason_start: CalendarDate,
        postseason_groups: Vec<BasketballGroup>,
    },
    /// One unit per numbered week per group. Week `n` (postseason weeks
    /// counted after the regular season) is expected to start no earlier
    /// than `season_start + 7 * (n - 1)` days.
    Weekly {
        season_start: CalendarDate,
        regular_weeks: u32,
        postseason_weeks: u32,
        groups: Vec<Option<FootballGroup>>,
    },
}

/// Everything needed to plan, request, and group one league's seasons.
#[derive(Debug, Clone)]
pub struct LeagueParams {
    pub league: League,
    pub scoreboard_url: String,
    /// `limit` query parameter; large enough for a full slate.
    pub page_limit: u32,
    /// Past this date the season is final and may be cached.
    pub season_end: CalendarDate,
    pub first_year: i32,
    pub schedule: Schedule,
    pub filters: Vec<GameFilter>,
}

const POSTSEASON_BASKETBALL_GROUPS: [BasketballGroup; 4] = [
    BasketballGroup::Ncaa,
    BasketballGroup::Nit,
    BasketballGroup::Cbi,
    BasketballGroup::Cit,
];

impl LeagueParams {
    /// Standard definition of `league` against the given ESPN API base.
    pub fn new(league: League, espn_base_url: &str) -> Self {
        let base = espn_base_url.trim_end_matches('/');
        match league {
            League::MensCollegeBasketball | League::WomensCollegeBasketball => {
                let gender = if league == League::MensCollegeBasketball {
                    Gender::Mens
                } else {
                    Gender::Womens
                };
                Self {
                    league,
                    scoreboard_url: format!(
                        "{}/basketball/{}-college-basketball/scoreboard",
                        base,
                        gender.as_str()
                    ),
                    page_limit: 300,
                    season_end: CalendarDate::new(1, 4, 30),
                    first_year: 2001,
                    schedule: Schedule::Daily {
                        gender,
                        regular_start: CalendarDate::new(0, 11, 1),
                        regular_end: CalendarDate::new(1, 4, 1),
                        regular_group: BasketballGroup::D1,
                        postseason_start: CalendarDate::new(1, 3, 1),
                        postseason_groups: POSTSEASON_BASKETBALL_GROUPS.to_vec(),
                    },
                    filters: vec![drop_scoreless],
                }
            }
            League::CollegeFootball => Self {
                league,
                scoreboard_url: format!("{}/football/college-football/scoreboard", base),
                page_limit: 300,
                season_end: CalendarDate::new(1, 2, 1),
                first_year: 1999,
                schedule: Schedule::Weekly {
                    season_start: CalendarDate::new(0, 8, 20),
                    regular_weeks: 16,
                    postseason_weeks: 1,
                    groups: vec![
                        Some(FootballGroup::Fbs),
                        Some(FootballGroup::Fcs),
                        Some(FootballGroup::D23),
                    ],
                },
                filters: Vec::new(),
            },
            League::Nfl => Self {
                league,
                scoreboard_url: format!("{}/football/nfl/scoreboard", base),
                page_limit: 32,
                season_end: CalendarDate::new(1, 3, 1),
                first_year: 1999,
                schedule: Schedule::Weekly {
                    season_start: CalendarDate::new(0, 9, 1),
                    regular_weeks: 17,
                    postseason_weeks: 5,
                    groups: vec![None],
                },
                filters: vec![keep_real_nfl_teams, relocate_nfl_teams],
            },
        }
    }

    pub fn key(&self) -> &'static str {
        self.league.key()
    }

    /// Every unit to fetch for `year`, in a stable order.
    ///
    /// Day ranges stop before `today`, as do weeks not yet started by
    /// `today`. With a season-so-far, planning starts
    /// at its latest known game (day leagues) or week (week leagues); that
    /// boundary unit is fetched again because it may have been incomplete.
    pub fn plan(
        &self,
        year: i32,
        season_so_far: Option<&Season>,
        today: NaiveDate,
    ) -> Result<Vec<TimeUnitParams>, Error> {
        let mut units = Vec::new();
        match &self.schedule {
            Schedule::Daily {
                gender,
                regular_start,
                regular_end,
                regular_group,
                postseason_start,
                postseason_groups,
            } => {
                let resume = season_so_far.and_then(Season::latest_game_date);
                let bounded = |start: NaiveDate, end: NaiveDate| {
                    let start = resume.map_or(start, |r| start.max(r));
                    date_range(start, end.min(today))
                };

                for date in bounded(regular_start.resolve(year)?, regular_end.resolve(year)?) {
                    units.push(TimeUnitParams::DayUnit(DayParams {
                        date,
                        gender: *gender,
                        group: *regular_group,
                    }));
                }
                let post_days =
                    bounded(postseason_start.resolve(year)?, self.season_end.resolve(year)?);
                for group in postseason_groups {
                    for date in &post_days {
                        units.push(TimeUnitParams::DayUnit(DayParams {
                            date: *date,
                            gender: *gender,
                            group: *group,
                        }));
                    }
                }
            }
            Schedule::Weekly {
                season_start,
                regular_weeks,
                postseason_weeks,
                groups,
            } => {
                let resume_week = season_so_far.and_then(Season::latest_week_number);
                let season_start = season_start.resolve(year)?;
                let started = |effective_week: u32| {
                    let offset = Duration::weeks(i64::from(effective_week) - 1);
                    season_start
                        .checked_add_signed(offset)
                        .is_some_and(|week_start| week_start < today)
                };
                for group in groups {
                    let regular = (1..=*regular_weeks).map(|w| (w, SeasonType::Regular));
                    let post = (1..=*postseason_weeks).map(|w| (w, SeasonType::Post));
                    for (week, season_type) in regular.chain(post) {
                        let params = WeekParams {
                            year,
                            week,
                            season_type,
                            group: *group,
                        };
                        let effective = self.effective_week(&params);
                        if !started(effective) || resume_week.is_some_and(|r| effective < r) {
                            continue;
                        }
                        units.push(TimeUnitParams::WeekUnit(params));
                    }
                }
            }
        }
        Ok(units)
    }

    /// Scoreboard URL and query for one unit.
    pub fn request(&self, unit: &TimeUnitParams) -> (String, QueryParams) {
        let params = QueryParams::new()
            .with("lang", "en")
            .with("region", "us")
            .with("calendartype", "blacklist")
            .with("limit", self.page_limit);

        let params = match unit {
            TimeUnitParams::DayUnit(day) => params
                .with("dates", day.date.format("%Y%m%d"))
                .with("groups", day.group.code()),
            TimeUnitParams::WeekUnit(week) => {
                let params = params
                    .with("seasontype", week.season_type.code())
                    .with("dates", week.year)
                    .with("week", week.week);
                match week.group {
                    Some(group) => params.with("groups", group.code()),
                    None => params,
                }
            }
        };
        (self.scoreboard_url.clone(), params)
    }

    /// 1-based week a game fetched through `unit` belongs to.
    ///
    /// Day leagues bucket Monday–Sunday, counted from the bucket holding
    /// the regular-season start; week leagues number postseason weeks after
    /// the regular season.
    pub fn week_number(&self, year: i32, unit: &TimeUnitParams, game: &Game) -> Result<u32, Error> {
        match (&self.schedule, unit) {
            (Schedule::Daily { regular_start, .. }, _) => {
                let origin = week_bucket(regular_start.resolve(year)?);
                let bucket = week_bucket(game.date.date_naive());
                let weeks = (bucket - origin).num_days() / 7 + 1;
                Ok(u32::try_from(weeks.max(1)).unwrap_or(1))
            }
            (Schedule::Weekly { .. }, TimeUnitParams::WeekUnit(week)) => Ok(self.effective_week(week)),
            (Schedule::Weekly { .. }, TimeUnitParams::DayUnit(day)) => Err(Error::InvalidInput(
                format!("{} is week-based but got day unit {}", self.league, day),
            )),
        }
    }

    fn effective_week(&self, week: &WeekParams) -> u32 {
        match (&self.schedule, week.season_type) {
            (Schedule::Weekly { regular_weeks, .. }, SeasonType::Post) => week.week + regular_weeks,
            _ => week.week,
        }
    }

    /// Run every filter in order.
    pub fn apply_filters(&self, game: Game) -> Option<Game> {
        self.filters.iter().try_fold(game, |game, filter| filter(game))
    }
}

/// Last season start year worth fetching.
///
/// Seasons span two calendar years; before this year's season end the
/// newest season is the one that started last year.
pub fn end_year(season_end: CalendarDate, today: NaiveDate) -> i32 {
    if (today.month(), today.day()) < (season_end.month, season_end.day) {
        today.year() - 1
    } else {
        today.year()
    }
}

/// Monday following the Monday–Sunday week containing `date`.
fn week_bucket(date: NaiveDate) -> NaiveDate {
    let days_until = 7 - i64::from(date.weekday().num_days_from_monday());
    date + Duration::days(days_until)
}

/// `[start, end)` by day; empty when `end <= start`.
fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d < end).collect()
}

// ── Filters ───────────────────────────────────────────────────────────

/// 0–0 "completed" games are scheduling artifacts, not results.
pub fn drop_scoreless(game: Game) -> Option<Game> {
    (game.home_score > 0 || game.away_score > 0).then_some(game)
}

const REAL_NFL_TEAMS: &[&str] = &[
    "Arizona Cardinals",
    "Atlanta Falcons",
    "Baltimore Ravens",
    "Buffalo Bills",
    "Carolina Panthers",
    "Chicago Bears",
    "Cincinnati Bengals",
    "Cleveland Browns",
    "Dallas Cowboys",
    "Denver Broncos",
    "Detroit Lions",
    "Green Bay Packers",
    "Houston Texans",
    "Indianapolis Colts",
    "Jacksonville Jaguars",
    "Kansas City Chiefs",
    "Las Vegas Raiders",
    "Los Angeles Chargers",
    "Los Angeles Rams",
    "Miami Dolphins",
    "Minnesota Vikings",
    "New England Patriots",
    "New Orleans Saints",
    "New York Giants",
    "New York Jets",
    "Oakland Raiders",
    "Philadelphia Eagles",
    "Pittsburgh Steelers",
    "San Diego Chargers",
    "San Francisco 49ers",
    "Seattle Seahawks",
    "St. Louis Rams",
    "Tampa Bay Buccaneers",
    "Tennessee Titans",
    "Washington",
    "Washington Commanders",
    "Washington Football Team",
    "Washington Redskins",
    "Houston Oilers",
];

/// Drops Pro Bowl and other exhibition games.
pub fn keep_real_nfl_teams(game: Game) -> Option<Game> {
    REAL_NFL_TEAMS.contains(&game.home.as_str()).then_some(game)
}

const NFL_RENAMES: &[(&str, &str)] = &[
    ("San Diego Chargers", "Los Angeles Chargers"),
    ("St. Louis Rams", "Los Angeles Rams"),
    ("Oakland Raiders", "Las Vegas Raiders"),
    ("Washington Redskins", "Washington"),
    ("Washington Football Team", "Washington"),
    ("Washington Commanders", "Washington"),
    ("Houston Oilers", "Tennessee Titans"),
];

fn current_nfl_name(name: &str) -> String {
    NFL_RENAMES
        .iter()
        .find(|(old, _)| *old == name)
        .map_or(name, |(_, new)| *new)
        .to_string()
}

/// One name per franchise across relocations and renames.
pub fn relocate_nfl_teams(mut game: Game) -> Option<Game> {
    game.home = current_nfl_name(&game.home);
    game.away = current_nfl_name(&game.away);
    Some(game)
}
