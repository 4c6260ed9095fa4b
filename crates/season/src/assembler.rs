//! Season assembly: plan units, fan them out, group into weeks, merge
//! with any season-so-far, and cache finished seasons.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Error, Game, Season, SyncConfig, Week};
use espn_client::{EspnScoreboardParser, FetchClient, GameParser};
use tracing::{info, warn};

use crate::cache::SeasonCache;
use crate::league::{League, LeagueParams};
use crate::merge::merge_seasons;
use crate::parallel::run_many;
use crate::unit::{UnitAcquirer, UnitOutcome};

/// Builds seasons for one league.
///
/// Cheap to clone; clones share the HTTP client and caches.
#[derive(Clone)]
pub struct SeasonAssembler {
    league: Arc<LeagueParams>,
    acquirer: UnitAcquirer,
    cache: SeasonCache,
    fixed_now: Option<DateTime<Utc>>,
}

impl SeasonAssembler {
    /// `season_cache_root` is the season cache root; entries land under
    /// `<season_cache_root>/<league>/`.
    pub fn new(
        league: LeagueParams,
        client: FetchClient,
        parser: Arc<dyn GameParser>,
        season_cache_root: &Path,
    ) -> Self {
        let league = Arc::new(league);
        Self {
            cache: SeasonCache::new(season_cache_root, league.key()),
            acquirer: UnitAcquirer::new(client, parser, league.clone()),
            league,
            fixed_now: None,
        }
    }

    /// Production assembler: reqwest transport, ESPN scoreboard parser,
    /// caches under `config.cache_dir`.
    pub fn from_config(league: League, config: &SyncConfig) -> Result<Self, Error> {
        Ok(Self::new(
            LeagueParams::new(league, &config.espn_base_url),
            FetchClient::from_config(config)?,
            Arc::new(EspnScoreboardParser),
            &config.season_cache_dir(),
        ))
    }

    /// Pin the clock used for "today" and the cache cutoff.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn league(&self) -> &LeagueParams {
        &self.league
    }

    pub fn cache(&self) -> &SeasonCache {
        &self.cache
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Assemble the season starting in `year`.
    ///
    /// A cached season is returned as is. Otherwise every planned unit is
    /// fetched concurrently, plus any trouble units left in
    /// `season_so_far`. Units that fail are recorded in `trouble_params`;
    /// units that were trouble before and now succeed are cleared. The
    /// result is cached only once the league's season end has passed.
    pub async fn assemble(&self, year: i32, season_so_far: Option<Season>) -> Result<Season, Error> {
        if year < self.league.first_year {
            return Err(Error::InvalidInput(format!(
                "{} has no data before {} (asked for {})",
                self.league.key(),
                self.league.first_year,
                year
            )));
        }
        if let Some(cached) = self.cache.load(year).await? {
            info!("Using cached {} season {}", self.league.key(), year);
            return Ok(cached);
        }

        let now = self.now();
        let mut units = self.league.plan(year, season_so_far.as_ref(), now.date_naive())?;
        if let Some(so_far) = &season_so_far {
            for unit in &so_far.trouble_params {
                if !units.contains(unit) {
                    units.push(*unit);
                }
            }
        }
        info!(
            "Assembling {} season {} from {} units",
            self.league.key(),
            year,
            units.len()
        );

        let acquirer = self.acquirer.clone();
        let outcomes = run_many(
            move |unit| {
                let acquirer = acquirer.clone();
                async move { acquirer.fetch_unit(unit).await }
            },
            units,
        )
        .collect_all()
        .await?;

        let mut weeks: BTreeMap<u32, Vec<Game>> = BTreeMap::new();
        let mut trouble = Vec::new();
        let mut fetched = HashSet::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Games { unit, games } => {
                    for game in games {
                        let number = self.league.week_number(year, &unit, &game)?;
                        weeks.entry(number).or_default().push(game);
                    }
                    fetched.insert(unit);
                }
                UnitOutcome::Trouble { unit, .. } => trouble.push(unit),
            }
        }
        let fresh = Season::new(
            year,
            weeks
                .into_iter()
                .map(|(number, games)| Week::new(number, games))
                .collect(),
            trouble,
        );

        // Also de-duplicates games that several groups reported.
        let inputs: Vec<Season> = season_so_far.into_iter().chain([fresh]).collect();
        let mut season = merge_seasons(&inputs)?;
        season.trouble_params.retain(|unit| !fetched.contains(unit));

        if !season.trouble_params.is_empty() {
            warn!(
                "{} season {} has {} trouble units",
                self.league.key(),
                year,
                season.trouble_params.len()
            );
        }

        let season_end = self.league.season_end.resolve(year)?;
        if now.date_naive() >= season_end {
            self.cache.save(&season).await?;
        }

        info!(
            "Assembled {} season {}: {} games in {} weeks",
            self.league.key(),
            year,
            season.game_count(),
            season.weeks.len()
        );
        Ok(season)
    }

    /// Assemble several seasons concurrently, returned in `years` order.
    pub async fn assemble_many(
        &self,
        years: impl IntoIterator<Item = i32>,
    ) -> Result<Vec<Season>, Error> {
        let assembler = self.clone();
        run_many(
            move |year| {
                let assembler = assembler.clone();
                async move { assembler.assemble(year, None).await }
            },
            years,
        )
        .collect_all()
        .await
    }
}
