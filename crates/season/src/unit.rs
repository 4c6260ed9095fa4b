//! Fetching one time unit (a day or week of one group).

use std::sync::Arc;

use common::{Error, Game, TimeUnitParams};
use espn_client::{FetchClient, GameParser};
use tracing::{debug, info, warn};

use crate::league::LeagueParams;

/// Result of one unit. A failed fetch is data, not an error, so the rest
/// of the season can still be assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Games {
        unit: TimeUnitParams,
        games: Vec<Game>,
    },
    Trouble {
        unit: TimeUnitParams,
        reason: String,
    },
}

/// Fetches, parses, caches, and filters single units for one league.
///
/// Cheap to clone; each spawned task gets its own handle.
#[derive(Clone)]
pub struct UnitAcquirer {
    client: FetchClient,
    parser: Arc<dyn GameParser>,
    league: Arc<LeagueParams>,
}

impl UnitAcquirer {
    pub fn new(client: FetchClient, parser: Arc<dyn GameParser>, league: Arc<LeagueParams>) -> Self {
        Self {
            client,
            parser,
            league,
        }
    }

    /// Fetch one unit.
    ///
    /// Fetch failures become [`UnitOutcome::Trouble`]. Parse and local
    /// errors propagate. The raw response is cached only when every game in
    /// it is complete, and never for an empty week, which usually means the
    /// week is not published yet. Only completed games that pass the league
    /// filters are returned.
    pub async fn fetch_unit(&self, unit: TimeUnitParams) -> Result<UnitOutcome, Error> {
        let (url, params) = self.league.request(&unit);
        info!("Fetching {} {}", self.league.key(), unit);

        let content = match self.client.get(&url, Some(&params)).await {
            Ok(content) => content,
            Err(e) if e.is_fetch_failure() => {
                warn!("Giving up on {} ({}): {}", unit, self.league.key(), e);
                return Ok(UnitOutcome::Trouble {
                    unit,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let games = self
            .parser
            .parse_games(content.data(), &params.full_url(&url))?;

        let unpublished_week = games.is_empty() && matches!(unit, TimeUnitParams::WeekUnit(_));
        let final_results = !unpublished_week && games.iter().all(|g| g.completed);
        if final_results && content.save_if_necessary().await? {
            debug!("Saved {} ({} games) to {}", unit, games.len(), content.save_path().display());
        }

        let games: Vec<Game> = games
            .into_iter()
            .filter(|g| g.completed)
            .filter_map(|g| self.league.apply_filters(g))
            .collect();
        Ok(UnitOutcome::Games { unit, games })
    }
}
