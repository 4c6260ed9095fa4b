//! Write-once cache of completed seasons, keyed by league and year.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use common::{Error, Season};
use espn_client::write_new;
use tracing::{debug, info};

/// Completed seasons under `<root>/<league>/<year>.json`.
#[derive(Debug, Clone)]
pub struct SeasonCache {
    dir: PathBuf,
}

impl SeasonCache {
    /// `root` is the season cache root (e.g. `<cache_dir>/season`).
    pub fn new(root: &Path, league_key: &str) -> Self {
        Self {
            dir: root.join(league_key),
        }
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(format!("{}.json", year))
    }

    /// Stored bytes for `year`, `None` on a miss.
    pub async fn get_raw(&self, year: i32) -> Result<Option<Vec<u8>>, Error> {
        match tokio::fs::read(self.path_for(year)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Store bytes for `year`. An existing entry is a
    /// [`Error::CacheConflict`] and is left as it was; a failed write leaves
    /// no entry behind.
    pub async fn put_raw(&self, year: i32, data: &[u8]) -> Result<(), Error> {
        let path = self.path_for(year);
        if write_new(&path, data).await? {
            Ok(())
        } else {
            Err(Error::CacheConflict(path))
        }
    }

    pub async fn load(&self, year: i32) -> Result<Option<Season>, Error> {
        let Some(data) = self.get_raw(year).await? else {
            return Ok(None);
        };
        let season: Season = serde_json::from_slice(&data)?;
        debug!("Loaded cached season {} from {}", year, self.path_for(year).display());
        Ok(Some(season))
    }

    pub async fn save(&self, season: &Season) -> Result<(), Error> {
        let data = serde_json::to_vec(season)?;
        self.put_raw(season.year, &data).await?;
        info!(
            "Cached completed season {} ({} games) at {}",
            season.year,
            season.game_count(),
            self.path_for(season.year).display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use common::{Game, Week};

    fn sample_season(year: i32) -> Season {
        Season::new(
            year,
            vec![Week::new(
                1,
                vec![Game {
                    game_id: "401".into(),
                    home: "Kansas City Chiefs".into(),
                    home_score: 31,
                    away: "San Francisco 49ers".into(),
                    away_score: 20,
                    neutral_site: true,
                    completed: true,
                    date: DateTime::parse_from_rfc3339("2020-02-02T23:30:00Z").unwrap(),
                }],
            )],
            vec![],
        )
    }

    #[tokio::test]
    async fn test_put_then_get_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SeasonCache::new(dir.path(), "nfl");

        let bytes = b"\x00\x01opaque season blob\xff".to_vec();
        cache.put_raw(2019, &bytes).await.unwrap();
        assert_eq!(cache.get_raw(2019).await.unwrap(), Some(bytes));
        assert!(cache.path_for(2019).ends_with("nfl/2019.json"));
    }

    #[tokio::test]
    async fn test_overwrite_is_a_conflict_and_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SeasonCache::new(dir.path(), "nfl");

        cache.put_raw(2019, b"original").await.unwrap();
        let err = cache.put_raw(2019, b"replacement").await.unwrap_err();
        assert!(matches!(err, Error::CacheConflict(_)));
        assert_eq!(cache.get_raw(2019).await.unwrap().as_deref(), Some(&b"original"[..]));
    }

    #[tokio::test]
    async fn test_season_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SeasonCache::new(dir.path(), "ncaambb");

        assert!(cache.load(2019).await.unwrap().is_none());
        let season = sample_season(2019);
        cache.save(&season).await.unwrap();
        assert_eq!(cache.load(2019).await.unwrap(), Some(season.clone()));
        assert!(matches!(cache.save(&season).await, Err(Error::CacheConflict(_))));
    }

    #[tokio::test]
    async fn test_leagues_do_not_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        SeasonCache::new(dir.path(), "nfl")
            .save(&sample_season(2019))
            .await
            .unwrap();
        assert!(SeasonCache::new(dir.path(), "ncaafb")
            .load(2019)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_write_does_not_block_the_key() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the league directory should be makes the write fail.
        std::fs::write(dir.path().join("nfl"), b"").unwrap();
        let cache = SeasonCache::new(dir.path(), "nfl");
        assert!(cache.save(&sample_season(2019)).await.is_err());

        std::fs::remove_file(dir.path().join("nfl")).unwrap();
        assert!(cache.load(2019).await.unwrap().is_none());
        cache.save(&sample_season(2019)).await.unwrap();
        assert_eq!(cache.load(2019).await.unwrap(), Some(sample_season(2019)));
    }
}
