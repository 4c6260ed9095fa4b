//! Output sinks for assembled seasons.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::SecondsFormat;
use common::{Error, Season};

/// Somewhere assembled seasons end up.
pub trait SeasonSink {
    fn write_seasons(&self, seasons: &[Season]) -> Result<(), Error>;
}

fn create_file(path: &Path) -> Result<BufWriter<File>, Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

// ── CSV ───────────────────────────────────────────────────────────────

const CSV_HEADER: &str =
    "season,week,game_id,home,home_score,away,away_score,neutral_site,completed,date";

/// One row per game.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

impl SeasonSink for CsvSink {
    fn write_seasons(&self, seasons: &[Season]) -> Result<(), Error> {
        let mut out = create_file(&self.path)?;
        writeln!(out, "{}", CSV_HEADER)?;
        for season in seasons {
            for week in &season.weeks {
                for game in &week.games {
                    writeln!(
                        out,
                        "{},{},{},{},{},{},{},{},{},{}",
                        season.year,
                        week.number,
                        csv_field(&game.game_id),
                        csv_field(&game.home),
                        game.home_score,
                        csv_field(&game.away),
                        game.away_score,
                        game.neutral_site,
                        game.completed,
                        game.date.to_rfc3339_opts(SecondsFormat::Secs, true),
                    )?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}

// ── JSON snapshot ─────────────────────────────────────────────────────

/// Pretty-printed array of seasons, readable back with [`read_snapshot`].
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SeasonSink for JsonSink {
    fn write_seasons(&self, seasons: &[Season]) -> Result<(), Error> {
        let mut out = create_file(&self.path)?;
        serde_json::to_writer_pretty(&mut out, seasons)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

/// The `year` season from a snapshot written by [`JsonSink`].
pub fn read_snapshot(path: &Path, year: i32) -> Result<Season, Error> {
    let data = std::fs::read(path)?;
    let seasons: Vec<Season> = serde_json::from_slice(&data)?;
    seasons
        .into_iter()
        .find(|s| s.year == year)
        .ok_or_else(|| {
            Error::InvalidInput(format!("{} has no season {}", path.display(), year))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use common::{BasketballGroup, DayParams, Game, Gender, TimeUnitParams, Week};

    fn season() -> Season {
        Season::new(
            2019,
            vec![Week::new(
                2,
                vec![Game {
                    game_id: "401".into(),
                    home: "Texas A&M-Corpus Christi Islanders".into(),
                    home_score: 70,
                    away: "Team \"Quoted\", Inc".into(),
                    away_score: 65,
                    neutral_site: true,
                    completed: true,
                    date: DateTime::parse_from_rfc3339("2019-11-05T20:00:00Z").unwrap(),
                }],
            )],
            vec![TimeUnitParams::DayUnit(DayParams {
                date: NaiveDate::from_ymd_opt(2019, 11, 6).unwrap(),
                gender: Gender::Mens,
                group: BasketballGroup::D1,
            })],
        )
    }

    #[test]
    fn test_csv_rows_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/ncaambb.csv");
        CsvSink::new(&path).write_seasons(&[season()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "2019,2,401,Texas A&M-Corpus Christi Islanders,70,\"Team \"\"Quoted\"\", Inc\",65,true,true,2019-11-05T20:00:00Z"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_json_snapshot_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ncaambb-2019.json");
        JsonSink::new(&path).write_seasons(&[season()]).unwrap();

        assert_eq!(read_snapshot(&path, 2019).unwrap(), season());
        assert!(matches!(
            read_snapshot(&path, 2018),
            Err(Error::InvalidInput(_))
        ));
    }
}
