//! Reconciling a previously cached partial season with fresh data.

use std::collections::{BTreeMap, HashMap, HashSet};

use common::{Error, Game, Season, Week};

/// Merge seasons of the same year. Later seasons in the slice win.
///
/// - Games are unioned per week by `game_id`; a later version replaces an
///   earlier one in place, and moves weeks if the later input files it
///   under a different week.
/// - Weeks come out in ascending number.
/// - Trouble params are unioned, first occurrence kept.
pub fn merge_seasons(seasons: &[Season]) -> Result<Season, Error> {
    let first = seasons
        .first()
        .ok_or_else(|| Error::InvalidInput("cannot merge an empty list of seasons".into()))?;
    if let Some(other) = seasons.iter().find(|s| s.year != first.year) {
        return Err(Error::InvalidInput(format!(
            "cannot merge seasons from different years ({} and {})",
            first.year, other.year
        )));
    }

    let mut weeks: BTreeMap<u32, Vec<Game>> = BTreeMap::new();
    // game_id -> (week number, index in that week's games)
    let mut located: HashMap<String, (u32, usize)> = HashMap::new();

    for season in seasons {
        for week in &season.weeks {
            weeks.entry(week.number).or_default();
            for game in &week.games {
                match located.get(&game.game_id).copied() {
                    Some((number, index)) if number == week.number => {
                        if let Some(games) = weeks.get_mut(&number) {
                            games[index] = game.clone();
                        }
                    }
                    Some((number, index)) => {
                        remove_game(&mut weeks, &mut located, number, index);
                        insert_game(&mut weeks, &mut located, week.number, game);
                    }
                    None => insert_game(&mut weeks, &mut located, week.number, game),
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let trouble_params = seasons
        .iter()
        .flat_map(|s| s.trouble_params.iter())
        .filter(|p| seen.insert(**p))
        .copied()
        .collect();

    Ok(Season::new(
        first.year,
        weeks
            .into_iter()
            .map(|(number, games)| Week::new(number, games))
            .collect(),
        trouble_params,
    ))
}

fn insert_game(
    weeks: &mut BTreeMap<u32, Vec<Game>>,
    located: &mut HashMap<String, (u32, usize)>,
    number: u32,
    game: &Game,
) {
    let games = weeks.entry(number).or_default();
    located.insert(game.game_id.clone(), (number, games.len()));
    games.push(game.clone());
}

fn remove_game(
    weeks: &mut BTreeMap<u32, Vec<Game>>,
    located: &mut HashMap<String, (u32, usize)>,
    number: u32,
    index: usize,
) {
    let Some(games) = weeks.get_mut(&number) else {
        return;
    };
    let removed = games.remove(index);
    located.remove(&removed.game_id);
    // Later games in this week shift down by one.
    for game in &games[index..] {
        if let Some(slot) = located.get_mut(&game.game_id) {
            slot.1 -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use common::{BasketballGroup, DayParams, Gender, TimeUnitParams};

    fn game(id: &str, home_score: u32) -> Game {
        Game {
            game_id: id.into(),
            home: format!("Home {}", id),
            home_score,
            away: format!("Away {}", id),
            away_score: 60,
            neutral_site: false,
            completed: true,
            date: DateTime::parse_from_rfc3339("2020-01-05T00:00:00Z").unwrap(),
        }
    }

    fn trouble(day: u32) -> TimeUnitParams {
        TimeUnitParams::DayUnit(DayParams {
            date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
            gender: Gender::Mens,
            group: BasketballGroup::D1,
        })
    }

    fn ids(week: &Week) -> Vec<&str> {
        week.games.iter().map(|g| g.game_id.as_str()).collect()
    }

    #[test]
    fn test_merge_single_season_is_identity() {
        let season = Season::new(
            2019,
            vec![
                Week::new(1, vec![game("a", 70), game("b", 71)]),
                Week::new(2, vec![game("c", 72)]),
            ],
            vec![trouble(3)],
        );
        assert_eq!(merge_seasons(std::slice::from_ref(&season)).unwrap(), season);
    }

    #[test]
    fn test_later_season_wins_conflicts() {
        let s1 = Season::new(2019, vec![Week::new(1, vec![game("a", 70), game("b", 71)])], vec![]);
        let s2 = Season::new(2019, vec![Week::new(1, vec![game("a", 99)])], vec![]);

        let forward = merge_seasons(&[s1.clone(), s2.clone()]).unwrap();
        assert_eq!(ids(&forward.weeks[0]), vec!["a", "b"]);
        assert_eq!(forward.weeks[0].games[0].home_score, 99);

        let backward = merge_seasons(&[s2, s1]).unwrap();
        assert_eq!(backward.weeks[0].games[0].home_score, 70);
    }

    #[test]
    fn test_disjoint_weeks_are_unioned() {
        let s1 = Season::new(2019, vec![Week::new(3, vec![game("c", 70)])], vec![]);
        let s2 = Season::new(
            2019,
            vec![Week::new(1, vec![game("a", 70)]), Week::new(5, vec![game("e", 70)])],
            vec![],
        );

        let merged = merge_seasons(&[s1.clone(), s2.clone()]).unwrap();
        let numbers: Vec<u32> = merged.weeks.iter().map(|w| w.number).collect();
        assert_eq!(numbers, vec![1, 3, 5]);
        assert_eq!(merged.weeks[0], s2.weeks[0]);
        assert_eq!(merged.weeks[1], s1.weeks[0]);
        assert_eq!(merged.weeks[2], s2.weeks[1]);
    }

    #[test]
    fn test_trouble_params_are_deduplicated() {
        let s1 = Season::new(2019, vec![], vec![trouble(1), trouble(2)]);
        let s2 = Season::new(2019, vec![], vec![trouble(2), trouble(3), trouble(1)]);

        let merged = merge_seasons(&[s1, s2]).unwrap();
        assert_eq!(merged.trouble_params, vec![trouble(1), trouble(2), trouble(3)]);
    }

    #[test]
    fn test_game_moving_weeks_ends_up_in_later_week_only() {
        let s1 = Season::new(
            2019,
            vec![Week::new(1, vec![game("a", 70), game("b", 70), game("c", 70)])],
            vec![],
        );
        let s2 = Season::new(
            2019,
            vec![Week::new(2, vec![game("a", 80)]), Week::new(1, vec![game("c", 90)])],
            vec![],
        );

        let merged = merge_seasons(&[s1, s2]).unwrap();
        assert_eq!(ids(&merged.weeks[0]), vec!["b", "c"]);
        assert_eq!(merged.weeks[0].games[1].home_score, 90);
        assert_eq!(ids(&merged.weeks[1]), vec!["a"]);
        assert_eq!(merged.weeks[1].games[0].home_score, 80);
        assert_eq!(merged.game_count(), 3);
    }

    #[test]
    fn test_mixed_years_rejected() {
        let s1 = Season::new(2019, vec![], vec![]);
        let s2 = Season::new(2020, vec![], vec![]);
        assert!(matches!(merge_seasons(&[s1, s2]), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(merge_seasons(&[]), Err(Error::InvalidInput(_))));
    }
}
