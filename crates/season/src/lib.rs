//! Season acquisition: fan-out of unit fetches, week grouping, the
//! completed-season cache, and merging of partial seasons.

pub mod assembler;
pub mod cache;
pub mod league;
pub mod merge;
pub mod parallel;
pub mod unit;

pub use assembler::SeasonAssembler;
pub use cache::SeasonCache;
pub use league::{end_year, CalendarDate, GameFilter, League, LeagueParams, Schedule};
pub use merge::merge_seasons;
pub use parallel::{run_many, TaskBatch};
pub use unit::{UnitAcquirer, UnitOutcome};
