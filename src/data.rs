//! Match records, the team roster and dataset validation.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::csv::CsvReader;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One observed result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_score: u16,
    pub away_score: u16,
    pub date: Option<NaiveDate>,
}
impl MatchRecord {
    pub fn new(
        home_team: impl Into<String>,
        home_score: u16,
        away_team: impl Into<String>,
        away_score: u16,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_score,
            away_score,
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("no matches supplied")]
    Empty,

    #[error("home teams {home_only:?} never play away; away teams {away_only:?} never play at home")]
    UnbalancedRoster {
        home_only: Vec<String>,
        away_only: Vec<String>,
    },

    #[error("{home_team} cannot play itself")]
    SelfMatch { home_team: String },

    #[error("match {index} ({home_team} v {away_team}) has no date")]
    MissingDate {
        index: usize,
        home_team: String,
        away_team: String,
    },

    #[error("match {index} ({home_team} v {away_team}) on {date} is after the reference date {reference}")]
    FutureMatch {
        index: usize,
        home_team: String,
        away_team: String,
        date: NaiveDate,
        reference: NaiveDate,
    },

    #[error("unknown team {0}")]
    UnknownTeam(String),
}

/// Distinct team names, sorted, each assigned a stable index.
#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    teams: Vec<String>,
    index: FxHashMap<String, usize>,
}
impl Roster {
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn name(&self, index: usize) -> &str {
        &self.teams[index]
    }

    pub fn index_of(&self, team: &str) -> Result<usize, ValidationError> {
        self.index
            .get(team)
            .copied()
            .ok_or_else(|| ValidationError::UnknownTeam(team.to_string()))
    }
}

impl FromIterator<String> for Roster {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        let teams: Vec<_> = iter.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let index = teams
            .iter()
            .enumerate()
            .map(|(index, team)| (team.clone(), index))
            .collect();
        Self { teams, index }
    }
}

/// A match with its teams resolved to roster indices.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedMatch {
    pub home: usize,
    pub away: usize,
    pub home_score: u16,
    pub away_score: u16,
    pub date: Option<NaiveDate>,
}

/// A validated match history: every team has played both at home and away.
#[derive(Debug, Clone)]
pub struct Dataset {
    roster: Roster,
    matches: Vec<IndexedMatch>,
}
impl Dataset {
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn matches(&self) -> &[IndexedMatch] {
        &self.matches
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.matches.iter().filter_map(|m| m.date).max()
    }
}

impl TryFrom<&[MatchRecord]> for Dataset {
    type Error = ValidationError;

    fn try_from(records: &[MatchRecord]) -> Result<Self, Self::Error> {
        if records.is_empty() {
            return Err(ValidationError::Empty);
        }
        if let Some(record) = records.iter().find(|r| r.home_team == r.away_team) {
            return Err(ValidationError::SelfMatch {
                home_team: record.home_team.clone(),
            });
        }

        let home_teams: BTreeSet<_> = records.iter().map(|r| r.home_team.as_str()).collect();
        let away_teams: BTreeSet<_> = records.iter().map(|r| r.away_team.as_str()).collect();
        if home_teams != away_teams {
            return Err(ValidationError::UnbalancedRoster {
                home_only: home_teams.difference(&away_teams).map(ToString::to_string).collect(),
                away_only: away_teams.difference(&home_teams).map(ToString::to_string).collect(),
            });
        }

        let roster: Roster = home_teams.into_iter().map(ToString::to_string).collect();
        let matches = records
            .iter()
            .map(|record| {
                Ok(IndexedMatch {
                    home: roster.index_of(&record.home_team)?,
                    away: roster.index_of(&record.away_team)?,
                    home_score: record.home_score,
                    away_score: record.away_score,
                    date: record.date,
                })
            })
            .collect::<Result<_, ValidationError>>()?;
        Ok(Self { roster, matches })
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Reads results from a CSV file with a header row and the columns
/// `home_team,home_score,away_team,away_score[,date]`. An empty date cell means undated.
pub fn read_matches(path: impl AsRef<Path>) -> Result<Vec<MatchRecord>, LoadError> {
    let mut csv = CsvReader::open(path)?;
    let mut records = vec![];
    if csv.read().transpose()?.is_none() {
        return Ok(records);
    }
    for (row, record) in csv.enumerate() {
        let record = record?;
        let line = row + 2;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        records.push(parse_match(line, &record)?);
    }
    Ok(records)
}

fn parse_match(line: usize, cells: &[String]) -> Result<MatchRecord, LoadError> {
    let malformed = |message: String| LoadError::Malformed { line, message };
    if !(4..=5).contains(&cells.len()) {
        return Err(malformed(format!("expected 4 or 5 columns, got {}", cells.len())));
    }
    let team = |cell: &str| {
        if cell.is_empty() {
            Err(malformed("empty team name".to_string()))
        } else {
            Ok(cell.to_string())
        }
    };
    let score = |cell: &str| {
        cell.parse::<u16>()
            .map_err(|err| malformed(format!("invalid score '{cell}': {err}")))
    };
    let date = match cells.get(4).map(String::as_str) {
        None | Some("") => None,
        Some(cell) => Some(
            NaiveDate::parse_from_str(cell, DATE_FORMAT)
                .map_err(|err| malformed(format!("invalid date '{cell}': {err}")))?,
        ),
    };
    Ok(MatchRecord {
        home_team: team(&cells[0])?,
        home_score: score(&cells[1])?,
        away_team: team(&cells[2])?,
        away_score: score(&cells[3])?,
        date,
    })
}

/// Reads unplayed fixtures from a CSV file with a header row and the columns
/// `home_team,away_team`.
pub fn read_fixtures(path: impl AsRef<Path>) -> Result<Vec<(String, String)>, LoadError> {
    let mut csv = CsvReader::open(path)?;
    let mut fixtures = vec![];
    if csv.read().transpose()?.is_none() {
        return Ok(fixtures);
    }
    for (row, record) in csv.enumerate() {
        let record = record?;
        match record.as_slice() {
            [home, away] if !home.is_empty() && !away.is_empty() => {
                fixtures.push((home.clone(), away.clone()));
            }
            [empty] if empty.is_empty() => {}
            _ => {
                return Err(LoadError::Malformed {
                    line: row + 2,
                    message: format!("expected 2 non-empty columns, got {record:?}"),
                })
            }
        }
    }
    Ok(fixtures)
}
