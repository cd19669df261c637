//! Testing helpers.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::data::MatchRecord;

/// Writes `contents` to a uniquely named file under the system temp directory.
pub fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(format!("korfball-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A 2-team history: A beats B 20-15 at home, B beats A 18-16 at home.
pub fn two_teams() -> Vec<MatchRecord> {
    vec![
        MatchRecord::new("A", 20, "B", 15),
        MatchRecord::new("B", 18, "A", 16),
    ]
}

/// A dated double round robin between four teams, one round per week.
pub fn four_teams() -> Vec<MatchRecord> {
    let results = [
        ("Fortuna", 24, "DVO", 17),
        ("PKC", 21, "TOP", 19),
        ("DVO", 18, "PKC", 22),
        ("TOP", 20, "Fortuna", 23),
        ("Fortuna", 19, "PKC", 19),
        ("TOP", 25, "DVO", 16),
        ("DVO", 15, "Fortuna", 21),
        ("TOP", 17, "PKC", 20),
        ("PKC", 23, "DVO", 14),
        ("Fortuna", 26, "TOP", 18),
        ("PKC", 20, "Fortuna", 22),
        ("DVO", 19, "TOP", 19),
    ];
    let start = date(2023, 9, 2);
    results
        .into_iter()
        .enumerate()
        .map(|(index, (home, home_score, away, away_score))| {
            let round = index as u64 / 2;
            MatchRecord::new(home, home_score, away, away_score)
                .with_date(start + chrono::Days::new(round * 7))
        })
        .collect()
}
