//! Tabular rendering of estimates, predictions and projected standings.

use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Separator, Styles};
use stanza::table::{Col, Row, Table};

use crate::fit::Estimate;
use crate::params::{HOME_ADV, RHO};
use crate::scoregrid::{Outcome, ScoreGrid, Side};
use crate::season::Season;

pub fn tabulate_strengths(estimate: &Estimate) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(12)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Team".into(), "Attack".into(), "Defence".into()],
        ));
    let layout = estimate.layout();
    for (index, team) in estimate.roster().teams().iter().enumerate() {
        let strength = layout.strength(estimate.values(), index);
        table.push_row(Row::new(
            Styles::default(),
            vec![
                team.clone().into(),
                format!("{:.4}", strength.attack).into(),
                format!("{:.4}", strength.defence).into(),
            ],
        ));
    }
    table.push_row(Row::new(
        Styles::default().with(Separator(true)),
        vec![HOME_ADV.into(), format!("{:.4}", estimate.home_adv()).into(), "".into()],
    ));
    table.push_row(Row::new(
        Styles::default(),
        vec![RHO.into(), format!("{:.4}", estimate.rho()).into(), "".into()],
    ));
    table
}

pub fn tabulate_prediction(home_team: &str, away_team: &str, grid: &ScoreGrid) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(14)).with(Left)),
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![format!("{home_team} v {away_team}").into(), "".into()],
        ));
    let (home_expectation, away_expectation) = grid.expectations();
    let mode = grid.mode();
    let rows = [
        ("Home rate".to_string(), format!("{:.3}", grid.rates().home)),
        ("Away rate".to_string(), format!("{:.3}", grid.rates().away)),
        (
            "Expected".to_string(),
            format!("{home_expectation:.2}-{away_expectation:.2}"),
        ),
        (
            format!("{home_team} win"),
            format!("{:.4}", grid.probability(&Outcome::Win(Side::Home))),
        ),
        ("Draw".to_string(), format!("{:.4}", grid.probability(&Outcome::Draw))),
        (
            format!("{away_team} win"),
            format!("{:.4}", grid.probability(&Outcome::Win(Side::Away))),
        ),
        ("Likeliest".to_string(), format!("{}-{}", mode.home, mode.away)),
    ];
    for (label, value) in rows {
        table.push_row(Row::new(Styles::default(), vec![label.into(), value.into()]));
    }
    table
}

pub fn tabulate_standings(season: &Season) -> Table {
    let teams = season.standings.len();
    let mut table = Table::default()
        .with_cols({
            let mut cols = vec![
                Col::new(Styles::default().with(MinWidth(12)).with(Left)),
                Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
                Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            ];
            for _ in 0..teams {
                cols.push(Col::new(
                    Styles::default().with(MinWidth(7)).with(HAlign::Right),
                ));
            }
            cols
        })
        .with_row({
            let mut header_cells = vec!["Team".into(), "Pts".into(), "Exp pts".into()];
            for position in 0..teams {
                header_cells.push(format!("P{}", position + 1).into());
            }
            Row::new(Styles::default().with(Header(true)), header_cells)
        });
    for standing in &season.standings {
        let mut row_cells = vec![
            standing.team.clone().into(),
            format!("{}", standing.points).into(),
            format!("{:.2}", standing.expected_points).into(),
        ];
        for prob in &standing.positions {
            row_cells.push(format!("{prob:.3}").into());
        }
        table.push_row(Row::new(Styles::default(), row_cells));
    }
    table
}
