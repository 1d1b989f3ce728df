// Regular-season vs playoff comparison view.
//
// The two phases are aggregated per season start year, normalized to
// per-100-estimated-possessions separately, and compared column by column as
// a percent change. A zero regular-season value makes the change undefined
// (NaN), never an error.

use std::collections::BTreeMap;

use tracing::warn;

use crate::analysis::metrics::{ratio, scaled, DerivedMetrics, Metric};
use crate::analysis::pace::{aggregate_by_season, LeagueSeasonAggregate};
use crate::present::{Axis, Column, Table};
use crate::seasons::SeasonType;
use crate::table::{PlayerSeasonRow, Stat};

// ---------------------------------------------------------------------------
// Percent change
// ---------------------------------------------------------------------------

/// `100 * (playoff - regular) / regular`; NaN when the regular-season value
/// is zero or either input is already undefined.
pub fn percent_change(regular: f64, playoff: f64) -> f64 {
    100.0 * ratio(playoff - regular, regular)
}

// ---------------------------------------------------------------------------
// Comparison rows
// ---------------------------------------------------------------------------

/// Percent change per column for one season. Columns are the counting stats
/// on the per-100 basis (minutes excluded: not a per-possession quantity)
/// followed by the derived metrics.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub season_start_year: i32,
    pub changes: Vec<(&'static str, f64)>,
}

/// Per-100 rendition of one phase's season aggregate.
struct PhasePer100 {
    stats: crate::table::RawTotals,
    metrics: DerivedMetrics,
}

fn per_100_by_year(rows: &[PlayerSeasonRow], season_type: SeasonType) -> BTreeMap<i32, PhasePer100> {
    let phase_rows: Vec<PlayerSeasonRow> = rows
        .iter()
        .filter(|r| r.season_type == season_type)
        .cloned()
        .collect();

    aggregate_by_season(&phase_rows)
        .into_iter()
        .map(|LeagueSeasonAggregate { season_start_year, totals, poss_est }| {
            let per100 = PhasePer100 {
                stats: scaled(&totals, ratio(100.0, poss_est)),
                metrics: DerivedMetrics::from_totals(&totals),
            };
            (season_start_year, per100)
        })
        .collect()
}

/// Build the comparison view. Seasons present in only one phase are skipped
/// (a season with no playoff rows has nothing to compare against).
pub fn build(rows: &[PlayerSeasonRow]) -> Vec<ComparisonRow> {
    let regular = per_100_by_year(rows, SeasonType::Regular);
    let playoffs = per_100_by_year(rows, SeasonType::Playoffs);

    let mut out = Vec::new();
    for (year, rs) in &regular {
        let Some(po) = playoffs.get(year) else {
            warn!("season {year} has no playoff rows; skipping comparison");
            continue;
        };

        let mut changes = Vec::with_capacity(Stat::ALL.len() - 1 + Metric::ALL.len());
        for stat in Stat::ALL {
            if stat == Stat::Min {
                continue;
            }
            changes.push((
                stat.name(),
                percent_change(rs.stats.get(stat), po.stats.get(stat)),
            ));
        }
        for metric in Metric::ALL {
            changes.push((
                metric.name(),
                percent_change(rs.metrics.get(metric), po.metrics.get(metric)),
            ));
        }

        out.push(ComparisonRow {
            season_start_year: *year,
            changes,
        });
    }

    out
}

/// Finished-table form: x axis is the season start year, one percent-change
/// column per stat.
pub fn to_table(rows: &[ComparisonRow], title: &str) -> Table {
    let labels = rows
        .iter()
        .map(|r| r.season_start_year.to_string())
        .collect();

    let columns = match rows.first() {
        None => Vec::new(),
        Some(first) => first
            .changes
            .iter()
            .enumerate()
            .map(|(i, (name, _))| Column {
                name: name.to_string(),
                values: rows.iter().map(|r| r.changes[i].1).collect(),
            })
            .collect(),
    };

    Table {
        title: title.to_string(),
        x_axis: Some(Axis {
            name: "season start year".to_string(),
            labels,
        }),
        columns,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
