// League pace-normalized trend view.
//
// All player rows are collapsed into one league aggregate per season start
// year. The aggregate is rendered on two scaling bases: a 48-minute/5-player
// basis (how a full game of average basketball looked that year) and a
// per-100-estimated-possessions basis (pace-free comparison across eras).

use std::collections::BTreeMap;

use crate::analysis::metrics::{poss_estimate, ratio, scaled, DerivedMetrics, Metric};
use crate::present::{Axis, Column, Table};
use crate::table::{PlayerSeasonRow, RawTotals, Stat};

// ---------------------------------------------------------------------------
// Season aggregates
// ---------------------------------------------------------------------------

/// League-wide summed counting stats for one season start year.
#[derive(Debug, Clone)]
pub struct LeagueSeasonAggregate {
    pub season_start_year: i32,
    pub totals: RawTotals,
    pub poss_est: f64,
}

/// Sum counting stats over every row per season start year, ascending.
pub fn aggregate_by_season(rows: &[PlayerSeasonRow]) -> Vec<LeagueSeasonAggregate> {
    let mut groups: BTreeMap<i32, RawTotals> = BTreeMap::new();
    for row in rows {
        let entry = groups
            .entry(row.season_start_year)
            .or_insert(RawTotals::ZERO);
        *entry = entry.add(&row.totals);
    }

    groups
        .into_iter()
        .map(|(season_start_year, totals)| LeagueSeasonAggregate {
            season_start_year,
            poss_est: poss_estimate(&totals),
            totals,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trend tables
// ---------------------------------------------------------------------------

/// One season of a trend table: scaled counting stats plus the derived
/// metrics (which are scale-invariant and computed from the raw aggregate).
#[derive(Debug, Clone)]
pub struct TrendRow {
    pub season_start_year: i32,
    pub stats: RawTotals,
    /// Estimated possessions per 48 minutes; only the per-48 table carries a
    /// meaningful pace column (per 100 possessions it is 100 by definition).
    pub pace: Option<f64>,
    pub metrics: DerivedMetrics,
}

#[derive(Debug, Clone)]
pub struct PaceTrends {
    pub per_48: Vec<TrendRow>,
    pub per_100: Vec<TrendRow>,
}

/// Build both trend tables from the master table.
pub fn build(rows: &[PlayerSeasonRow]) -> PaceTrends {
    let aggregates = aggregate_by_season(rows);

    let per_48 = aggregates
        .iter()
        .map(|agg| {
            // 48 minutes × 5 players on the floor.
            let factor = ratio(48.0 * 5.0, agg.totals.min);
            TrendRow {
                season_start_year: agg.season_start_year,
                stats: scaled(&agg.totals, factor),
                pace: Some(agg.poss_est * factor),
                metrics: DerivedMetrics::from_totals(&agg.totals),
            }
        })
        .collect();

    let per_100 = aggregates
        .iter()
        .map(|agg| {
            let factor = ratio(100.0, agg.poss_est);
            TrendRow {
                season_start_year: agg.season_start_year,
                stats: scaled(&agg.totals, factor),
                pace: None,
                metrics: DerivedMetrics::from_totals(&agg.totals),
            }
        })
        .collect();

    PaceTrends { per_48, per_100 }
}

fn trend_table(title: &str, rows: &[TrendRow]) -> Table {
    let labels = rows
        .iter()
        .map(|r| r.season_start_year.to_string())
        .collect();

    let mut columns = Vec::new();
    for stat in Stat::ALL {
        // Minutes are the scaling basis, not a trend column.
        if stat == Stat::Min {
            continue;
        }
        columns.push(Column {
            name: stat.name().to_string(),
            values: rows.iter().map(|r| r.stats.get(stat)).collect(),
        });
    }
    if rows.iter().any(|r| r.pace.is_some()) {
        columns.push(Column {
            name: "PACE".to_string(),
            values: rows
                .iter()
                .map(|r| r.pace.unwrap_or(f64::NAN))
                .collect(),
        });
    }
    for metric in Metric::ALL {
        columns.push(Column {
            name: metric.name().to_string(),
            values: rows.iter().map(|r| r.metrics.get(metric)).collect(),
        });
    }

    Table {
        title: title.to_string(),
        x_axis: Some(Axis {
            name: "season start year".to_string(),
            labels,
        }),
        columns,
    }
}

impl PaceTrends {
    pub fn to_tables(&self) -> (Table, Table) {
        (
            trend_table("League averages per 48 minutes", &self.per_48),
            trend_table("League averages per 100 possessions", &self.per_100),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seasons::{SeasonLabel, SeasonType};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn row(year: i32, totals: RawTotals) -> PlayerSeasonRow {
        PlayerSeasonRow {
            player_id: 1,
            player: "A".into(),
            team: "TST".into(),
            season: SeasonLabel::from_start_year(year),
            season_start_year: year,
            season_type: SeasonType::Regular,
            gp: 10,
            totals,
        }
    }

    #[test]
    fn aggregates_sum_within_season() {
        let rows = vec![
            row(
                2012,
                RawTotals {
                    min: 100.0,
                    pts: 50.0,
                    ..RawTotals::ZERO
                },
            ),
            row(
                2012,
                RawTotals {
                    min: 200.0,
                    pts: 150.0,
                    ..RawTotals::ZERO
                },
            ),
            row(
                2013,
                RawTotals {
                    min: 300.0,
                    pts: 100.0,
                    ..RawTotals::ZERO
                },
            ),
        ];
        let aggs = aggregate_by_season(&rows);
        assert_eq!(aggs.len(), 2);
        assert_eq!(aggs[0].season_start_year, 2012);
        assert!(approx_eq(aggs[0].totals.min, 300.0, 1e-9));
        assert!(approx_eq(aggs[0].totals.pts, 200.0, 1e-9));
        assert_eq!(aggs[1].season_start_year, 2013);
    }

    #[test]
    fn aggregates_are_ascending_by_year() {
        let rows = vec![
            row(2015, RawTotals::ZERO),
            row(2011, RawTotals::ZERO),
            row(2013, RawTotals::ZERO),
        ];
        let aggs = aggregate_by_season(&rows);
        let years: Vec<i32> = aggs.iter().map(|a| a.season_start_year).collect();
        assert_eq!(years, vec![2011, 2013, 2015]);
    }

    #[test]
    fn per_48_scaling_known_value() {
        // League plays 480 total minutes and scores 200 points:
        // per-48x5 points = 200 / 480 * 240 = 100.
        let rows = vec![row(
            2012,
            RawTotals {
                min: 480.0,
                pts: 200.0,
                ..RawTotals::ZERO
            },
        )];
        let trends = build(&rows);
        assert!(approx_eq(trends.per_48[0].stats.pts, 100.0, 1e-9));
    }

    #[test]
    fn per_100_scaling_known_value() {
        // POSS_est = 100 - 10 + 15 + 0.44*20 = 113.8
        let totals = RawTotals {
            min: 480.0,
            fga: 100.0,
            oreb: 10.0,
            tov: 15.0,
            fta: 20.0,
            pts: 113.8,
            ..RawTotals::ZERO
        };
        let trends = build(&[row(2012, totals)]);
        assert!(approx_eq(trends.per_100[0].stats.pts, 100.0, 1e-9));
        assert!(trends.per_100[0].pace.is_none());
    }

    #[test]
    fn pace_is_possessions_per_48() {
        let totals = RawTotals {
            min: 480.0,
            fga: 100.0,
            oreb: 10.0,
            tov: 15.0,
            fta: 20.0,
            ..RawTotals::ZERO
        };
        let trends = build(&[row(2012, totals)]);
        // 113.8 possessions over 480 minutes → 113.8 / 480 * 240 = 56.9
        assert!(approx_eq(trends.per_48[0].pace.unwrap(), 56.9, 1e-9));
    }

    #[test]
    fn zero_minutes_scales_to_nan() {
        let trends = build(&[row(
            2012,
            RawTotals {
                pts: 10.0,
                ..RawTotals::ZERO
            },
        )]);
        assert!(trends.per_48[0].stats.pts.is_nan());
    }

    #[test]
    fn derived_metrics_match_raw_aggregate() {
        let totals = RawTotals {
            min: 480.0,
            fgm: 40.0,
            fga: 100.0,
            pts: 100.0,
            ..RawTotals::ZERO
        };
        let trends = build(&[row(2012, totals)]);
        assert!(approx_eq(trends.per_48[0].metrics.fg_pct, 0.4, 1e-9));
        assert!(approx_eq(trends.per_100[0].metrics.fg_pct, 0.4, 1e-9));
    }

    #[test]
    fn trend_tables_omit_minutes_column() {
        let trends = build(&[row(
            2012,
            RawTotals {
                min: 480.0,
                pts: 100.0,
                ..RawTotals::ZERO
            },
        )]);
        let (per48, per100) = trends.to_tables();
        assert!(per48.columns.iter().all(|c| c.name != "MIN"));
        assert!(per100.columns.iter().all(|c| c.name != "MIN"));
        assert!(per48.columns.iter().any(|c| c.name == "PACE"));
        assert!(per100.columns.iter().all(|c| c.name != "PACE"));
    }
}
