// Per-player per-minute rate view and its correlation matrix.
//
// Rows are grouped by (player, season) across both season types, summed,
// converted to per-minute rates, and filtered to a minimum-minutes threshold
// so small samples do not distort the correlations.

use std::collections::BTreeMap;

use crate::analysis::metrics::{per_minute, DerivedMetrics, Metric};
use crate::present::{Axis, Column, Table};
use crate::seasons::SeasonLabel;
use crate::table::{PlayerSeasonRow, RawTotals, Stat};

// ---------------------------------------------------------------------------
// Rate rows
// ---------------------------------------------------------------------------

/// One (player, season) line: summed counting stats as per-minute rates
/// (minutes kept raw) plus the derived metric set.
#[derive(Debug, Clone)]
pub struct PlayerRateRow {
    pub player_id: i64,
    pub player: String,
    pub season: SeasonLabel,
    pub rates: RawTotals,
    pub metrics: DerivedMetrics,
}

/// Group the master table by (player, season), sum counting stats across
/// season types, scale to per-minute rates, and drop rows below
/// `min_minutes` total minutes.
pub fn build_rate_rows(rows: &[PlayerSeasonRow], min_minutes: f64) -> Vec<PlayerRateRow> {
    let mut groups: BTreeMap<(i64, String), (String, RawTotals)> = BTreeMap::new();

    for row in rows {
        let key = (row.player_id, row.season.as_str().to_string());
        let entry = groups
            .entry(key)
            .or_insert_with(|| (row.player.clone(), RawTotals::ZERO));
        entry.1 = entry.1.add(&row.totals);
    }

    groups
        .into_iter()
        .filter(|(_, (_, totals))| totals.min >= min_minutes)
        .map(|((player_id, season), (player, totals))| {
            let rates = per_minute(&totals);
            PlayerRateRow {
                player_id,
                player,
                season: SeasonLabel::from_raw(season),
                metrics: DerivedMetrics::from_totals(&rates),
                rates,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pearson correlation
// ---------------------------------------------------------------------------

/// Pearson correlation over pairwise-complete observations: positions where
/// either value is non-finite are skipped. Returns NaN when fewer than two
/// complete pairs remain or when either column has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Correlation matrix across every numeric column of the rate view: the
/// sixteen per-minute stats followed by the ten derived metrics.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// `values[i][j]` is the correlation between columns i and j.
    pub values: Vec<Vec<f64>>,
}

pub fn correlation_matrix(rows: &[PlayerRateRow]) -> CorrelationMatrix {
    let mut labels = Vec::with_capacity(Stat::ALL.len() + Metric::ALL.len());
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(labels.capacity());

    for stat in Stat::ALL {
        labels.push(stat.name().to_string());
        columns.push(rows.iter().map(|r| r.rates.get(stat)).collect());
    }
    for metric in Metric::ALL {
        labels.push(metric.name().to_string());
        columns.push(rows.iter().map(|r| r.metrics.get(metric)).collect());
    }

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { labels, values }
}

impl CorrelationMatrix {
    /// Finished-table form: x axis is the column labels, one numeric column
    /// per label.
    pub fn to_table(&self, title: &str) -> Table {
        Table {
            title: title.to_string(),
            x_axis: Some(Axis {
                name: "category".to_string(),
                labels: self.labels.clone(),
            }),
            columns: self
                .labels
                .iter()
                .zip(&self.values)
                .map(|(label, row)| Column {
                    name: label.clone(),
                    values: row.clone(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
