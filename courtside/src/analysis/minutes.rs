// Minutes-per-game distribution view.
//
// For each season type, the view yields the MIN/GP value of every
// player-season row passing a small-sample filter, plus the fixed bin
// geometry the presentation layer histograms against.

use crate::analysis::metrics::ratio;
use crate::config::HistogramFilter;
use crate::present::{Axis, Column, Table};
use crate::seasons::SeasonType;
use crate::table::PlayerSeasonRow;

// ---------------------------------------------------------------------------
// Bin geometry
// ---------------------------------------------------------------------------

/// Fixed-width histogram bins over `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct HistogramSpec {
    pub start: f64,
    pub end: f64,
    pub width: f64,
}

/// One-minute bins from 0 to 46 minutes per game.
pub const MINUTES_BINS: HistogramSpec = HistogramSpec {
    start: 0.0,
    end: 46.0,
    width: 1.0,
};

impl HistogramSpec {
    pub fn bin_count(&self) -> usize {
        ((self.end - self.start) / self.width).ceil() as usize
    }
}

/// Percent of values landing in each bin. Non-finite and out-of-range values
/// are excluded from the bins but still count toward the total, matching
/// percent normalization over the whole sequence.
pub fn bin_percentages(values: &[f64], bins: &HistogramSpec) -> Vec<f64> {
    let mut counts = vec![0usize; bins.bin_count()];
    let mut total = 0usize;

    for &v in values {
        if !v.is_finite() {
            continue;
        }
        total += 1;
        if v < bins.start || v >= bins.end {
            continue;
        }
        let bin = ((v - bins.start) / bins.width) as usize;
        counts[bin] += 1;
    }

    if total == 0 {
        return vec![0.0; bins.bin_count()];
    }
    counts
        .into_iter()
        .map(|c| 100.0 * c as f64 / total as f64)
        .collect()
}

// ---------------------------------------------------------------------------
// Distribution view
// ---------------------------------------------------------------------------

/// Minutes-per-game sequences for the two season types, with the shared bin
/// geometry.
#[derive(Debug, Clone)]
pub struct MinutesDistribution {
    pub regular_season: Vec<f64>,
    pub playoffs: Vec<f64>,
    pub bins: HistogramSpec,
}

/// Build the distribution view. Each player-season row passing its season
/// type's filter contributes one MIN/GP value; the two season types use
/// separate filters because playoff samples are inherently smaller.
pub fn build(
    rows: &[PlayerSeasonRow],
    regular_filter: HistogramFilter,
    playoff_filter: HistogramFilter,
) -> MinutesDistribution {
    MinutesDistribution {
        regular_season: minutes_per_game(rows, SeasonType::Regular, regular_filter),
        playoffs: minutes_per_game(rows, SeasonType::Playoffs, playoff_filter),
        bins: MINUTES_BINS,
    }
}

fn minutes_per_game(
    rows: &[PlayerSeasonRow],
    season_type: SeasonType,
    filter: HistogramFilter,
) -> Vec<f64> {
    rows.iter()
        .filter(|r| {
            r.season_type == season_type
                && r.totals.min >= filter.min_minutes
                && r.gp >= filter.min_games
        })
        .map(|r| ratio(r.totals.min, r.gp as f64))
        .collect()
}

impl MinutesDistribution {
    /// Finished-table form: one binned-percentage column per season type,
    /// x axis labelled by bin lower edge.
    pub fn to_table(&self, title: &str) -> Table {
        let labels = (0..self.bins.bin_count())
            .map(|i| format!("{}", self.bins.start + i as f64 * self.bins.width))
            .collect();

        Table {
            title: title.to_string(),
            x_axis: Some(Axis {
                name: "minutes per game".to_string(),
                labels,
            }),
            columns: vec![
                Column {
                    name: "Regular Season %".to_string(),
                    values: bin_percentages(&self.regular_season, &self.bins),
                },
                Column {
                    name: "Playoffs %".to_string(),
                    values: bin_percentages(&self.playoffs, &self.bins),
                },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
