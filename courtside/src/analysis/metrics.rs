// Derived shooting and efficiency metrics.
//
// One formula-pinned implementation shared by every view. The carrier is any
// `RawTotals`, so the same derivation applies whether a row is one
// player-season, a league-season aggregate, or a scaled rendition of either.

use crate::table::{RawTotals, Stat};

// ---------------------------------------------------------------------------
// Division policy
// ---------------------------------------------------------------------------

/// Divide, mapping every zero denominator to NaN.
///
/// Bare IEEE division sends x/0 to ±infinity; the pipeline's contract is that
/// an undefined ratio is NaN wherever the denominator is zero, and NaN must
/// survive into aggregation and rendering without raising.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Approximate offensive possessions from counting stats.
pub fn poss_estimate(t: &RawTotals) -> f64 {
    t.fga - t.oreb + t.tov + 0.44 * t.fta
}

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// Per-minute rates: every stat divided by minutes, with minutes kept raw so
/// volume remains visible alongside the rates.
pub fn per_minute(t: &RawTotals) -> RawTotals {
    RawTotals::from_fn(|s| {
        if s == Stat::Min {
            t.min
        } else {
            ratio(t.get(s), t.min)
        }
    })
}

/// Multiply every stat by `factor`. Used for the 48-minute/5-player basis
/// (`factor = 240/MIN`) and the per-100-possessions basis
/// (`factor = 100/POSS_est`).
pub fn scaled(t: &RawTotals, factor: f64) -> RawTotals {
    RawTotals::from_fn(|s| t.get(s) * factor)
}

// ---------------------------------------------------------------------------
// Derived metric set
// ---------------------------------------------------------------------------

/// The fixed derived-metric columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    FgPct,
    Fg3Pct,
    FtPct,
    AstPct,
    Fg3aRate,
    PtsPerFga,
    Fg3mShare,
    FtaRate,
    TruePct,
    AstToTov,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::FgPct,
        Metric::Fg3Pct,
        Metric::FtPct,
        Metric::AstPct,
        Metric::Fg3aRate,
        Metric::PtsPerFga,
        Metric::Fg3mShare,
        Metric::FtaRate,
        Metric::TruePct,
        Metric::AstToTov,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::FgPct => "FG%",
            Metric::Fg3Pct => "3PT%",
            Metric::FtPct => "FT%",
            Metric::AstPct => "AST%",
            Metric::Fg3aRate => "FG3A%",
            Metric::PtsPerFga => "PTS/FGA",
            Metric::Fg3mShare => "FG3M/FGM",
            Metric::FtaRate => "FTA/FGA",
            Metric::TruePct => "TRU%",
            Metric::AstToTov => "AST_TOV",
        }
    }
}

/// The ten ratio metrics computed from raw counting stats. Always recomputed
/// fresh for a view, never mutated in place on a shared table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub fg_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
    pub ast_pct: f64,
    pub fg3a_rate: f64,
    pub pts_per_fga: f64,
    pub fg3m_share: f64,
    pub fta_rate: f64,
    pub true_pct: f64,
    pub ast_to_tov: f64,
}

impl DerivedMetrics {
    pub fn from_totals(t: &RawTotals) -> DerivedMetrics {
        DerivedMetrics {
            fg_pct: ratio(t.fgm, t.fga),
            fg3_pct: ratio(t.fg3m, t.fg3a),
            ft_pct: ratio(t.ftm, t.fta),
            ast_pct: ratio(t.ast, t.fgm),
            fg3a_rate: ratio(t.fg3a, t.fga),
            pts_per_fga: ratio(t.pts, t.fga),
            fg3m_share: ratio(t.fg3m, t.fgm),
            fta_rate: ratio(t.fta, t.fga),
            true_pct: ratio(0.5 * t.pts, t.fga + 0.475 * t.fta),
            ast_to_tov: ratio(t.ast, t.tov),
        }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::FgPct => self.fg_pct,
            Metric::Fg3Pct => self.fg3_pct,
            Metric::FtPct => self.ft_pct,
            Metric::AstPct => self.ast_pct,
            Metric::Fg3aRate => self.fg3a_rate,
            Metric::PtsPerFga => self.pts_per_fga,
            Metric::Fg3mShare => self.fg3m_share,
            Metric::FtaRate => self.fta_rate,
            Metric::TruePct => self.true_pct,
            Metric::AstToTov => self.ast_to_tov,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_totals() -> RawTotals {
        RawTotals {
            min: 100.0,
            fgm: 10.0,
            fga: 20.0,
            fg3m: 4.0,
            fg3a: 8.0,
            ftm: 5.0,
            fta: 10.0,
            oreb: 3.0,
            dreb: 7.0,
            reb: 10.0,
            ast: 6.0,
            stl: 2.0,
            blk: 1.0,
            tov: 3.0,
            pf: 4.0,
            pts: 27.0,
        }
    }

    #[test]
    fn known_percentages() {
        let m = DerivedMetrics::from_totals(&sample_totals());
        assert!(approx_eq(m.fg_pct, 0.5, 1e-12));
        assert!(approx_eq(m.fg3_pct, 0.5, 1e-12));
        assert!(approx_eq(m.ft_pct, 0.5, 1e-12));
        assert!(approx_eq(m.ast_pct, 0.6, 1e-12));
        assert!(approx_eq(m.fg3a_rate, 0.4, 1e-12));
        assert!(approx_eq(m.pts_per_fga, 1.35, 1e-12));
        assert!(approx_eq(m.fg3m_share, 0.4, 1e-12));
        assert!(approx_eq(m.fta_rate, 0.5, 1e-12));
        assert!(approx_eq(m.ast_to_tov, 2.0, 1e-12));
    }

    #[test]
    fn true_shooting_known_value() {
        // 0.5 * 27 / (20 + 0.475 * 10) = 13.5 / 24.75
        let m = DerivedMetrics::from_totals(&sample_totals());
        assert!(approx_eq(m.true_pct, 13.5 / 24.75, 1e-12));
        assert!(approx_eq(m.true_pct, 0.5454545454, 1e-9));
    }

    #[test]
    fn zero_denominators_yield_nan_without_raising() {
        let t = RawTotals::ZERO;
        let m = DerivedMetrics::from_totals(&t);
        for metric in Metric::ALL {
            assert!(m.get(metric).is_nan(), "{} should be NaN", metric.name());
        }
    }

    #[test]
    fn nonzero_numerator_over_zero_denominator_is_nan_not_inf() {
        // Plain IEEE division would produce +inf here.
        assert!(ratio(5.0, 0.0).is_nan());
        assert!(ratio(-5.0, 0.0).is_nan());
        assert!(ratio(0.0, 0.0).is_nan());
        assert!(approx_eq(ratio(6.0, 3.0), 2.0, 1e-12));
    }

    #[test]
    fn derivation_is_idempotent() {
        // Re-deriving from the same base totals yields identical values
        // (derived columns are views, never folded back into the base).
        let t = sample_totals();
        let first = DerivedMetrics::from_totals(&t);
        let second = DerivedMetrics::from_totals(&t);
        for metric in Metric::ALL {
            let (a, b) = (first.get(metric), second.get(metric));
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }

    #[test]
    fn possession_estimate_known_value() {
        let t = RawTotals {
            fga: 100.0,
            oreb: 10.0,
            tov: 15.0,
            fta: 20.0,
            ..RawTotals::ZERO
        };
        assert!(approx_eq(poss_estimate(&t), 113.8, 1e-12));
    }

    #[test]
    fn metrics_are_scale_invariant() {
        // Percentage metrics are independent of the scaling basis.
        let t = sample_totals();
        let base = DerivedMetrics::from_totals(&t);
        let per100 = DerivedMetrics::from_totals(&scaled(&t, 100.0 / poss_estimate(&t)));
        for metric in Metric::ALL {
            assert!(
                approx_eq(base.get(metric), per100.get(metric), 1e-9),
                "{} drifted under scaling",
                metric.name()
            );
        }
    }

    #[test]
    fn per_minute_keeps_minutes_raw() {
        let t = sample_totals();
        let rates = per_minute(&t);
        assert!(approx_eq(rates.min, 100.0, 1e-12));
        assert!(approx_eq(rates.pts, 0.27, 1e-12));
        assert!(approx_eq(rates.fga, 0.2, 1e-12));
    }

    #[test]
    fn per_minute_with_zero_minutes_is_nan() {
        let t = RawTotals {
            pts: 10.0,
            ..RawTotals::ZERO
        };
        let rates = per_minute(&t);
        assert!(rates.pts.is_nan());
        assert!(approx_eq(rates.min, 0.0, 1e-12));
    }

    #[test]
    fn scaled_multiplies_every_stat() {
        let t = sample_totals();
        let s = scaled(&t, 2.0);
        for stat in Stat::ALL {
            assert!(approx_eq(s.get(stat), t.get(stat) * 2.0, 1e-12));
        }
    }
}
