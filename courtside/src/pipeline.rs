// End-to-end orchestration: fetch → normalize → persist → analyze → present.
//
// Data flows one direction. The derived views all start from the same
// persisted master table and recompute their metrics independently.

use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::analysis::comparison::{self, ComparisonRow};
use crate::analysis::correlation::{self, CorrelationMatrix};
use crate::analysis::minutes::{self, MinutesDistribution};
use crate::analysis::pace::{self, PaceTrends};
use crate::config::{AnalysisConfig, Config};
use crate::fetch::LeaderboardClient;
use crate::present::Presenter;
use crate::seasons;
use crate::store;
use crate::table::{self, PlayerSeasonRow};

// ---------------------------------------------------------------------------
// Analysis phase
// ---------------------------------------------------------------------------

/// Every finished view, ready for the presentation collaborator.
pub struct AnalysisReport {
    pub correlation: CorrelationMatrix,
    pub minutes: MinutesDistribution,
    pub trends: PaceTrends,
    pub comparison: Vec<ComparisonRow>,
}

/// Build all four views from the normalized master table. Pure; exercised
/// directly by tests without any network or filesystem.
pub fn analyze(rows: &[PlayerSeasonRow], config: &AnalysisConfig) -> AnalysisReport {
    let rate_rows = correlation::build_rate_rows(rows, config.correlation_min_minutes);
    info!(
        player_seasons = rate_rows.len(),
        "built per-player rate view"
    );

    AnalysisReport {
        correlation: correlation::correlation_matrix(&rate_rows),
        minutes: minutes::build(rows, config.regular_season_hist, config.playoff_hist),
        trends: pace::build(rows),
        comparison: comparison::build(rows),
    }
}

/// Hand every finished table to the presenter.
pub fn render(report: &AnalysisReport, presenter: &mut dyn Presenter) -> anyhow::Result<()> {
    presenter.render(&report.correlation.to_table("Correlation of per-minute stats"))?;
    presenter.render(&report.minutes.to_table("Minutes-per-game distribution"))?;
    let (per_48, per_100) = report.trends.to_tables();
    presenter.render(&per_48)?;
    presenter.render(&per_100)?;
    presenter.render(&comparison::to_table(
        &report.comparison,
        "Regular season vs playoffs, % change per 100 possessions",
    ))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

/// Run the whole pipeline for an inclusive year range. The year pair arrives
/// already parsed; prompting is the caller's concern.
pub async fn run(
    config: &Config,
    start_year: i32,
    end_year: i32,
    presenter: &mut dyn Presenter,
) -> anyhow::Result<()> {
    let began = Instant::now();

    let labels = seasons::expand_year_range(start_year, end_year)?;
    info!(
        "fetching {} seasons, {} through {}",
        labels.len(),
        labels[0],
        labels[labels.len() - 1]
    );

    let client =
        LeaderboardClient::new(config.fetch.clone()).context("failed to build fetch client")?;
    let batches = client.fetch_all(&labels).await?;

    let master = table::normalize(&batches)?;
    info!(rows = master.len(), "normalized master table");

    let path = &config.storage.master_path;
    store::write_master(path, &master)?;

    // The analysis phase reads the persisted table back: the CSV is the sole
    // durability point between the two phases.
    let master = store::read_master(path)?;
    let report = analyze(&master, &config.analysis);
    render(&report, presenter)?;

    store::remove_master(path)?;

    info!(
        "run completed in {:.2} minutes",
        began.elapsed().as_secs_f64() / 60.0
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HistogramFilter;
    use crate::seasons::{SeasonLabel, SeasonType};
    use crate::table::RawTotals;

    fn analysis_config() -> AnalysisConfig {
        AnalysisConfig {
            correlation_min_minutes: 50.0,
            regular_season_hist: HistogramFilter {
                min_minutes: 50.0,
                min_games: 5,
            },
            playoff_hist: HistogramFilter {
                min_minutes: 5.0,
                min_games: 1,
            },
        }
    }

    fn row(
        player_id: i64,
        year: i32,
        season_type: SeasonType,
        min: f64,
        pts: f64,
    ) -> PlayerSeasonRow {
        PlayerSeasonRow {
            player_id,
            player: format!("Player {player_id}"),
            team: "TST".into(),
            season: SeasonLabel::from_start_year(year),
            season_start_year: year,
            season_type,
            gp: 20,
            totals: RawTotals {
                min,
                pts,
                fga: pts / 2.0,
                fgm: pts / 4.0,
                fta: pts / 10.0,
                ftm: pts / 20.0,
                oreb: pts / 30.0,
                tov: pts / 15.0,
                ast: pts / 8.0,
                ..RawTotals::ZERO
            },
        }
    }

    fn two_season_master() -> Vec<PlayerSeasonRow> {
        vec![
            row(1, 2012, SeasonType::Regular, 2000.0, 1500.0),
            row(2, 2012, SeasonType::Regular, 1800.0, 1100.0),
            row(1, 2012, SeasonType::Playoffs, 500.0, 420.0),
            row(1, 2013, SeasonType::Regular, 2100.0, 1600.0),
            row(2, 2013, SeasonType::Regular, 1700.0, 1000.0),
            row(2, 2013, SeasonType::Playoffs, 400.0, 300.0),
        ]
    }

    #[test]
    fn analyze_builds_every_view() {
        let report = analyze(&two_season_master(), &analysis_config());

        assert!(!report.correlation.labels.is_empty());
        assert_eq!(report.trends.per_48.len(), 2);
        assert_eq!(report.trends.per_100.len(), 2);
        assert_eq!(report.comparison.len(), 2);
        assert_eq!(report.minutes.regular_season.len(), 4);
        assert_eq!(report.minutes.playoffs.len(), 2);
    }

    #[test]
    fn render_emits_five_tables() {
        struct Counting(usize);
        impl Presenter for Counting {
            fn render(&mut self, _table: &crate::present::Table) -> anyhow::Result<()> {
                self.0 += 1;
                Ok(())
            }
        }

        let report = analyze(&two_season_master(), &analysis_config());
        let mut presenter = Counting(0);
        render(&report, &mut presenter).unwrap();
        assert_eq!(presenter.0, 5);
    }

    #[test]
    fn analyze_tolerates_empty_master() {
        let report = analyze(&[], &analysis_config());
        assert!(report.trends.per_48.is_empty());
        assert!(report.comparison.is_empty());
        assert!(report.minutes.regular_season.is_empty());
    }
}
