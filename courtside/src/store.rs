// CSV persistence of the normalized master table.
//
// The written file is the pipeline's sole durability point: it is produced
// after the fetch phase, read back for the analysis phase, and removed at the
// end of a successful full run. There is no incremental checkpointing.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::seasons::{SeasonLabel, SeasonType};
use crate::table::{PlayerSeasonRow, RawTotals};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("unrecognized season type `{value}` in {path}")]
    BadSeasonType { path: String, value: String },
}

// ---------------------------------------------------------------------------
// CSV row shape
// ---------------------------------------------------------------------------

/// On-disk row. Column names match the upstream stat names so the file reads
/// naturally in spreadsheet tools.
#[derive(Debug, Serialize, Deserialize)]
#[allow(non_snake_case)]
struct CsvRow {
    PLAYER_ID: i64,
    PLAYER: String,
    TEAM: String,
    Year: String,
    Season: String,
    season_start_year: i32,
    GP: u32,
    MIN: f64,
    FGM: f64,
    FGA: f64,
    FG3M: f64,
    FG3A: f64,
    FTM: f64,
    FTA: f64,
    OREB: f64,
    DREB: f64,
    REB: f64,
    AST: f64,
    STL: f64,
    BLK: f64,
    TOV: f64,
    PF: f64,
    PTS: f64,
}

impl CsvRow {
    fn from_row(row: &PlayerSeasonRow) -> CsvRow {
        let t = &row.totals;
        CsvRow {
            PLAYER_ID: row.player_id,
            PLAYER: row.player.clone(),
            TEAM: row.team.clone(),
            Year: row.season.as_str().to_string(),
            Season: row.season_type.code().to_string(),
            season_start_year: row.season_start_year,
            GP: row.gp,
            MIN: t.min,
            FGM: t.fgm,
            FGA: t.fga,
            FG3M: t.fg3m,
            FG3A: t.fg3a,
            FTM: t.ftm,
            FTA: t.fta,
            OREB: t.oreb,
            DREB: t.dreb,
            REB: t.reb,
            AST: t.ast,
            STL: t.stl,
            BLK: t.blk,
            TOV: t.tov,
            PF: t.pf,
            PTS: t.pts,
        }
    }

    fn into_row(self, path: &str) -> Result<PlayerSeasonRow, StoreError> {
        let season_type =
            SeasonType::from_source_label(&self.Season).ok_or_else(|| StoreError::BadSeasonType {
                path: path.to_string(),
                value: self.Season.clone(),
            })?;
        Ok(PlayerSeasonRow {
            player_id: self.PLAYER_ID,
            player: self.PLAYER,
            team: self.TEAM,
            season: SeasonLabel::from_raw(self.Year),
            season_start_year: self.season_start_year,
            season_type,
            gp: self.GP,
            totals: RawTotals {
                min: self.MIN,
                fgm: self.FGM,
                fga: self.FGA,
                fg3m: self.FG3M,
                fg3a: self.FG3A,
                ftm: self.FTM,
                fta: self.FTA,
                oreb: self.OREB,
                dreb: self.DREB,
                reb: self.REB,
                ast: self.AST,
                stl: self.STL,
                blk: self.BLK,
                tov: self.TOV,
                pf: self.PF,
                pts: self.PTS,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Writer/reader primitives (enable testing without temp files)
// ---------------------------------------------------------------------------

fn write_to<W: Write>(wtr: W, rows: &[PlayerSeasonRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(wtr);
    for row in rows {
        writer.serialize(CsvRow::from_row(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn read_from<R: Read>(rdr: R, path: &str) -> Result<Vec<PlayerSeasonRow>, StoreError> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let raw = result.map_err(|e| StoreError::Csv {
            path: path.to_string(),
            source: e,
        })?;
        rows.push(raw.into_row(path)?);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Path-based API
// ---------------------------------------------------------------------------

/// Write the master table, creating parent directories as needed.
pub fn write_master(path: &str, rows: &[PlayerSeasonRow]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_string(),
        source,
    };

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = std::fs::File::create(path).map_err(io_err)?;
    write_to(file, rows).map_err(|e| StoreError::Csv {
        path: path.to_string(),
        source: e,
    })?;
    info!(rows = rows.len(), "wrote master table to {path}");
    Ok(())
}

/// Read the master table back for the analysis phase.
pub fn read_master(path: &str) -> Result<Vec<PlayerSeasonRow>, StoreError> {
    let file = std::fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_string(),
        source,
    })?;
    read_from(file, path)
}

/// Remove the master table at the end of a full run.
pub fn remove_master(path: &str) -> Result<(), StoreError> {
    std::fs::remove_file(path).map_err(|source| StoreError::Io {
        path: path.to_string(),
        source,
    })?;
    info!("removed master table {path}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
