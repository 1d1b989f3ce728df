// Master table assembly and schema normalization.
//
// Raw per-request batches (header → value maps) are concatenated into one
// typed master table. Normalization drops the columns nothing downstream
// reads, derives the integer start year from the season label, and
// canonicalizes team codes and season-type labels. Row counts are preserved
// exactly; an unexpected response shape fails the run rather than silently
// producing partial data.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::fetch::RawBatch;
use crate::seasons::{SeasonLabel, SeasonType};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{season} {season_type}: expected header `{header}` missing from response")]
    MissingHeader {
        season: String,
        season_type: &'static str,
        header: &'static str,
    },

    #[error("{season} {season_type}: row {row} has no value for `{header}`")]
    MissingValue {
        season: String,
        season_type: &'static str,
        row: usize,
        header: &'static str,
    },

    #[error("{season} {season_type}: row {row} column `{header}` is not numeric: {value}")]
    NonNumericValue {
        season: String,
        season_type: &'static str,
        row: usize,
        header: &'static str,
        value: String,
    },

    #[error("malformed season label `{label}`")]
    BadSeasonLabel { label: String },
}

// ---------------------------------------------------------------------------
// Column contract
// ---------------------------------------------------------------------------

/// Headers every batch must supply. Anything else in the response is dropped.
pub const EXPECTED_HEADERS: [&str; 20] = [
    "PLAYER_ID", "PLAYER", "TEAM", "GP", "MIN", "FGM", "FGA", "FG3M", "FG3A", "FTM", "FTA",
    "OREB", "DREB", "REB", "AST", "STL", "BLK", "TOV", "PF", "PTS",
];

/// Source columns deliberately discarded: the API's own rank ordering and
/// aggregate efficiency score, and the numeric team identifier.
pub const DISCARDED_HEADERS: [&str; 3] = ["RANK", "EFF", "TEAM_ID"];

/// Legacy team code → current code. One historical relocation is covered;
/// extending coverage is an edit to this table, not a redesign.
pub const TEAM_CODE_SUBSTITUTIONS: &[(&str, &str)] = &[("NOH", "NOP")];

/// Apply the substitution table. Idempotent: current codes pass through.
pub fn canonical_team_code(code: &str) -> &str {
    for (legacy, current) in TEAM_CODE_SUBSTITUTIONS {
        if code == *legacy {
            return current;
        }
    }
    code
}

// ---------------------------------------------------------------------------
// Counting stats
// ---------------------------------------------------------------------------

/// The sixteen counting-stat columns, in master-table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    Min,
    Fgm,
    Fga,
    Fg3m,
    Fg3a,
    Ftm,
    Fta,
    Oreb,
    Dreb,
    Reb,
    Ast,
    Stl,
    Blk,
    Tov,
    Pf,
    Pts,
}

impl Stat {
    pub const ALL: [Stat; 16] = [
        Stat::Min,
        Stat::Fgm,
        Stat::Fga,
        Stat::Fg3m,
        Stat::Fg3a,
        Stat::Ftm,
        Stat::Fta,
        Stat::Oreb,
        Stat::Dreb,
        Stat::Reb,
        Stat::Ast,
        Stat::Stl,
        Stat::Blk,
        Stat::Tov,
        Stat::Pf,
        Stat::Pts,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stat::Min => "MIN",
            Stat::Fgm => "FGM",
            Stat::Fga => "FGA",
            Stat::Fg3m => "FG3M",
            Stat::Fg3a => "FG3A",
            Stat::Ftm => "FTM",
            Stat::Fta => "FTA",
            Stat::Oreb => "OREB",
            Stat::Dreb => "DREB",
            Stat::Reb => "REB",
            Stat::Ast => "AST",
            Stat::Stl => "STL",
            Stat::Blk => "BLK",
            Stat::Tov => "TOV",
            Stat::Pf => "PF",
            Stat::Pts => "PTS",
        }
    }
}

/// One set of cumulative counting stats. The same carrier serves every
/// granularity in the pipeline: a player-season line, a league-season
/// aggregate, or a scaled (per-minute, per-48, per-100) rendition of either.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTotals {
    pub min: f64,
    pub fgm: f64,
    pub fga: f64,
    pub fg3m: f64,
    pub fg3a: f64,
    pub ftm: f64,
    pub fta: f64,
    pub oreb: f64,
    pub dreb: f64,
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
    pub pf: f64,
    pub pts: f64,
}

impl RawTotals {
    pub const ZERO: RawTotals = RawTotals {
        min: 0.0,
        fgm: 0.0,
        fga: 0.0,
        fg3m: 0.0,
        fg3a: 0.0,
        ftm: 0.0,
        fta: 0.0,
        oreb: 0.0,
        dreb: 0.0,
        reb: 0.0,
        ast: 0.0,
        stl: 0.0,
        blk: 0.0,
        tov: 0.0,
        pf: 0.0,
        pts: 0.0,
    };

    /// Build a value by evaluating `f` for every stat.
    pub fn from_fn(f: impl Fn(Stat) -> f64) -> RawTotals {
        RawTotals {
            min: f(Stat::Min),
            fgm: f(Stat::Fgm),
            fga: f(Stat::Fga),
            fg3m: f(Stat::Fg3m),
            fg3a: f(Stat::Fg3a),
            ftm: f(Stat::Ftm),
            fta: f(Stat::Fta),
            oreb: f(Stat::Oreb),
            dreb: f(Stat::Dreb),
            reb: f(Stat::Reb),
            ast: f(Stat::Ast),
            stl: f(Stat::Stl),
            blk: f(Stat::Blk),
            tov: f(Stat::Tov),
            pf: f(Stat::Pf),
            pts: f(Stat::Pts),
        }
    }

    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Min => self.min,
            Stat::Fgm => self.fgm,
            Stat::Fga => self.fga,
            Stat::Fg3m => self.fg3m,
            Stat::Fg3a => self.fg3a,
            Stat::Ftm => self.ftm,
            Stat::Fta => self.fta,
            Stat::Oreb => self.oreb,
            Stat::Dreb => self.dreb,
            Stat::Reb => self.reb,
            Stat::Ast => self.ast,
            Stat::Stl => self.stl,
            Stat::Blk => self.blk,
            Stat::Tov => self.tov,
            Stat::Pf => self.pf,
            Stat::Pts => self.pts,
        }
    }

    /// Element-wise sum.
    pub fn add(&self, other: &RawTotals) -> RawTotals {
        RawTotals::from_fn(|s| self.get(s) + other.get(s))
    }
}

// ---------------------------------------------------------------------------
// Master table row
// ---------------------------------------------------------------------------

/// One player's cumulative line for one (season, season-type) pair. Unique
/// per (player id, season label, season type): the fetch loop issues exactly
/// one request per pair, so concatenation cannot introduce duplicates.
#[derive(Debug, Clone)]
pub struct PlayerSeasonRow {
    pub player_id: i64,
    pub player: String,
    pub team: String,
    pub season: SeasonLabel,
    pub season_start_year: i32,
    pub season_type: SeasonType,
    pub gp: u32,
    pub totals: RawTotals,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Concatenate raw batches into the normalized master table.
///
/// Row-count preserving: the output length equals the sum of the batch row
/// counts. A missing expected header or a non-numeric stat value signals an
/// upstream contract change and fails the whole run.
pub fn normalize(batches: &[RawBatch]) -> Result<Vec<PlayerSeasonRow>, SchemaError> {
    let mut rows = Vec::with_capacity(batches.iter().map(|b| b.rows.len()).sum());

    for batch in batches {
        let season = batch.season.as_str();
        let season_type = batch.season_type.code();

        for header in EXPECTED_HEADERS {
            if !batch.headers.iter().any(|h| h == header) {
                return Err(SchemaError::MissingHeader {
                    season: season.to_string(),
                    season_type,
                    header,
                });
            }
        }

        let dropped: Vec<&str> = batch
            .headers
            .iter()
            .map(String::as_str)
            .filter(|h| !EXPECTED_HEADERS.contains(h))
            .collect();
        if !dropped.is_empty() {
            debug!("{season} {season_type}: dropping columns {dropped:?}");
        }

        let season_start_year =
            batch
                .season
                .start_year()
                .ok_or_else(|| SchemaError::BadSeasonLabel {
                    label: season.to_string(),
                })?;

        for (index, raw) in batch.rows.iter().enumerate() {
            let ctx = RowContext {
                season,
                season_type,
                index,
            };

            // Eager per-cell validation so a bad cell reports its location
            // instead of surfacing as NaN deep inside a view.
            for stat in Stat::ALL {
                num_field(raw, stat.name(), &ctx)?;
            }

            let team = string_field(raw, "TEAM", &ctx)?;
            rows.push(PlayerSeasonRow {
                player_id: int_field(raw, "PLAYER_ID", &ctx)?,
                player: string_field(raw, "PLAYER", &ctx)?,
                team: canonical_team_code(&team).to_string(),
                season: batch.season.clone(),
                season_start_year,
                season_type: batch.season_type,
                gp: int_field(raw, "GP", &ctx)? as u32,
                totals: RawTotals::from_fn(|stat| {
                    raw.get(stat.name()).and_then(Value::as_f64).unwrap_or(f64::NAN)
                }),
            });
        }
    }

    Ok(rows)
}

struct RowContext<'a> {
    season: &'a str,
    season_type: &'static str,
    index: usize,
}

fn field<'a>(
    raw: &'a serde_json::Map<String, Value>,
    header: &'static str,
    ctx: &RowContext<'_>,
) -> Result<&'a Value, SchemaError> {
    raw.get(header).ok_or(SchemaError::MissingValue {
        season: ctx.season.to_string(),
        season_type: ctx.season_type,
        row: ctx.index,
        header,
    })
}

fn num_field(
    raw: &serde_json::Map<String, Value>,
    header: &'static str,
    ctx: &RowContext<'_>,
) -> Result<f64, SchemaError> {
    let value = field(raw, header, ctx)?;
    value.as_f64().ok_or_else(|| SchemaError::NonNumericValue {
        season: ctx.season.to_string(),
        season_type: ctx.season_type,
        row: ctx.index,
        header,
        value: value.to_string(),
    })
}

fn int_field(
    raw: &serde_json::Map<String, Value>,
    header: &'static str,
    ctx: &RowContext<'_>,
) -> Result<i64, SchemaError> {
    Ok(num_field(raw, header, ctx)?.round() as i64)
}

fn string_field(
    raw: &serde_json::Map<String, Value>,
    header: &'static str,
    ctx: &RowContext<'_>,
) -> Result<String, SchemaError> {
    let value = field(raw, header, ctx)?;
    match value.as_str() {
        Some(s) => Ok(s.trim().to_string()),
        // Some historical rows carry numeric-looking team fields.
        None => Ok(value.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawBatch;
    use serde_json::json;

    /// Build a batch with the full expected header set and the given
    /// (player_id, player, team, stat-value) rows. All sixteen counting
    /// stats get `stat_value` and GP gets 10.
    fn batch_with_rows(
        season: &str,
        season_type: SeasonType,
        players: &[(i64, &str, &str, f64)],
    ) -> RawBatch {
        let mut headers: Vec<String> = EXPECTED_HEADERS.iter().map(|h| h.to_string()).collect();
        headers.extend(DISCARDED_HEADERS.iter().map(|h| h.to_string()));

        let rows = players
            .iter()
            .map(|(id, player, team, value)| {
                let mut row = serde_json::Map::new();
                row.insert("PLAYER_ID".into(), json!(id));
                row.insert("PLAYER".into(), json!(player));
                row.insert("TEAM".into(), json!(team));
                row.insert("GP".into(), json!(10));
                for stat in Stat::ALL {
                    row.insert(stat.name().into(), json!(value));
                }
                row.insert("RANK".into(), json!(1));
                row.insert("EFF".into(), json!(99.9));
                row.insert("TEAM_ID".into(), json!(1610612740_i64));
                row
            })
            .collect();

        RawBatch {
            season: SeasonLabel::from_raw(season),
            season_type,
            headers,
            rows,
        }
    }

    #[test]
    fn row_count_preserved_across_batches() {
        let batches = vec![
            batch_with_rows(
                "2012-13",
                SeasonType::Regular,
                &[(1, "A", "LAL", 100.0), (2, "B", "BOS", 200.0)],
            ),
            batch_with_rows("2012-13", SeasonType::Playoffs, &[(1, "A", "LAL", 50.0)]),
            batch_with_rows("2013-14", SeasonType::Regular, &[]),
        ];

        let rows = normalize(&batches).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn season_start_year_derived_from_label() {
        let batches = vec![batch_with_rows(
            "1999-00",
            SeasonType::Regular,
            &[(1, "A", "LAL", 1.0)],
        )];
        let rows = normalize(&batches).unwrap();
        assert_eq!(rows[0].season_start_year, 1999);
        assert_eq!(rows[0].season.as_str(), "1999-00");
    }

    #[test]
    fn legacy_team_code_canonicalized() {
        let batches = vec![batch_with_rows(
            "2009-10",
            SeasonType::Regular,
            &[(1, "A", "NOH", 1.0), (2, "B", "NOP", 1.0), (3, "C", "LAL", 1.0)],
        )];
        let rows = normalize(&batches).unwrap();
        assert_eq!(rows[0].team, "NOP");
        assert_eq!(rows[1].team, "NOP");
        assert_eq!(rows[2].team, "LAL");
    }

    #[test]
    fn canonical_team_code_is_idempotent() {
        assert_eq!(canonical_team_code("NOH"), "NOP");
        assert_eq!(canonical_team_code(canonical_team_code("NOH")), "NOP");
        assert_eq!(canonical_team_code("NOP"), "NOP");
        assert_eq!(canonical_team_code("GSW"), "GSW");
    }

    #[test]
    fn season_type_stored_as_canonical_code() {
        let batches = vec![
            batch_with_rows("2012-13", SeasonType::Regular, &[(1, "A", "LAL", 1.0)]),
            batch_with_rows("2012-13", SeasonType::Playoffs, &[(1, "A", "LAL", 1.0)]),
        ];
        let rows = normalize(&batches).unwrap();
        assert_eq!(rows[0].season_type.code(), "RS");
        assert_eq!(rows[1].season_type.code(), "Playoffs");
    }

    #[test]
    fn missing_expected_header_is_schema_error() {
        let mut batch = batch_with_rows("2012-13", SeasonType::Regular, &[(1, "A", "LAL", 1.0)]);
        batch.headers.retain(|h| h != "PTS");

        let err = normalize(&[batch]).unwrap_err();
        match err {
            SchemaError::MissingHeader {
                season,
                season_type,
                header,
            } => {
                assert_eq!(season, "2012-13");
                assert_eq!(season_type, "RS");
                assert_eq!(header, "PTS");
            }
            other => panic!("expected MissingHeader, got: {other}"),
        }
    }

    #[test]
    fn missing_cell_is_schema_error() {
        let mut batch = batch_with_rows("2012-13", SeasonType::Regular, &[(1, "A", "LAL", 1.0)]);
        batch.rows[0].remove("AST");

        let err = normalize(&[batch]).unwrap_err();
        match err {
            SchemaError::MissingValue { header, row, .. } => {
                assert_eq!(header, "AST");
                assert_eq!(row, 0);
            }
            other => panic!("expected MissingValue, got: {other}"),
        }
    }

    #[test]
    fn non_numeric_cell_is_schema_error() {
        let mut batch = batch_with_rows("2012-13", SeasonType::Regular, &[(1, "A", "LAL", 1.0)]);
        batch.rows[0].insert("PTS".into(), json!("lots"));

        let err = normalize(&[batch]).unwrap_err();
        match err {
            SchemaError::NonNumericValue { header, value, .. } => {
                assert_eq!(header, "PTS");
                assert!(value.contains("lots"));
            }
            other => panic!("expected NonNumericValue, got: {other}"),
        }
    }

    #[test]
    fn malformed_season_label_is_schema_error() {
        let batch = batch_with_rows("garbage", SeasonType::Regular, &[(1, "A", "LAL", 1.0)]);
        let err = normalize(&[batch]).unwrap_err();
        assert!(matches!(err, SchemaError::BadSeasonLabel { .. }));
    }

    #[test]
    fn discarded_columns_do_not_survive() {
        // The typed row has no rank/eff/team-id fields; this asserts the
        // expected and discarded sets stay disjoint as the contract evolves.
        for dropped in DISCARDED_HEADERS {
            assert!(!EXPECTED_HEADERS.contains(&dropped));
        }
    }

    #[test]
    fn totals_carry_the_stat_values() {
        let batches = vec![batch_with_rows(
            "2012-13",
            SeasonType::Regular,
            &[(7, "A", "LAL", 42.0)],
        )];
        let rows = normalize(&batches).unwrap();
        assert_eq!(rows[0].player_id, 7);
        assert_eq!(rows[0].gp, 10);
        for stat in Stat::ALL {
            assert_eq!(rows[0].totals.get(stat), 42.0);
        }
    }

    #[test]
    fn raw_totals_add_is_elementwise() {
        let a = RawTotals::from_fn(|_| 1.5);
        let b = RawTotals::from_fn(|s| if s == Stat::Pts { 10.0 } else { 0.5 });
        let sum = a.add(&b);
        assert_eq!(sum.pts, 11.5);
        assert_eq!(sum.min, 2.0);
        assert_eq!(sum.get(Stat::Ast), 2.0);
    }
}
