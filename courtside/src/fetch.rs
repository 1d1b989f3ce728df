// Rate-limited client for the league-leaders endpoint.
//
// One GET per (season, season-type) pair, fixed to category = points, scope =
// season, mode = season totals. The grid is walked in a stable order
// (ascending season, regular season before playoffs) with a uniform-random
// courtesy sleep after every pair. Failures retry with exponential backoff;
// exhausting the retries aborts the run, because downstream aggregation
// assumes full coverage of the requested range.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::seasons::{SeasonLabel, SeasonType};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for {season} {season_type} failed: {source}")]
    Request {
        season: String,
        season_type: &'static str,
        source: reqwest::Error,
    },

    #[error("server returned {status} for {season} {season_type}")]
    Status {
        season: String,
        season_type: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed response body for {season} {season_type}: {source}")]
    Body {
        season: String,
        season_type: &'static str,
        source: serde_json::Error,
    },

    #[error("invalid request header `{name}` in fetch config")]
    InvalidHeader { name: String },

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// JSON envelope returned by the leaderboard endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "resultSet")]
    result_set: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

/// One fetched (season, season-type) batch. Each row is the header → value
/// mapping for one player line, untyped until normalization.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub season: SeasonLabel,
    pub season_type: SeasonType,
    pub headers: Vec<String>,
    pub rows: Vec<serde_json::Map<String, Value>>,
}

/// Zip an envelope's headers against each row. Rows shorter than the header
/// list simply lack those keys; normalization reports them per cell.
fn envelope_to_rows(envelope: Envelope) -> (Vec<String>, Vec<serde_json::Map<String, Value>>) {
    let headers = envelope.result_set.headers;
    let rows = envelope
        .result_set
        .row_set
        .into_iter()
        .map(|row| headers.iter().cloned().zip(row).collect())
        .collect();
    (headers, rows)
}

// ---------------------------------------------------------------------------
// LeaderboardClient
// ---------------------------------------------------------------------------

pub struct LeaderboardClient {
    http: reqwest::Client,
    config: FetchConfig,
}

impl LeaderboardClient {
    /// Build a client with the configured timeout and browser-mimicking
    /// default headers.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.request_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                FetchError::InvalidHeader { name: name.clone() }
            })?;
            let value = HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
                name: name.to_string(),
            })?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { http, config })
    }

    /// Perform one request for a (season, season-type) pair and decode the
    /// envelope into per-row header → value maps.
    pub async fn fetch_pair(
        &self,
        season: &SeasonLabel,
        season_type: SeasonType,
    ) -> Result<RawBatch, FetchError> {
        let request_err = |source| FetchError::Request {
            season: season.as_str().to_string(),
            season_type: season_type.code(),
            source,
        };

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("LeagueID", self.config.league_id.as_str()),
                ("PerMode", "Totals"),
                ("Scope", "S"),
                ("Season", season.as_str()),
                ("SeasonType", season_type.api_value()),
                ("StatCategory", "PTS"),
            ])
            .send()
            .await
            .map_err(request_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                season: season.as_str().to_string(),
                season_type: season_type.code(),
                status,
            });
        }

        let body = response.text().await.map_err(request_err)?;
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|source| FetchError::Body {
                season: season.as_str().to_string(),
                season_type: season_type.code(),
                source,
            })?;

        let (headers, rows) = envelope_to_rows(envelope);
        debug!(
            rows = rows.len(),
            "decoded {} {}",
            season.as_str(),
            season_type.code()
        );

        Ok(RawBatch {
            season: season.clone(),
            season_type,
            headers,
            rows,
        })
    }

    /// Walk the full season × season-type grid in stable order, retrying each
    /// pair per the configured policy and sleeping the courtesy delay after
    /// every pair.
    pub async fn fetch_all(&self, seasons: &[SeasonLabel]) -> Result<Vec<RawBatch>, FetchError> {
        let mut batches = Vec::with_capacity(seasons.len() * SeasonType::ALL.len());

        for season in seasons {
            for season_type in SeasonType::ALL {
                let batch = self.fetch_pair_with_retry(season, season_type).await?;
                info!(
                    rows = batch.rows.len(),
                    "fetched {} {}",
                    season.as_str(),
                    season_type.code()
                );
                batches.push(batch);
                self.courtesy_sleep().await;
            }
            info!("finished season {}", season.as_str());
        }

        Ok(batches)
    }

    async fn fetch_pair_with_retry(
        &self,
        season: &SeasonLabel,
        season_type: SeasonType,
    ) -> Result<RawBatch, FetchError> {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.fetch_pair(season, season_type).await {
                Ok(batch) => {
                    if attempt > 1 {
                        debug!(
                            "{} {} succeeded on attempt {attempt}",
                            season.as_str(),
                            season_type.code()
                        );
                    }
                    return Ok(batch);
                }
                Err(e) if attempt < retry.max_attempts => {
                    let delay = retry.delay_for_attempt(attempt - 1);
                    warn!(
                        "attempt {attempt}/{} failed: {e}. Retrying in {delay:?}",
                        retry.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fixed courtesy delay between requests, drawn uniformly at random from
    /// the configured interval.
    async fn courtesy_sleep(&self) {
        let (lo, hi) = (self.config.delay_min_secs, self.config.delay_max_secs);
        let secs = if hi > lo {
            rand::thread_rng().gen_range(lo..hi)
        } else {
            lo
        };
        if secs > 0.0 {
            debug!("waiting {secs:.1}s before next request");
            tokio::time::sleep(Duration::from_secs_f64(secs)).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
