//! HTTP client for the Eskom load shedding endpoints.
//!
//! Four endpoints speak JSON (`GetStatus`, `GetMunicipalities`,
//! `GetSurburbData`, `FindSuburbs`); the schedule endpoint renders HTML and
//! is scraped. Every request carries a millisecond cache-buster, and the
//! upstream API is flaky enough that each request is retried a couple of
//! times with a fixed wait.

use std::time::Duration;

use chrono::{Datelike, Utc};
use chrono_tz::Tz;
use reqwest::header;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Municipality, Province, Schedule, SearchSuburb, Stage, Suburb};
use crate::parse;
use crate::schedule::{self, StageObservation};

/// Base URL for the Eskom load shedding API.
const ESKOM_API_BASE: &str = "https://loadshedding.eskom.co.za/LoadShedding";

/// The schedule endpoint rejects non-browser user agents.
const SCHEDULE_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:69.0) Gecko/20100101 Firefox/69.0";

/// Retries per request; the API is flaky.
const RETRY_COUNT: u32 = 2;

/// Fixed wait between retries.
const RETRY_WAIT: Duration = Duration::from_secs(1);

/// Suburb listing page size when the request leaves it unset.
const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Search result cap when the request leaves it unset.
const DEFAULT_MAX_RESULTS: u32 = 50;

/// Stages fetched by [`Client::get_schedule`] when the request names none.
pub const DEFAULT_SCHEDULE_STAGES: [Stage; 4] = [
    Stage::Stage1,
    Stage::Stage2,
    Stage::Stage3,
    Stage::Stage4,
];

/// Client for the Eskom load shedding service.
///
/// All date and time handling is anchored to the timezone supplied at
/// construction; for the real upstream that is `Africa/Johannesburg`.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    host: String,
    timezone: Tz,
}

impl Client {
    /// Create a client against the production host.
    pub fn new(timezone: Tz) -> Self {
        Self::with_host(ESKOM_API_BASE, timezone)
    }

    /// Create a client with a custom host (for testing).
    pub fn with_host(host: &str, timezone: Tz) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.to_string(),
            timezone,
        }
    }

    /// Fetch the current national load shedding stage.
    pub async fn get_status(&self) -> Result<Stage> {
        let url = format!("{}/GetStatus", self.host);

        let body = self.get(url, None).await?.text().await?;

        Ok(Stage::from_status_code(&body))
    }

    /// List the municipalities of a province.
    pub async fn get_municipalities(&self, province: Province) -> Result<Vec<Municipality>> {
        let url = format!("{}/GetMunicipalities?Id={}", self.host, province.id());

        let municipalities = self.get(url, None).await?.json().await?;

        Ok(municipalities)
    }

    /// List every suburb of a municipality, walking the paged listing.
    pub async fn get_municipality_suburbs(
        &self,
        request: GetMunicipalitySuburbsRequest,
    ) -> Result<Vec<Suburb>> {
        let page_size = if request.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            request.page_size
        };

        // A zero-sized page returns only the total.
        let total = self.fetch_suburb_page(&request, 0, 1).await?.total;

        // Over-fetches one empty page when the total is an exact multiple
        // of the page size.
        let pages = (total / i64::from(page_size)) + 1;

        let mut suburbs = Vec::new();

        for page in 1..=pages {
            let mut response = self.fetch_suburb_page(&request, page_size, page).await?;
            suburbs.append(&mut response.results);
        }

        Ok(suburbs)
    }

    /// Search suburbs by free text across all municipalities.
    pub async fn search_suburbs(
        &self,
        request: SearchSuburbsRequest,
    ) -> Result<Vec<SearchSuburb>> {
        if request.search.is_empty() {
            return Err(Error::EmptySearch);
        }

        let max_results = if request.max_results == 0 {
            DEFAULT_MAX_RESULTS
        } else {
            request.max_results
        };

        let url = format!(
            "{}/FindSuburbs?maxResults={}&searchText={}",
            self.host,
            max_results,
            urlencoding::encode(&request.search)
        );

        let suburbs = self.get(url, None).await?.json().await?;

        Ok(suburbs)
    }

    /// Fetch and reconcile the outage schedule for a suburb.
    ///
    /// The schedule page is fetched once per requested stage (sequentially)
    /// and the scraped per-day fragments are merged into one normalized
    /// [`Schedule`]: one entry per date, duplicate windows collapsed onto
    /// the highest stage, everything sorted. Any parse failure aborts the
    /// whole call; a partial schedule is never returned.
    pub async fn get_schedule(&self, request: GetScheduleRequest) -> Result<Schedule> {
        let stages = if request.stages.is_empty() {
            DEFAULT_SCHEDULE_STAGES.to_vec()
        } else {
            request.stages
        };

        // Day tokens never carry a year; resolve them against the wall
        // clock at request start.
        let year = Utc::now().with_timezone(&self.timezone).year();

        let mut observations: Vec<StageObservation> = Vec::new();

        for stage in stages {
            let url = format!(
                "{}/GetScheduleM/{}/{}/_/1",
                self.host,
                urlencoding::encode(&request.suburb_id),
                stage.schedule_id()
            );

            let html = self
                .get(url, Some(SCHEDULE_USER_AGENT))
                .await?
                .text()
                .await?;

            observations.extend(parse::extract_day_fragments(&html, stage));
        }

        debug!(
            suburb_id = %request.suburb_id,
            fragments = observations.len(),
            "scraped schedule fragments"
        );

        schedule::reconcile(year, self.timezone, &observations)
    }

    async fn fetch_suburb_page(
        &self,
        request: &GetMunicipalitySuburbsRequest,
        page_size: u32,
        page: i64,
    ) -> Result<SuburbPage> {
        // "Surburb" is the upstream's spelling, not ours.
        let url = format!(
            "{}/GetSurburbData?pageSize={}&pageNum={}&searchTerm={}&id={}",
            self.host,
            page_size,
            page,
            urlencoding::encode(&request.search),
            urlencoding::encode(&request.municipality_id)
        );

        let suburb_page = self.get(url, None).await?.json().await?;

        Ok(suburb_page)
    }

    /// Issue a GET with the cache-buster and retry policy applied.
    async fn get(&self, url: String, user_agent: Option<&str>) -> Result<reqwest::Response> {
        let mut attempt = 0;

        loop {
            let mut request = self
                .http
                .get(&url)
                .header(header::ACCEPT, "application/json")
                .query(&[("_", Utc::now().timestamp_millis())]);

            if let Some(agent) = user_agent {
                request = request.header(header::USER_AGENT, agent);
            }

            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => return Ok(response),
                Err(err) if attempt < RETRY_COUNT => {
                    attempt += 1;
                    debug!(url = %url, attempt, error = %err, "request failed, retrying");
                    tokio::time::sleep(RETRY_WAIT).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Parameters for [`Client::get_municipality_suburbs`].
#[derive(Debug, Clone, Default)]
pub struct GetMunicipalitySuburbsRequest {
    /// Municipality whose suburbs to list.
    pub municipality_id: String,

    /// Optional name filter; empty lists everything.
    pub search: String,

    /// Page size for the upstream listing; 0 uses the default of 1000.
    pub page_size: u32,
}

/// Parameters for [`Client::search_suburbs`].
#[derive(Debug, Clone, Default)]
pub struct SearchSuburbsRequest {
    /// Free-text search term; must not be empty.
    pub search: String,

    /// Result cap; 0 uses the default of 50.
    pub max_results: u32,
}

/// Parameters for [`Client::get_schedule`].
#[derive(Debug, Clone, Default)]
pub struct GetScheduleRequest {
    /// Stages to fetch; empty uses [`DEFAULT_SCHEDULE_STAGES`].
    pub stages: Vec<Stage>,

    /// Suburb whose schedule to fetch.
    pub suburb_id: String,
}

/// One page of the suburb listing.
#[derive(Debug, Clone, Default, Deserialize)]
struct SuburbPage {
    #[serde(default, rename = "Total")]
    total: i64,

    #[serde(default, rename = "Results")]
    results: Vec<Suburb>,
}
