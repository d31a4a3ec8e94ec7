//! The report service: cache lookup, single-flight generation and
//! follow-up answers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use health_report_ai::{AiError, CompletionClient, CompletionRequest, providers};
use health_report_charts::extract_charts;
use health_report_models::ReportRecord;

use crate::cache::{DEFAULT_CACHE_CAPACITY, MemoryReportCache, ReportCache};
use crate::followup::answer_question;
use crate::id::report_id;
use crate::prompt::build_report_prompt;
use crate::{InputField, ReportError};

/// Default model for report generation.
pub const DEFAULT_RESEARCH_MODEL: &str = "sonar-deep-research";

/// Default model for follow-up answers.
pub const DEFAULT_FOLLOW_UP_MODEL: &str = "sonar";

/// Report service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Model used to generate reports.
    pub research_model: String,
    /// Model used to answer follow-up questions.
    pub follow_up_model: String,
    /// Maximum number of cached reports.
    pub cache_capacity: usize,
    /// How long a cached report stays valid; forever when `None`.
    pub cache_ttl: Option<Duration>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            research_model: DEFAULT_RESEARCH_MODEL.to_string(),
            follow_up_model: DEFAULT_FOLLOW_UP_MODEL.to_string(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
        }
    }
}

impl ReportConfig {
    /// Reads `AI_RESEARCH_MODEL`, `AI_FOLLOW_UP_MODEL`,
    /// `REPORT_CACHE_CAPACITY` and `REPORT_CACHE_TTL_SECS`, falling back to
    /// the defaults for unset or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            research_model: std::env::var("AI_RESEARCH_MODEL")
                .unwrap_or(defaults.research_model),
            follow_up_model: std::env::var("AI_FOLLOW_UP_MODEL")
                .unwrap_or(defaults.follow_up_model),
            cache_capacity: std::env::var("REPORT_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            cache_ttl: std::env::var("REPORT_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }
}

/// Generates a report for `area` with `model`, dated `date`.
///
/// A failed completion yields a record whose markdown and follow-up text
/// are the `"Error: ..."` description and whose chart list is empty.
pub async fn assemble_report(
    client: &CompletionClient,
    model: &str,
    area: &str,
    date: NaiveDate,
) -> ReportRecord {
    log::info!("Starting health report for area: {area} using {model}");
    let report_id = report_id(area);

    let prompt = build_report_prompt(area, date);
    log::info!("Report prompt length: {} chars", prompt.len());

    match client.complete(&CompletionRequest::new(prompt, model)).await {
        Ok(markdown) => {
            let charts = extract_charts(&markdown);
            log::info!(
                "Finished health report for area: {area} ({} charts)",
                charts.len()
            );
            ReportRecord {
                report_id,
                area_name: area.to_string(),
                full_text_for_follow_up: markdown.clone(),
                full_report_markdown: markdown,
                charts,
            }
        }
        Err(e) => {
            log::error!("Report generation failed for {area}: {e}");
            let text = e.to_report_text();
            ReportRecord {
                report_id,
                area_name: area.to_string(),
                full_text_for_follow_up: text.clone(),
                full_report_markdown: text,
                charts: Vec::new(),
            }
        }
    }
}

type InFlight = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Generates, caches and answers questions about reports.
pub struct ReportService {
    client: CompletionClient,
    cache: Arc<dyn ReportCache>,
    config: ReportConfig,
    in_flight: InFlight,
}

impl ReportService {
    /// Creates a service from its parts.
    #[must_use]
    pub fn new(client: CompletionClient, cache: Arc<dyn ReportCache>, config: ReportConfig) -> Self {
        Self {
            client,
            cache,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a service from environment configuration, with an in-memory
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the completion provider cannot be created.
    pub fn from_env() -> Result<Self, AiError> {
        let provider = providers::create_provider_from_env()?;
        let config = ReportConfig::from_env();
        log::info!(
            "Report models: research={}, follow-up={}; cache capacity {}",
            config.research_model,
            config.follow_up_model,
            config.cache_capacity
        );
        let cache = Arc::new(MemoryReportCache::new(
            config.cache_capacity,
            config.cache_ttl,
        ));
        Ok(Self::new(CompletionClient::new(provider), cache, config))
    }

    /// Returns the report for `area`, generating it unless cached.
    ///
    /// Concurrent calls for the same area share one generation. Failed
    /// records are returned but not cached, so a later call retries.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidInput`] if `area` is blank.
    pub async fn generate_report(&self, area: &str) -> Result<Arc<ReportRecord>, ReportError> {
        let area = area.trim();
        if area.is_empty() {
            return Err(ReportError::InvalidInput {
                field: InputField::Area,
            });
        }

        let id = report_id(area);
        if let Some(cached) = self.cache.get(&id) {
            log::info!("Returning cached report for area: {area}, ID: {id}");
            return Ok(cached);
        }

        let gate = self.acquire_gate(&id);
        let _generating = gate.lock().await;
        if let Some(cached) = self.cache.get(&id) {
            log::info!("Report for area: {area}, ID: {id} was generated concurrently");
            return Ok(cached);
        }

        let record = Arc::new(
            assemble_report(
                &self.client,
                &self.config.research_model,
                area,
                Utc::now().date_naive(),
            )
            .await,
        );
        if record.is_error() {
            log::warn!("Not caching failed report for area: {area}, ID: {id}");
        } else {
            self.cache.put(Arc::clone(&record));
        }

        Ok(record)
    }

    /// Answers `question` about report `report_id`.
    ///
    /// Uses `report_context` when it is given and not blank, otherwise the
    /// cached report's follow-up text.
    ///
    /// # Errors
    ///
    /// * [`ReportError::InvalidInput`] if `question` is blank.
    /// * [`ReportError::MissingContext`] if no context was given and the
    ///   report is not cached.
    pub async fn answer_follow_up(
        &self,
        report_id: &str,
        question: &str,
        report_context: Option<&str>,
    ) -> Result<String, ReportError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ReportError::InvalidInput {
                field: InputField::Question,
            });
        }

        let context = match report_context.filter(|c| !c.trim().is_empty()) {
            Some(context) => context.to_string(),
            None => {
                let cached = self
                    .cache
                    .get(report_id)
                    .filter(|r| !r.full_text_for_follow_up.is_empty())
                    .ok_or_else(|| ReportError::MissingContext {
                        report_id: report_id.to_string(),
                    })?;
                log::info!("Using cached report context for report ID: {report_id}");
                cached.full_text_for_follow_up.clone()
            }
        };

        log::info!("Received follow-up question for report ID: {report_id}");
        Ok(answer_question(
            &self.client,
            &self.config.follow_up_model,
            question,
            &context,
        )
        .await)
    }

    fn in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire_gate<'a>(&'a self, id: &'a str) -> InFlightGate<'a> {
        let gate = Arc::clone(self.in_flight().entry(id.to_string()).or_default());
        InFlightGate {
            service: self,
            id,
            gate,
        }
    }
}

/// A caller's hold on the single-flight gate for one report id.
///
/// Dropping it, whether the generation finished or its future was
/// cancelled, removes the map entry once no other caller holds the gate.
struct InFlightGate<'a> {
    service: &'a ReportService,
    id: &'a str,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl InFlightGate<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for InFlightGate<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.service.in_flight();
        // One reference is held by the map and one by this gate; anything
        // more is a caller still waiting on it.
        if Arc::strong_count(&self.gate) <= 2 {
            in_flight.remove(self.id);
        }
    }
}
