use anyhow::Result;
use chrono::{NaiveTime, Utc};
use tracing::{info, warn};

use crate::{
    config::RainReportConfig,
    error::ForecastError,
    forecast::{REPORT_ZONE, aggregate, decide_message, evaluate_location},
    model::{RainVerdict, Verdict},
    provider::{ForecastProvider, provider_from_config},
};

/// Result of one rain query across all configured locations.
#[derive(Debug, Clone, PartialEq)]
pub struct RainReportOutcome {
    pub verdict: Verdict,
    pub aggregate: RainVerdict,
    /// Verdict of every location whose forecast was fetched, in query order.
    pub per_location: Vec<(String, RainVerdict)>,
    pub diagnostics: Vec<ForecastError>,
}

impl RainReportOutcome {
    /// Number of locations whose forecast was fetched and evaluated.
    pub fn evaluated(&self) -> usize {
        self.per_location.len()
    }

    /// Locations expecting rain in the morning.
    pub fn rainy_mornings(&self) -> impl Iterator<Item = &str> + '_ {
        self.per_location
            .iter()
            .filter(|(_, v)| v.morning)
            .map(|(location, _)| location.as_str())
    }

    /// Locations expecting rain in the afternoon.
    pub fn rainy_afternoons(&self) -> impl Iterator<Item = &str> + '_ {
        self.per_location
            .iter()
            .filter(|(_, v)| v.afternoon)
            .map(|(location, _)| location.as_str())
    }
}

/// Fetches each location's forecast and folds them into one verdict.
#[derive(Debug)]
pub struct RainReport {
    provider: Box<dyn ForecastProvider>,
    locations: Vec<String>,
}

impl RainReport {
    pub fn new(provider: Box<dyn ForecastProvider>, locations: Vec<String>) -> Self {
        Self { provider, locations }
    }

    pub fn from_config(config: &RainReportConfig) -> Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider, config.location_list.clone()))
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Run the report for wall clock `now_local` in the report zone.
    ///
    /// A location whose fetch fails is left out of the aggregate and recorded
    /// as a diagnostic.
    pub async fn run(&self, now_local: NaiveTime) -> RainReportOutcome {
        let mut per_location = Vec::with_capacity(self.locations.len());
        let mut diagnostics = Vec::new();

        for location in &self.locations {
            let payload = match self.provider.hourly_forecast(location).await {
                Ok(payload) => payload,
                Err(err) => {
                    let failure = ForecastError::LocationFetchFailure {
                        location: location.clone(),
                        reason: format!("{err:#}"),
                    };
                    warn!(error = %failure, "skipping location");
                    diagnostics.push(failure);
                    continue;
                }
            };

            let evaluation = evaluate_location(&payload);
            for dropped in &evaluation.diagnostics {
                warn!(location = %location, error = %dropped, "dropped forecast record");
            }
            if evaluation.verdict.morning {
                info!(location = %location, "rain expected in the morning");
            }
            if evaluation.verdict.afternoon {
                info!(location = %location, "rain expected in the afternoon");
            }

            diagnostics.extend(evaluation.diagnostics);
            per_location.push((location.clone(), evaluation.verdict));
        }

        let aggregate = aggregate(per_location.iter().map(|(_, verdict)| *verdict));
        let verdict = decide_message(aggregate, now_local);

        RainReportOutcome {
            verdict,
            aggregate,
            per_location,
            diagnostics,
        }
    }
}

/// Current wall clock in the report zone.
pub fn now_in_report_zone() -> NaiveTime {
    Utc::now().with_timezone(&REPORT_ZONE).time()
}
