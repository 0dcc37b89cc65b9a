use thiserror::Error;

/// Recoverable problems met while building a rain report.
///
/// None of these abort an evaluation: a malformed record is dropped from its
/// bucket and a failed location is left out of the aggregate. They are
/// collected so callers can log or inspect them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("malformed forecast timestamp '{fx_time}': {source}")]
    MalformedTimestamp {
        fx_time: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to fetch forecast for location {location}: {reason}")]
    LocationFetchFailure { location: String, reason: String },
}
