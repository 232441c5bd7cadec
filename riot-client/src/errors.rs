use std::fmt;

/// Result type alias for upstream API operations
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// The upstream endpoint class a request belongs to. Used for logging,
/// metric tags and cache selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Account,
    Summoner,
    SummonerMe,
    LeagueEntries,
    LeagueEntriesBySummoner,
    MatchIds,
    MatchDetails,
}

impl Endpoint {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Account => "account",
            Endpoint::Summoner => "summoner",
            Endpoint::SummonerMe => "summoner_me",
            Endpoint::LeagueEntries => "league_entries",
            Endpoint::LeagueEntriesBySummoner => "league_entries_by_summoner",
            Endpoint::MatchIds => "match_ids",
            Endpoint::MatchDetails => "match_details",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure outcomes of a single logical upstream request (after retries).
///
/// "Not found" is deliberately absent: a 404 is returned as `Ok(None)`.
/// Clone is required because a failed computation is shared with every
/// caller coalesced onto the same cache key.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: Endpoint },

    #[error("{endpoint} connection failure: {message}")]
    ConnectionFailure { endpoint: Endpoint, message: String },

    #[error("{endpoint} request was rate limited")]
    RateLimited { endpoint: Endpoint },

    #[error("{endpoint} request failed with server status {status}")]
    ServerFault {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("API request ({endpoint}) failed with status code: {status}; Body: {body}")]
    ClientFault {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("failed to parse API response for {endpoint}: {message}")]
    ParseFailure { endpoint: Endpoint, message: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("invalid credentials header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Timeout { .. }
                | ApiError::ConnectionFailure { .. }
                | ApiError::RateLimited { .. }
                | ApiError::ServerFault { .. }
        )
    }

    /// Short stable label for metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Timeout { .. } => "timeout",
            ApiError::ConnectionFailure { .. } => "connection_failure",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::ServerFault { .. } => "server_fault",
            ApiError::ClientFault { .. } => "client_fault",
            ApiError::ParseFailure { .. } => "parse_failure",
            ApiError::InvalidUrl(_) => "invalid_url",
            ApiError::InvalidHeader(_) => "invalid_header",
        }
    }
}

/// Errors raised while constructing the client.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
