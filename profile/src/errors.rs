use riot_client::ApiError;

/// Failures that end an aggregation before any enrichment runs.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Invalid Riot ID. Please use the format Name#TAG.")]
    MalformedRiotId,

    #[error("Invalid Riot ID. Name and Tagline cannot be empty.")]
    EmptyRiotIdPart,

    #[error("Summoner '{riot_id}' not found.")]
    NotFound { riot_id: String },

    #[error("An error occurred while fetching data: {0}")]
    Upstream(#[from] ApiError),
}

impl ProfileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProfileError::NotFound { .. })
    }
}
