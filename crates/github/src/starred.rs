//! Wire format of `GET /users/{user}/starred`.

use serde::Deserialize;
use tracker::{RepositoryName, RepositoryRecord};

/// One element of the starred-repositories JSON array.
///
/// GitHub returns many more fields; only these are decoded.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StarredRepository {
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
}

impl StarredRepository {
    /// Converts into the domain record; `None` if `full_name` is empty.
    pub(crate) fn into_record(self) -> Option<RepositoryRecord> {
        Some(RepositoryRecord {
            full_name: RepositoryName::new(self.full_name)?,
            name: self.name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            html_url: self.html_url,
            forks_count: self.forks_count,
            stargazers_count: self.stargazers_count,
            watchers_count: self.watchers_count,
        })
    }
}

/// Decodes one listing page body into domain records.
pub(crate) fn parse_starred_page(body: &str) -> Result<Vec<RepositoryRecord>, String> {
    let page: Vec<StarredRepository> = serde_json::from_str(body).map_err(|e| e.to_string())?;
    page.into_iter()
        .map(|repo| repo.into_record().ok_or_else(|| "repository with empty full_name".to_string()))
        .collect()
}
