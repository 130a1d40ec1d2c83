//! Query command implementation
//!
//! Maps tracked entity search criteria against a metadata catalog and prints
//! the resolved query parameters.

use super::read_json;
use crate::adapters::access::DefaultAccessManager;
use crate::config::load_config;
use crate::core::query::{CriteriaMapper, TrackedEntityCriteria};
use crate::domain::metadata::{CatalogDocument, MetadataCatalog};
use crate::domain::IntakeError;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Metadata catalog (JSON)
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Search criteria (JSON)
    #[arg(short, long)]
    pub criteria: PathBuf,

    /// Username of the searching user
    #[arg(short, long)]
    pub user: Option<String>,
}

impl QueryArgs {
    /// Execute the query command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(criteria = %self.criteria.display(), "Mapping query criteria");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let catalog: MetadataCatalog = read_json::<CatalogDocument>(&self.metadata)?.into();
        let criteria: TrackedEntityCriteria = read_json(&self.criteria)?;

        let user = match &self.user {
            Some(username) => match catalog.user_by_username(username) {
                Some(user) => Some(user.clone()),
                None => {
                    eprintln!("Unknown user: {username}");
                    return Ok(2);
                }
            },
            None => None,
        };

        let catalog = Arc::new(catalog);
        let mapper = CriteriaMapper::new(
            Arc::clone(&catalog),
            Arc::new(DefaultAccessManager::new(catalog)),
        )
        .with_limits(config.query.paging_limits());

        match mapper.map(&criteria, user.as_ref()) {
            Ok(params) => {
                println!("{}", serde_json::to_string_pretty(&params)?);
                Ok(0)
            }
            Err(IntakeError::IllegalQuery(message)) => {
                eprintln!("Illegal query: {message}");
                Ok(1)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_is_config_error() {
        let args = QueryArgs {
            metadata: PathBuf::from("metadata.json"),
            criteria: PathBuf::from("criteria.json"),
            user: None,
        };

        assert_eq!(args.execute("does-not-exist.toml").await.unwrap(), 2);
    }
}
