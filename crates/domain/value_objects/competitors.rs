use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::domain::entities::competitors::{CompetitorEntity, InsertCompetitorEntity};

pub const DEFAULT_CRAWL_FREQUENCY_MINUTES: i32 = 1440;
pub const MIN_CRAWL_FREQUENCY_MINUTES: i32 = 60;
pub const MAX_CRAWL_FREQUENCY_MINUTES: i32 = 10080;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCompetitorModel {
    pub business_id: Uuid,
    pub name: String,
    pub url: String,
    pub crawl_frequency_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorDto {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub url: String,
    pub is_active: bool,
    pub crawl_frequency_minutes: i32,
    pub last_crawled_at: Option<DateTime<Utc>>,
}

impl From<CompetitorEntity> for CompetitorDto {
    fn from(entity: CompetitorEntity) -> Self {
        Self {
            id: entity.id,
            business_id: entity.business_id,
            name: entity.name,
            url: entity.url,
            is_active: entity.is_active,
            crawl_frequency_minutes: entity.crawl_frequency_minutes,
            last_crawled_at: entity.last_crawled_at,
        }
    }
}

/// Why a competitor payload was rejected before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompetitorValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("url is not a valid absolute URL")]
    InvalidUrl,
    #[error("url must use http or https")]
    UnsupportedScheme,
    #[error(
        "crawlFrequencyMinutes must be between {} and {}",
        MIN_CRAWL_FREQUENCY_MINUTES,
        MAX_CRAWL_FREQUENCY_MINUTES
    )]
    FrequencyOutOfRange,
}

impl AddCompetitorModel {
    /// Normalizes the payload into a new, never-crawled competitor row.
    pub fn to_entity(
        &self,
        now: DateTime<Utc>,
    ) -> Result<InsertCompetitorEntity, CompetitorValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CompetitorValidationError::EmptyName);
        }

        let url = Url::parse(self.url.trim()).map_err(|_| CompetitorValidationError::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CompetitorValidationError::UnsupportedScheme);
        }

        let crawl_frequency_minutes = self
            .crawl_frequency_minutes
            .unwrap_or(DEFAULT_CRAWL_FREQUENCY_MINUTES);
        if !(MIN_CRAWL_FREQUENCY_MINUTES..=MAX_CRAWL_FREQUENCY_MINUTES)
            .contains(&crawl_frequency_minutes)
        {
            return Err(CompetitorValidationError::FrequencyOutOfRange);
        }

        Ok(InsertCompetitorEntity {
            business_id: self.business_id,
            name: name.to_string(),
            url: url.to_string(),
            is_active: true,
            crawl_frequency_minutes,
            last_crawled_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}
