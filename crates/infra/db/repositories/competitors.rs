use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    dsl::sql,
    prelude::*,
    sql_types::{Bool, Timestamptz},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::{
            businesses::BusinessEntity,
            competitors::{CompetitorEntity, InsertCompetitorEntity},
        },
        repositories::competitors::CompetitorRepository,
        value_objects::crawl_scheduling::DueCandidate,
    },
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{businesses, competitors, crawl_queue},
    },
};

pub struct CompetitorPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CompetitorPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CompetitorRepository for CompetitorPostgres {
    async fn list_due_candidates(
        &self,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<DueCandidate>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let overdue = sql::<Bool>(
            "(competitors.last_crawled_at IS NULL OR competitors.last_crawled_at \
             + make_interval(mins => competitors.crawl_frequency_minutes) < ",
        )
        .bind::<Timestamptz, _>(now)
        .sql(")");

        let results = competitors::table
            .inner_join(businesses::table)
            .left_join(crawl_queue::table.on(crawl_queue::competitor_id.eq(competitors::id)))
            .filter(competitors::is_active.eq(true))
            .filter(crawl_queue::id.is_null())
            .filter(overdue)
            .order((
                competitors::last_crawled_at.asc().nulls_first(),
                competitors::id.asc(),
            ))
            .offset(offset)
            .limit(limit)
            .select((
                competitors::id,
                businesses::user_id,
                competitors::url,
                competitors::is_active,
                competitors::crawl_frequency_minutes,
                competitors::last_crawled_at,
                crawl_queue::id.nullable().is_not_null(),
            ))
            .load::<DueCandidate>(&mut conn)?;

        Ok(results)
    }

    async fn find_owned_competitor(
        &self,
        user_id: Uuid,
        competitor_id: Uuid,
    ) -> Result<Option<CompetitorEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = competitors::table
            .inner_join(businesses::table)
            .filter(competitors::id.eq(competitor_id))
            .filter(businesses::user_id.eq(user_id))
            .select(CompetitorEntity::as_select())
            .first::<CompetitorEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_owned_business(
        &self,
        user_id: Uuid,
        business_id: Uuid,
    ) -> Result<Option<BusinessEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = businesses::table
            .filter(businesses::id.eq(business_id))
            .filter(businesses::user_id.eq(user_id))
            .select(BusinessEntity::as_select())
            .first::<BusinessEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn count_competitors_for_user(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = competitors::table
            .inner_join(businesses::table)
            .filter(businesses::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn create_competitor(
        &self,
        insert_competitor_entity: InsertCompetitorEntity,
    ) -> Result<CompetitorEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = diesel::insert_into(competitors::table)
            .values(&insert_competitor_entity)
            .returning(CompetitorEntity::as_returning())
            .get_result::<CompetitorEntity>(&mut conn)?;

        Ok(result)
    }
}
