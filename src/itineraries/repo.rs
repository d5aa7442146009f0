use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::itineraries::dto::ItineraryInput;
use crate::itineraries::repo_types::{ActivityRecord, Itinerary, ItineraryCounts, ItineraryRow};

/// Persistence boundary for itineraries and their activities.
///
/// Every lookup is scoped to the owning user; a foreign itinerary is
/// indistinguishable from a missing one.
#[async_trait]
pub trait ItineraryStore: Send + Sync {
    /// Itineraries of a user, most recently updated first.
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Itinerary>>;

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Itinerary>>;

    /// Activities ordered by day, then time.
    async fn activities_by_itinerary(&self, id: Uuid) -> anyhow::Result<Vec<ActivityRecord>>;

    /// Inserts the itinerary and its activities atomically.
    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &ItineraryInput,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Itinerary>;

    /// Updates the itinerary and replaces its activities atomically.
    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: &ItineraryInput,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Option<Itinerary>>;

    /// Replaces activities only, bumping `updated_at`.
    async fn replace_activities(
        &self,
        user_id: Uuid,
        id: Uuid,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Option<Itinerary>>;

    /// Deletes the itinerary; activities go with it. Returns false if absent.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;

    async fn counts_for_user(&self, user_id: Uuid) -> anyhow::Result<ItineraryCounts>;
}

const ITINERARY_COLUMNS: &str = "id, user_id, title, days, start_date, pace, budget, interests, \
                                 transportation, include_food, created_at, updated_at";

#[derive(Clone)]
pub struct PgItineraryStore {
    db: PgPool,
}

impl PgItineraryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_activities_tx(
    tx: &mut Transaction<'_, Postgres>,
    activities: &[ActivityRecord],
) -> anyhow::Result<()> {
    for a in activities {
        sqlx::query(
            r#"
            INSERT INTO itinerary_activities
                (itinerary_id, day, time, title, location, description, image, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(a.itinerary_id)
        .bind(a.day)
        .bind(&a.time)
        .bind(&a.title)
        .bind(&a.location)
        .bind(&a.description)
        .bind(&a.image)
        .bind(&a.category)
        .execute(&mut **tx)
        .await
        .context("insert activity")?;
    }
    Ok(())
}

async fn delete_activities_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM itinerary_activities WHERE itinerary_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("delete activities")?;
    Ok(())
}

#[async_trait]
impl ItineraryStore for PgItineraryStore {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Itinerary>> {
        let sql = format!(
            "SELECT {ITINERARY_COLUMNS} FROM itineraries WHERE user_id = $1 ORDER BY updated_at DESC"
        );
        let rows = sqlx::query_as::<_, ItineraryRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await
            .context("list itineraries")?;
        Ok(rows.into_iter().map(Itinerary::from).collect())
    }

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Itinerary>> {
        let sql = format!("SELECT {ITINERARY_COLUMNS} FROM itineraries WHERE id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, ItineraryRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .context("find itinerary")?;
        Ok(row.map(Itinerary::from))
    }

    async fn activities_by_itinerary(&self, id: Uuid) -> anyhow::Result<Vec<ActivityRecord>> {
        let rows = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT itinerary_id, day, time, title, location, description, image, category
              FROM itinerary_activities
             WHERE itinerary_id = $1
             ORDER BY day ASC, time COLLATE "C" ASC, created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await
        .context("list activities")?;
        Ok(rows)
    }

    async fn create(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &ItineraryInput,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Itinerary> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let sql = format!(
            r#"
            INSERT INTO itineraries
                (id, user_id, title, days, start_date, pace, budget, interests, transportation, include_food)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ITINERARY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ItineraryRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(input.title.trim())
            .bind(input.days)
            .bind(input.start_date)
            .bind(input.pace.as_str())
            .bind(&input.budget)
            .bind(&input.interests)
            .bind(&input.transportation)
            .bind(input.include_food)
            .fetch_one(&mut *tx)
            .await
            .context("insert itinerary")?;

        insert_activities_tx(&mut tx, activities).await?;
        tx.commit().await.context("commit tx")?;

        Ok(row.into())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: &ItineraryInput,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Option<Itinerary>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let sql = format!(
            r#"
            UPDATE itineraries
               SET title = $3, days = $4, start_date = $5, pace = $6, budget = $7,
                   interests = $8, transportation = $9, include_food = $10, updated_at = now()
             WHERE id = $1 AND user_id = $2
            RETURNING {ITINERARY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ItineraryRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(input.title.trim())
            .bind(input.days)
            .bind(input.start_date)
            .bind(input.pace.as_str())
            .bind(&input.budget)
            .bind(&input.interests)
            .bind(&input.transportation)
            .bind(input.include_food)
            .fetch_optional(&mut *tx)
            .await
            .context("update itinerary")?;

        // Dropping the transaction rolls it back.
        let Some(row) = row else { return Ok(None) };

        delete_activities_tx(&mut tx, id).await?;
        insert_activities_tx(&mut tx, activities).await?;
        tx.commit().await.context("commit tx")?;

        Ok(Some(row.into()))
    }

    async fn replace_activities(
        &self,
        user_id: Uuid,
        id: Uuid,
        activities: &[ActivityRecord],
    ) -> anyhow::Result<Option<Itinerary>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let sql = format!(
            "UPDATE itineraries SET updated_at = now() WHERE id = $1 AND user_id = $2 \
             RETURNING {ITINERARY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItineraryRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .context("touch itinerary")?;
        let Some(row) = row else { return Ok(None) };

        delete_activities_tx(&mut tx, id).await?;
        insert_activities_tx(&mut tx, activities).await?;
        tx.commit().await.context("commit tx")?;

        Ok(Some(row.into()))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM itineraries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete itinerary")?;
        Ok(res.rows_affected() > 0)
    }

    async fn counts_for_user(&self, user_id: Uuid) -> anyhow::Result<ItineraryCounts> {
        let (itineraries, activities) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(DISTINCT i.id), COUNT(a.id)
              FROM itineraries i
              LEFT JOIN itinerary_activities a ON a.itinerary_id = i.id
             WHERE i.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .context("count itineraries")?;
        Ok(ItineraryCounts { itineraries, activities })
    }
}

#[cfg(test)]
pub use memory::MemoryItineraryStore;
