//! Objects describing the kinds of items that collection locations accept.
//! Items are reference data: they are created by the database migrations and
//! are only ever read by this library.
use crate::{Database, Result, core::loadable::Loadable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite};

/// A kind of item that can be dropped off at a collection location, such as
/// batteries or cooking oil.
#[derive(Debug, sqlx::FromRow, Deserialize, Serialize, PartialEq, Clone)]
pub struct Item {
    pub id: i64,
    pub title: String,
}

/// Just the title of an item, as reported in the details of a location
#[derive(Debug, sqlx::FromRow, Deserialize, Serialize, PartialEq, Clone)]
pub struct ItemTitle {
    pub title: String,
}

#[async_trait]
impl Loadable for Item {
    type Id = i64;

    fn invalid_id() -> Self::Id {
        -1
    }

    fn id(&self) -> Self::Id {
        self.id
    }

    fn set_id(&mut self, id: Self::Id) {
        self.id = id
    }

    async fn load(id: Self::Id, db: &Database) -> Result<Self> {
        sqlx::query_as("SELECT id, title FROM items WHERE id = ?")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

impl Item {
    /// Loads every item in the database, ordered by id
    pub async fn load_all(db: &Database) -> Result<Vec<Item>> {
        sqlx::query_as("SELECT id, title FROM items ORDER BY id")
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Fetch the ids of all known items. This takes any executor so that it
    /// can run inside of a transaction.
    pub async fn ids<'e, E>(executor: E) -> Result<Vec<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT id FROM items")
            .fetch_all(executor)
            .await
            .map_err(|e| e.into())
    }

    /// The titles of all items associated with the given location
    pub async fn load_titles_for_location(
        location_id: i64,
        db: &Database,
    ) -> Result<Vec<ItemTitle>> {
        sqlx::query_as(
            r#"SELECT I.title FROM items I
            INNER JOIN locations_items LI ON I.id = LI.item_id
            WHERE LI.location_id = ?
            ORDER BY I.id"#,
        )
        .bind(location_id)
        .fetch_all(db.pool())
        .await
        .map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Pool;
    use test_log::test;

    #[test(sqlx::test(migrations = "../db/migrations/"))]
    async fn test_load_items(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        let items = Item::load_all(&db).await.expect("failed to load items");
        assert_eq!(items.len(), 6);
        assert_eq!(
            items[0],
            Item {
                id: 1,
                title: "Lâmpadas".to_string()
            }
        );

        let item = Item::load(6, &db).await.expect("failed to load item");
        assert_eq!(item.title, "Óleo de Cozinha");

        let err = Item::load(42, &db).await.expect_err("loaded a missing item");
        assert!(err.is_not_found());

        let mut ids = Item::ids(db.pool()).await.expect("failed to fetch ids");
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test(sqlx::test(
        migrations = "../db/migrations/",
        fixtures(path = "../../db/fixtures", scripts("locations"))
    ))]
    async fn test_titles_for_location(pool: Pool<Sqlite>) {
        let db = Database::from(pool);
        let titles = Item::load_titles_for_location(2, &db)
            .await
            .expect("failed to load titles");
        assert_eq!(
            titles,
            vec![
                ItemTitle {
                    title: "Pilhas e Baterias".to_string()
                },
                ItemTitle {
                    title: "Óleo de Cozinha".to_string()
                },
            ]
        );

        let titles = Item::load_titles_for_location(99, &db)
            .await
            .expect("failed to load titles");
        assert!(titles.is_empty());
    }
}
