//! Objects to manage collection locations and the items that they accept
use crate::{
    Database,
    core::{
        error::{Error, Result},
        loadable::Loadable,
        query::{DynFilterPart, filter::FilterPart},
    },
    item::{Item, ItemTitle},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, sqlite::SqliteQueryResult};
use tracing::{debug, warn};

/// The image file name given to every newly created location until a real
/// image is uploaded for it
pub const PLACEHOLDER_IMAGE: &str = "fake.jpg";

/// A type for specifying fields that can be used for filtering a database query
/// for locations
#[derive(Clone, Debug)]
pub enum Filter {
    /// Match the ID of the location to the given value
    Id(i64),

    /// Match the city of the location exactly
    City(String),

    /// Match the state code (uf) of the location exactly
    State(String),

    /// Match locations that accept at least one of the given item ids
    AcceptsAnyItem(Vec<i64>),
}

impl FilterPart for Filter {
    fn add_to_query(&self, builder: &mut QueryBuilder<Sqlite>) {
        match self {
            Self::Id(id) => {
                builder.push(" L.id = ").push_bind(*id);
            }
            Self::City(city) => {
                builder.push(" L.city = ").push_bind(city.clone());
            }
            Self::State(uf) => {
                builder.push(" L.uf = ").push_bind(uf.clone());
            }
            Self::AcceptsAnyItem(ids) if ids.is_empty() => {
                builder.push(" FALSE");
            }
            Self::AcceptsAnyItem(ids) => {
                builder.push(" LI.item_id IN (");
                let mut separated = builder.separated(", ");
                for id in ids {
                    separated.push_bind(*id);
                }
                separated.push_unseparated(")");
            }
        }
    }
}

/// Parse a comma separated list of item ids, e.g. `"1, 2,3"`. Entries that
/// are not integers are dropped, so they never match anything.
pub fn parse_item_ids(list: &str) -> Vec<i64> {
    list.split(',')
        .filter_map(|s| s.trim().parse::<i64>().ok())
        .collect()
}

/// A location where items can be dropped off for recycling
#[derive(Debug, sqlx::FromRow, Deserialize, Serialize, PartialEq, Clone)]
pub struct Location {
    /// A unique ID that identifies this location in the database
    pub id: i64,

    /// The file name of the image for this location
    pub image: String,

    pub name: String,

    pub email: String,

    /// Whatsapp contact number
    pub whatsapp: String,

    pub latitude: f64,

    pub longitude: f64,

    pub city: String,

    /// The two-letter state code
    #[sqlx(rename = "uf")]
    #[serde(rename = "uf")]
    pub state: String,
}

/// The data needed to create a location. All of it is expected to be
/// validated before it gets here.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct NewLocation {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    #[serde(rename = "uf")]
    pub state: String,
    /// ids of the items accepted at this location
    pub items: Vec<i64>,
}

/// A location together with the titles of all of the items it accepts
#[derive(Debug, Serialize, PartialEq)]
pub struct LocationDetails {
    pub location: Location,
    pub items: Vec<ItemTitle>,
}

#[async_trait]
impl Loadable for Location {
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
        Self::build_query(Some(Filter::Id(id).into()))
            .build_query_as()
            .fetch_one(db.pool())
            .await
            .map_err(|e| e.into())
    }
}

impl Location {
    fn build_query(filter: Option<DynFilterPart>) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            r#"SELECT DISTINCT L.id, L.image, L.name, L.email, L.whatsapp, L.latitude,
            L.longitude, L.city, L.uf FROM locations L
            LEFT JOIN locations_items LI ON LI.location_id = L.id"#,
        );
        if let Some(f) = filter {
            qb.push(" WHERE ");
            f.add_to_query(&mut qb);
        }
        qb.push(" ORDER BY L.id ASC");
        qb
    }

    /// Loads all matching locations from the database. A location that
    /// matches through several of its items is still only returned once.
    pub async fn load_all(filter: Option<DynFilterPart>, db: &Database) -> Result<Vec<Location>> {
        Self::build_query(filter)
            .build_query_as()
            .fetch_all(db.pool())
            .await
            .map_err(|e| e.into())
    }

    /// Loads the location with the given id along with the titles of the
    /// items it accepts
    pub async fn load_details(id: i64, db: &Database) -> Result<LocationDetails> {
        let location = Self::load(id, db).await?;
        let items = Item::load_titles_for_location(id, db).await?;
        Ok(LocationDetails { location, items })
    }

    /// Create a new location and its item associations inside of a single
    /// transaction. Either the location and all of its association rows are
    /// stored, or nothing is.
    pub async fn create(new: NewLocation, db: &Database) -> Result<Location> {
        let mut tx = db.pool().begin().await?;

        let mut location = Location {
            id: Self::invalid_id(),
            image: PLACEHOLDER_IMAGE.to_string(),
            name: new.name,
            email: new.email,
            whatsapp: new.whatsapp,
            latitude: new.latitude,
            longitude: new.longitude,
            city: new.city,
            state: new.state,
        };
        let res = sqlx::query(
            r#"INSERT INTO locations
            (image, name, email, whatsapp, latitude, longitude, city, uf)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&location.image)
        .bind(&location.name)
        .bind(&location.email)
        .bind(&location.whatsapp)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.city)
        .bind(&location.state)
        .execute(&mut *tx)
        .await?;
        location.set_id(res.last_insert_rowid());
        debug!(id = location.id, "inserted location");

        if !new.items.is_empty() {
            // The supplied ids are not checked against this list; the foreign
            // key on locations_items is what rejects an unknown item.
            let known = Item::ids(&mut *tx).await?;
            let unknown: Vec<i64> = new
                .items
                .iter()
                .copied()
                .filter(|id| !known.contains(id))
                .collect();
            if !unknown.is_empty() {
                warn!(
                    ?unknown,
                    "creating location {} with item ids that are not in the database", location.id
                );
            }

            let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO locations_items (location_id, item_id) ");
            qb.push_values(new.items.iter(), |mut row, item_id| {
                row.push_bind(location.id).push_bind(*item_id);
            });
            let res = qb.build().execute(&mut *tx).await?;
            debug!(
                id = location.id,
                "associated {} items with location",
                res.rows_affected()
            );
        }

        // dropping the transaction without committing rolls it back, so any
        // early return above leaves the database untouched
        tx.commit().await?;
        Ok(location)
    }

    /// Write every column of this location back to the database. This is a
    /// full overwrite of the stored row, not a partial update.
    pub async fn update(&self, db: &Database) -> Result<SqliteQueryResult> {
        if self.id < 0 {
            return Err(Error::InvalidUpdateObjectNotFound);
        }
        sqlx::query(
            r#"UPDATE locations SET image=?, name=?, email=?, whatsapp=?, latitude=?,
            longitude=?, city=?, uf=? WHERE id=?"#,
        )
        .bind(&self.image)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.whatsapp)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(&self.city)
        .bind(&self.state)
        .bind(self.id)
        .execute(db.pool())
        .await
        .map_err(|e| e.into())
    }
}
