use crate::{
    error::{self, Error},
    state::AppState,
    validation,
};
use axum::{
    Router,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
    routing::get,
};
use libecoleta::{
    core::{
        loadable::Loadable,
        query::{DynFilterPart, filter},
    },
    empty_string_as_none,
    location::{Filter, Location, LocationDetails, parse_item_ids},
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path as FsPath;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// name of the multipart field that carries the location image
const IMAGE_FIELD: &str = "image";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(add_location))
        .route("/{id}", get(show_location).put(update_location_image))
}

#[derive(Deserialize, Debug, Default)]
struct ListParams {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    uf: Option<String>,
    /// comma separated item ids, e.g. `1,2`
    #[serde(default, deserialize_with = "empty_string_as_none")]
    items: Option<String>,
}

impl ListParams {
    /// Listing is only filtered when city, state and items are all given.
    /// Anything less lists every location.
    fn filter(&self) -> Option<DynFilterPart> {
        match (&self.city, &self.uf, &self.items) {
            (Some(city), Some(uf), Some(items)) => Some(
                filter::and()
                    .push(Filter::AcceptsAnyItem(parse_item_ids(items)))
                    .push(Filter::City(city.clone()))
                    .push(Filter::State(uf.clone()))
                    .build(),
            ),
            _ => None,
        }
    }
}

async fn list_locations(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Location>>, error::Error> {
    let Query(params) = params?;
    debug!(?params, "listing locations");
    let locations = Location::load_all(params.filter(), &state.db).await?;
    Ok(Json(locations))
}

/// a non-numeric id can never match a row, so it is reported the same way as
/// a missing one
fn parse_id(id: &str) -> Result<i64, Error> {
    id.parse().map_err(|_| Error::LocationNotFound)
}

async fn show_location(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LocationDetails>, error::Error> {
    let id = parse_id(&id)?;
    let details = Location::load_details(id, &state.db)
        .await
        .map_err(Error::from_location_lookup)?;
    Ok(Json(details))
}

async fn add_location(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Location>, error::Error> {
    let Json(body) = payload?;
    let new = validation::validate_new_location(&body)?;
    let location = Location::create(new, &state.db).await?;
    info!(id = location.id, "created location '{}'", location.name);
    Ok(Json(location))
}

/// Build the name under which an uploaded file is stored: a random prefix
/// followed by the client's file name, stripped of any directory components
/// and unusual characters.
fn stored_file_name(original: &str) -> String {
    let base = FsPath::new(original)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean.trim_matches('.').is_empty() {
        clean = IMAGE_FIELD.to_string();
    }
    let hash = Uuid::new_v4().simple().to_string();
    format!("{}-{clean}", &hash[..12])
}

/// Read the single image file out of a multipart body. Text fields are
/// ignored; a file under any other field name, or a second image, is an error.
async fn read_image(multipart: &mut Multipart) -> Result<Option<(String, Bytes)>, Error> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        if name != IMAGE_FIELD || upload.is_some() {
            return Err(Error::UnexpectedUploadField(name));
        }
        let data = field.bytes().await?;
        debug!("received upload '{file_name}' ({} bytes)", data.len());
        upload = Some((file_name, data));
    }
    Ok(upload)
}

async fn update_location_image(
    Path(id): Path<String>,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Location>, error::Error> {
    let id = parse_id(&id)?;
    // look the location up before touching the upload so that a missing
    // location never leaves a file behind
    let mut location = Location::load(id, &state.db)
        .await
        .map_err(Error::from_location_lookup)?;

    let mut multipart = multipart?;
    let mut stored = None;
    if let Some((original_name, data)) = read_image(&mut multipart).await? {
        let file_name = stored_file_name(&original_name);
        let path = state.upload_dir().join(&file_name);
        tokio::fs::write(&path, &data).await?;
        debug!("stored image for location {id} at {path:?}");
        location.image = file_name.clone();
        stored = Some(file_name);
    }

    if let Err(e) = location.update(&state.db).await {
        if let Some(stored) = stored {
            let path = state.upload_dir().join(&stored);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                warn!("unable to remove orphaned upload {path:?}: {rm}");
            }
        }
        return Err(e.into());
    }
    Ok(Json(location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_file_name() {
        let name = stored_file_name("photo.jpg");
        assert_eq!(name.len(), 12 + 1 + "photo.jpg".len());
        assert!(name.ends_with("-photo.jpg"));
        assert!(name[..12].chars().all(|c| c.is_ascii_hexdigit()));

        assert!(stored_file_name("../../etc/passwd").ends_with("-passwd"));
        assert!(stored_file_name("my photo (1).png").ends_with("-my_photo__1_.png"));
        assert!(stored_file_name("").ends_with("-image"));
        assert!(stored_file_name("..").ends_with("-image"));

        assert_ne!(stored_file_name("a.png"), stored_file_name("a.png"));
    }

    #[test]
    fn test_list_params_filter() {
        let params = ListParams {
            city: Some("Belo Horizonte".into()),
            uf: Some("MG".into()),
            items: Some("1,2".into()),
        };
        assert!(params.filter().is_some());

        let params = ListParams {
            city: Some("Belo Horizonte".into()),
            uf: Some("MG".into()),
            items: None,
        };
        assert!(params.filter().is_none());
        assert!(ListParams::default().filter().is_none());
    }
}
