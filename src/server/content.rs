use axum::Json;
use axum::Router;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::Deserialize;

use crate::app::content::{ContentKind, ContentService};
use crate::app::model::{ListFilter, Record};
use crate::catalog::{CategoryKey, Partition};
use crate::error::{ApiError, ValidationErrors};
use crate::server::{AppState, AuthSession};

/// List, aggregate and by-id routes for one family.
pub fn routes<K: ContentKind>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<K>).post(create::<K>))
        .route("/all", get(list_all::<K>))
        .route(
            "/:id",
            get(get_one::<K>)
                .put(update::<K>)
                .patch(update::<K>)
                .delete(delete::<K>),
        )
}

/// Query string of list endpoints. Values stay textual so they can be
/// reported per field. `isActive` is a flag: `true` selects active records
/// and any other value selects inactive ones.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    model: Option<String>,
    #[serde(rename = "type")]
    type_key: Option<String>,
    level: Option<String>,
    grade: Option<String>,
    semester: Option<String>,
    year: Option<String>,
    is_active: Option<String>,
}

impl ListQuery {
    fn key(&self) -> CategoryKey {
        CategoryKey {
            model: self.model.clone(),
            type_key: self.type_key.clone(),
            level: self.level.clone(),
            grade: self.grade.clone(),
        }
    }

    fn filter(&self) -> Result<ListFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let filter = ListFilter {
            semester: parse_filter(&mut errors, "semester", self.semester.as_deref()),
            year: parse_filter(&mut errors, "year", self.year.as_deref()),
            is_active: self.is_active.as_deref().map(|v| v.trim() == "true"),
        };
        errors.finish(filter)
    }
}

fn parse_filter<T: std::str::FromStr>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    let parsed = raw.parse().ok();
    if parsed.is_none() {
        errors.push(field, format!("invalid {field} filter: {raw}"));
    }
    parsed
}

/// Request body: the category key (optional when given in the query) next to
/// the family's own fields.
#[derive(Debug, Deserialize)]
pub struct Keyed<T> {
    #[serde(flatten)]
    key: CategoryKey,
    #[serde(flatten)]
    input: T,
}

fn resolve<K: ContentKind>(
    state: &AppState,
    key: &CategoryKey,
) -> Result<&'static Partition, ApiError> {
    Ok(state.catalog.resolve(K::FAMILY, key)?)
}

async fn list<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Record<K::Fields>>>, ApiError> {
    let Query(query) = query?;
    let partition = resolve::<K>(&state, &query.key())?;
    let filter = query.filter()?;
    let records = ContentService::<K>::new(state.store)
        .list(partition, &filter)
        .await?;
    Ok(Json(records))
}

async fn list_all<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Record<K::Fields>>>, ApiError> {
    let Query(query) = query?;
    let partitions =
        state
            .catalog
            .select(K::FAMILY, query.level.as_deref(), query.grade.as_deref())?;
    let filter = query.filter()?;
    let records = ContentService::<K>::new(state.store)
        .list_all(&partitions, &filter)
        .await?;
    Ok(Json(records))
}

async fn create<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    query: Result<Query<CategoryKey>, QueryRejection>,
    body: Result<Json<Keyed<K::Input>>, JsonRejection>,
) -> Result<(StatusCode, Json<Record<K::Fields>>), ApiError> {
    let Query(query_key) = query?;
    let Json(body) = body?;
    let partition = state
        .catalog
        .resolve_either(K::FAMILY, &query_key, &body.key)?;
    let record = ContentService::<K>::new(state.store)
        .create(partition, body.input)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_one<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    id: Result<Path<String>, PathRejection>,
    query: Result<Query<CategoryKey>, QueryRejection>,
) -> Result<Json<Record<K::Fields>>, ApiError> {
    let Path(id) = id?;
    let Query(key) = query?;
    let partition = resolve::<K>(&state, &key)?;
    let record = ContentService::<K>::new(state.store)
        .get(partition, &id)
        .await?;
    Ok(Json(record))
}

async fn update<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    id: Result<Path<String>, PathRejection>,
    query: Result<Query<CategoryKey>, QueryRejection>,
    body: Result<Json<Keyed<K::Update>>, JsonRejection>,
) -> Result<Json<Record<K::Fields>>, ApiError> {
    let Path(id) = id?;
    let Query(query_key) = query?;
    let Json(body) = body?;
    let partition = state
        .catalog
        .resolve_either(K::FAMILY, &query_key, &body.key)?;
    let record = ContentService::<K>::new(state.store)
        .update(partition, &id, body.input)
        .await?;
    Ok(Json(record))
}

async fn delete<K: ContentKind>(
    State(state): State<AppState>,
    _session: AuthSession,
    id: Result<Path<String>, PathRejection>,
    query: Result<Query<CategoryKey>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Path(id) = id?;
    let Query(key) = query?;
    let partition = resolve::<K>(&state, &key)?;
    ContentService::<K>::new(state.store)
        .delete(partition, &id)
        .await?;
    Ok(Json(serde_json::json!({
        "message": format!("{} deleted successfully", K::FAMILY.entity_name()),
    })))
}
