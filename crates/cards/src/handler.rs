use crate::catalog::CardCatalog;
use crate::editor::CollectionEditor;
use crate::models::{BenefitField, Card, Direction, ImageUpload};
use crate::service::CardError;
use askama::Template;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Upper bound on an uploaded card image.
const IMAGE_UPLOAD_LIMIT: usize = 5 * 1024 * 1024;

impl IntoResponse for CardError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            CardError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            CardError::NotFound => (StatusCode::NOT_FOUND, "Card not found".to_string()),
            CardError::NoDraft => (StatusCode::CONFLICT, "No card is being edited".to_string()),
            CardError::Infrastructure(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": msg }))).into_response()
    }
}

#[derive(Template)]
#[template(path = "user_page.html")]
pub struct UserPageTemplate {
    pub cards: Vec<Card>,
}

#[derive(Template)]
#[template(path = "admin_list.html")]
pub struct AdminListTemplate {
    pub cards: Vec<Card>,
    pub is_remote: bool,
    pub remote_in_sync: bool,
}

#[derive(Template)]
#[template(path = "admin_edit.html")]
pub struct AdminEditTemplate {
    pub card: Card,
    pub is_remote: bool,
    pub upload_failed: bool,
}

/// Routes anyone may see: the card page and its JSON feed.
pub fn public_router<S>(catalog: Arc<CardCatalog>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(user_page))
        .route("/api/cards", get(list_cards))
        .with_state(catalog)
}

/// Editor routes. Callers are expected to put these behind the admin gate.
pub fn admin_router<S>(catalog: Arc<CardCatalog>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(admin_list))
        .route("/cards/new", post(begin_new))
        .route("/cards/{id}/edit", post(begin_edit))
        .route("/cards/{id}/delete", post(delete_card))
        .route("/cards/{index}/move/{direction}", post(move_card))
        .route("/edit", get(edit_form).post(submit_edit))
        .route(
            "/edit/image",
            post(upload_image).layer(DefaultBodyLimit::max(IMAGE_UPLOAD_LIMIT)),
        )
        .route("/api/cards", get(list_cards).post(create_card))
        .route("/api/cards/reorder", post(reorder_cards))
        .route("/api/cards/{id}", put(update_card).delete(delete_card_api))
        .with_state(catalog)
}

fn render<T: Template>(template: &T) -> Result<Html<String>, CardError> {
    template
        .render()
        .map(Html)
        .map_err(|e| CardError::Infrastructure(e.to_string()))
}

async fn user_page(
    State(catalog): State<Arc<CardCatalog>>,
) -> Result<impl IntoResponse, CardError> {
    let template = UserPageTemplate {
        cards: catalog.cards().await,
    };
    render(&template)
}

async fn list_cards(
    State(catalog): State<Arc<CardCatalog>>,
) -> Json<Vec<Card>> {
    Json(catalog.cards().await)
}

async fn admin_list(
    State(catalog): State<Arc<CardCatalog>>,
) -> Result<impl IntoResponse, CardError> {
    let template = AdminListTemplate {
        cards: catalog.cards().await,
        is_remote: catalog.is_remote(),
        remote_in_sync: catalog.remote_in_sync(),
    };
    render(&template)
}

async fn begin_new(
    State(catalog): State<Arc<CardCatalog>>,
) -> Redirect {
    catalog.begin_new().await;
    Redirect::to("/admin/edit")
}

async fn begin_edit(
    State(catalog): State<Arc<CardCatalog>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, CardError> {
    catalog.begin_edit(&id).await?;
    Ok(Redirect::to("/admin/edit"))
}

async fn delete_card(
    State(catalog): State<Arc<CardCatalog>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, CardError> {
    catalog.remove(&id).await?;
    Ok(Redirect::to("/admin"))
}

async fn move_card(
    State(catalog): State<Arc<CardCatalog>>,
    Path((index, direction)): Path<(usize, Direction)>,
) -> Result<impl IntoResponse, CardError> {
    catalog.reorder(index, direction).await?;
    Ok(Redirect::to("/admin"))
}

#[derive(Deserialize)]
struct EditQuery {
    upload: Option<String>,
}

async fn edit_form(
    State(catalog): State<Arc<CardCatalog>>,
    Query(query): Query<EditQuery>,
) -> Result<Response, CardError> {
    let Some(card) = catalog.draft().await else {
        return Ok(Redirect::to("/admin").into_response());
    };
    let template = AdminEditTemplate {
        card,
        is_remote: catalog.is_remote(),
        upload_failed: query.upload.as_deref() == Some("failed"),
    };
    Ok(render(&template)?.into_response())
}

#[derive(Debug, PartialEq, Eq)]
enum EditAction {
    Save,
    AddRow,
    RemoveRow(usize),
    Cancel,
}

impl EditAction {
    fn parse(raw: &str) -> Result<Self, CardError> {
        match raw {
            "save" => Ok(Self::Save),
            "add_row" => Ok(Self::AddRow),
            "cancel" => Ok(Self::Cancel),
            other => other
                .strip_prefix("remove_row:")
                .and_then(|i| i.parse().ok())
                .map(Self::RemoveRow)
                .ok_or_else(|| CardError::InvalidInput(format!("Unknown action: {other}"))),
        }
    }
}

/// Copies the submitted form onto the draft. Benefit inputs arrive as repeated
/// `performance` / `discount` pairs in row order.
fn apply_form(card: &Card, pairs: &[(String, String)]) -> Card {
    let mut next = card.clone();
    let mut performance = 0;
    let mut discount = 0;
    for (key, value) in pairs {
        match key.as_str() {
            "name" => next.name = value.clone(),
            "condition" => next.condition = value.clone(),
            "annual_fee" => next.annual_fee = value.clone(),
            "apply_url" => next.apply_url = value.clone(),
            "performance" => {
                next = CollectionEditor::update_field(&next, performance, BenefitField::Performance, value);
                performance += 1;
            }
            "discount" => {
                next = CollectionEditor::update_field(&next, discount, BenefitField::Discount, value);
                discount += 1;
            }
            _ => {}
        }
    }
    next
}

async fn submit_edit(
    State(catalog): State<Arc<CardCatalog>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<impl IntoResponse, CardError> {
    let action = pairs
        .iter()
        .find(|(k, _)| k == "action")
        .map(|(_, v)| EditAction::parse(v))
        .transpose()?
        .unwrap_or(EditAction::Save);

    if action == EditAction::Cancel {
        catalog.cancel_edit().await;
        return Ok(Redirect::to("/admin"));
    }

    catalog.edit_draft(|card| apply_form(card, &pairs)).await?;

    match action {
        EditAction::AddRow => {
            catalog.edit_draft(CollectionEditor::add_row).await?;
            Ok(Redirect::to("/admin/edit"))
        }
        EditAction::RemoveRow(index) => {
            catalog
                .edit_draft(|card| CollectionEditor::remove_row(card, index))
                .await?;
            Ok(Redirect::to("/admin/edit"))
        }
        _ => {
            catalog.save_draft().await?;
            Ok(Redirect::to("/admin"))
        }
    }
}

/// Reads the `image` part of the upload form. `None` when the body is malformed,
/// over the size limit, or carries no image.
async fn read_image(multipart: &mut Multipart) -> Option<ImageUpload> {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Rejected image upload: {}", e);
                return None;
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Rejected image upload: {}", e);
                return None;
            }
        };
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    upload.filter(|u| !u.bytes.is_empty() && u.content_type.starts_with("image/"))
}

async fn upload_image(
    State(catalog): State<Arc<CardCatalog>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, CardError> {
    let uploaded = match read_image(&mut multipart).await {
        Some(upload) => catalog.upload_image(upload).await?,
        None => {
            catalog.draft().await.ok_or(CardError::NoDraft)?;
            None
        }
    };

    match uploaded {
        Some(_) => Ok(Redirect::to("/admin/edit")),
        None => Ok(Redirect::to("/admin/edit?upload=failed")),
    }
}

async fn create_card(
    State(catalog): State<Arc<CardCatalog>>,
) -> Result<impl IntoResponse, CardError> {
    let card = catalog.create().await?;
    Ok((StatusCode::CREATED, Json(card)))
}

async fn update_card(
    State(catalog): State<Arc<CardCatalog>>,
    Path(id): Path<String>,
    Json(payload): Json<Card>,
) -> Result<impl IntoResponse, CardError> {
    if payload.id != id {
        return Err(CardError::InvalidInput("Card id does not match the path".into()));
    }
    catalog.update(payload).await?;
    Ok(StatusCode::OK)
}

async fn delete_card_api(
    State(catalog): State<Arc<CardCatalog>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, CardError> {
    catalog.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct ReorderRequest {
    index: usize,
    direction: Direction,
}

async fn reorder_cards(
    State(catalog): State<Arc<CardCatalog>>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, CardError> {
    catalog.reorder(payload.index, payload.direction).await?;
    Ok(Json(catalog.cards().await))
}
