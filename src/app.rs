use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{CrmGateway, TemplateInput};
use crate::messaging;
use crate::models::{ContactField, NewOpportunity, OpportunityField};
use crate::sheets::SheetsClient;
use crate::upload;

/// Default tab for contact listing when the request names none.
const DEFAULT_CONTACT_TAB: &str = "Sheet1";

pub struct AppState {
    gateway: CrmGateway,
}

#[derive(Deserialize)]
struct ContactsQuery {
    tab: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactUpdateRequest {
    tab_name: Option<String>,
    row_number: Option<i64>,
    status: Option<String>,
    comment: Option<String>,
    name: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactDeleteRequest {
    tab_name: Option<String>,
    row_numbers: Option<Vec<i64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpportunityPostRequest {
    row_number: Option<i64>,
    name: Option<String>,
    contact_name: Option<String>,
    contact_phone: Option<String>,
    amount: Option<String>,
    stage: Option<String>,
    expected_close_date: Option<String>,
    notes: Option<String>,
    source: Option<String>,
}

#[derive(Deserialize)]
struct SheetDeleteQuery {
    title: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateCreateRequest {
    name: Option<String>,
    message: Option<String>,
    html_content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateUpdateRequest {
    row_number: Option<i64>,
    name: Option<String>,
    message: Option<String>,
    html_content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDeleteQuery {
    row_number: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    template_row_number: Option<i64>,
    message: Option<String>,
    #[serde(default)]
    contacts: Vec<PreviewContact>,
}

#[derive(Deserialize)]
struct PreviewContact {
    #[serde(default)]
    name: String,
    #[serde(default)]
    phone: String,
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let client = SheetsClient::new(&config)?;
    let state = Arc::new(AppState {
        gateway: CrmGateway::new(client),
    });

    let app = router(state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!("listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/contacts",
            get(list_contacts)
                .post(update_contact)
                .delete(delete_contacts),
        )
        .route(
            "/api/opportunities",
            get(list_opportunities).post(post_opportunity),
        )
        .route("/api/sheets", get(list_sheets).delete(delete_sheet))
        .route(
            "/api/templates",
            get(list_templates)
                .post(create_template)
                .put(update_template)
                .delete(delete_template),
        )
        .route("/api/upload", post(upload_contacts))
        .route("/api/messages/preview", post(preview_messages))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// ---- contacts ----

async fn list_contacts(
    Query(params): Query<ContactsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>> {
    let tab = params.tab.unwrap_or_else(|| DEFAULT_CONTACT_TAB.to_string());
    let contacts = state.gateway.list_contacts(&tab).await?;
    Ok(Json(json!({ "contacts": contacts })))
}

/// Each present field triggers its own targeted write; a submission carrying
/// all four issues four independent remote writes, and a failure partway
/// through leaves the earlier writes committed (no rollback).
async fn update_contact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactUpdateRequest>,
) -> Result<Json<Value>> {
    let (Some(tab), Some(row)) = (body.tab_name.as_deref(), body.row_number) else {
        return Err(Error::validation("missing required fields"));
    };

    let updates = [
        (ContactField::Status, &body.status),
        (ContactField::Comment, &body.comment),
        (ContactField::Name, &body.name),
        (ContactField::Phone, &body.phone),
    ];
    for (field, value) in updates {
        if let Some(value) = value {
            state
                .gateway
                .update_contact_field(tab, row, field, value)
                .await?;
        }
    }

    // Return the authoritative record so clients merge instead of assuming
    // their optimistic state was applied.
    let contact = state.gateway.get_contact(tab, row).await?;
    Ok(Json(json!({ "success": true, "contact": contact })))
}

async fn delete_contacts(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContactDeleteRequest>,
) -> Result<Json<Value>> {
    let (Some(tab), Some(rows)) = (body.tab_name.as_deref(), body.row_numbers.as_deref()) else {
        return Err(Error::validation("missing required fields"));
    };

    state.gateway.delete_contact_rows(tab, rows).await?;
    Ok(Json(json!({ "success": true })))
}

// ---- opportunities ----

async fn list_opportunities(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let opportunities = state.gateway.list_opportunities().await?;
    Ok(Json(json!({ "opportunities": opportunities })))
}

/// A row number in the body selects per-field update; its absence selects
/// create, with the remaining fields becoming the new record.
async fn post_opportunity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OpportunityPostRequest>,
) -> Result<Json<Value>> {
    if let Some(row) = body.row_number {
        let updates = [
            (OpportunityField::Stage, &body.stage),
            (OpportunityField::Notes, &body.notes),
            (OpportunityField::Amount, &body.amount),
            (OpportunityField::ExpectedCloseDate, &body.expected_close_date),
        ];
        for (field, value) in updates {
            if let Some(value) = value {
                state
                    .gateway
                    .update_opportunity_field(row, field, value)
                    .await?;
            }
        }

        let opportunity = state.gateway.get_opportunity(row).await?;
        return Ok(Json(json!({ "success": true, "opportunity": opportunity })));
    }

    let new = NewOpportunity {
        name: body.name.unwrap_or_default(),
        contact_name: body.contact_name.unwrap_or_default(),
        contact_phone: body.contact_phone.unwrap_or_default(),
        amount: body.amount.unwrap_or_default(),
        stage: body.stage.unwrap_or_default(),
        expected_close_date: body.expected_close_date.unwrap_or_default(),
        notes: body.notes.unwrap_or_default(),
        source: body.source.unwrap_or_default(),
    };
    let opportunity = state.gateway.create_opportunity(new).await?;
    Ok(Json(json!({ "success": true, "opportunity": opportunity })))
}

// ---- sheets ----

async fn list_sheets(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let sheets = state.gateway.list_tabs().await?;
    Ok(Json(json!({ "sheets": sheets })))
}

async fn delete_sheet(
    Query(params): Query<SheetDeleteQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>> {
    let Some(title) = params.title.as_deref() else {
        return Err(Error::validation("sheet title is required"));
    };

    state.gateway.delete_tab(title).await?;
    Ok(Json(json!({ "success": true })))
}

// ---- templates ----

async fn list_templates(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let templates = state.gateway.list_templates().await?;
    Ok(Json(json!({ "success": true, "templates": templates })))
}

async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TemplateCreateRequest>,
) -> Result<Json<Value>> {
    let (Some(name), Some(message)) = (body.name, body.message) else {
        return Err(Error::validation("name and message are required"));
    };
    if name.is_empty() || message.is_empty() {
        return Err(Error::validation("name and message are required"));
    }

    let template = state
        .gateway
        .create_template(TemplateInput {
            name,
            message,
            html_content: body.html_content.unwrap_or_default(),
        })
        .await?;
    Ok(Json(json!({ "success": true, "template": template })))
}

async fn update_template(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TemplateUpdateRequest>,
) -> Result<Json<Value>> {
    let (Some(row), Some(name), Some(message)) = (body.row_number, body.name, body.message) else {
        return Err(Error::validation(
            "row number, name, and message are required",
        ));
    };

    state
        .gateway
        .update_template(
            row,
            TemplateInput {
                name,
                message,
                html_content: body.html_content.unwrap_or_default(),
            },
        )
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_template(
    Query(params): Query<TemplateDeleteQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>> {
    let Some(row) = params.row_number else {
        return Err(Error::validation("row number is required"));
    };

    state.gateway.delete_template(row).await?;
    Ok(Json(json!({ "success": true })))
}

// ---- upload ----

async fn upload_contacts(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("malformed upload: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::validation(format!("malformed upload: {e}")))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let Some(data) = file_data else {
        return Err(Error::validation("no file uploaded"));
    };

    let contacts = upload::parse_contacts(&data)?;
    let title = upload::upload_tab_title(Utc::now());
    state.gateway.create_tab(&title, &contacts).await?;

    Ok(Json(json!({ "success": true, "sheetName": title })))
}

// ---- message preview ----

/// Compose per-recipient message text and a pre-filled chat link. Purely
/// server-side string work; the browser opens the link.
async fn preview_messages(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PreviewRequest>,
) -> Result<Json<Value>> {
    let message = match (body.message, body.template_row_number) {
        (Some(message), _) => message,
        (None, Some(row)) => {
            let templates = state.gateway.list_templates().await?;
            templates
                .into_iter()
                .find(|t| t.row_number == row)
                .map(|t| t.message)
                .ok_or_else(|| Error::not_found(format!("no template at row {row}")))?
        }
        (None, None) => {
            return Err(Error::validation(
                "either message or templateRowNumber is required",
            ));
        }
    };

    let messages: Vec<Value> = body
        .contacts
        .iter()
        .map(|c| {
            let text = messaging::render_message(&message, &c.name, &c.phone);
            let link = messaging::whatsapp_link(&c.phone, &text);
            json!({ "name": c.name, "phone": c.phone, "text": text, "link": link })
        })
        .collect();

    Ok(Json(json!({ "success": true, "messages": messages })))
}
