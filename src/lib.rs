/*!
# Sheet CRM

A small business contact/CRM manager persisted entirely in one remote
spreadsheet document, exposed as a JSON HTTP API.

## Overview

Staff-facing browser UIs list, edit, bulk-delete and bulk-message contacts,
track sales opportunities on a pipeline, and maintain reusable WhatsApp
message templates. All of that state lives as rows in named tabs of a single
spreadsheet document behind a third-party API; this crate is the server layer
that validates requests and translates them into range-addressed reads and
writes against that document.

## Architecture

- **Wire layer** (`auth`, `sheets`): service-account token exchange and the
  range-addressed value/batch operations of the spreadsheet service.
- **Gateway** (`gateway`, `models`): domain operations (contacts,
  opportunities, templates, tabs) mapped onto single-cell and single-row
  writes, under the row-number-as-identity convention.
- **API layer** (`app`, `upload`, `messaging`): axum handlers with
  field-presence validation, multipart CSV upload seeding new tabs, and
  pre-filled chat-link composition.
- **Ambient** (`config`, `error`): environment-derived configuration built
  once at startup and a crate-wide error type that renders the uniform
  `{error}` response envelope.

## Data model

Every record's identity is its 1-based row number within a tab; row 1 is the
header. Row numbers are physical positions and shift when rows above are
deleted — batch deletes are therefore applied in descending order, and
concurrent edit/delete combinations race by design (last writer wins, no
versioning, no transactions).

## HTTP surface

- `GET/POST/DELETE /api/contacts`
- `GET/POST /api/opportunities`
- `GET/DELETE /api/sheets`
- `GET/POST/PUT/DELETE /api/templates`
- `POST /api/upload` (multipart delimited text)
- `POST /api/messages/preview`
*/

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod messaging;
pub mod models;
pub mod sheets;
pub mod upload;

pub use config::Config;
pub use error::{Error, Result};
