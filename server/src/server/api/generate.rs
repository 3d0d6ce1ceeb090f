//! QR code generation endpoint.

use axum::extract::{Form, FromRequest, Multipart, Query, Request, State};
use axum::extract::rejection::QueryRejection;
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::app::SharedState;
use crate::services::qr_pipeline::{self, GenerateError, QrRequest, Watermark};

use super::err_json;

#[cfg(test)]
mod tests;

/// `url` and `size` as sent in a query string or urlencoded body.
#[derive(Debug, Default, Deserialize)]
pub struct FormValues {
    url: Option<String>,
    size: Option<String>,
}

/// Raw form values collected from the request.
#[derive(Debug, Default)]
struct GenerateForm {
    url: Option<String>,
    size: Option<String>,
    watermark: Watermark,
}

impl GenerateForm {
    /// Body values win; the query string only fills what the body lacks.
    fn fill_missing(&mut self, query: FormValues) {
        if self.url.is_none() {
            self.url = query.url;
        }
        if self.size.is_none() {
            self.size = query.size;
        }
    }
}

/// POST /generate – Render a QR code, optionally with a centred watermark
pub async fn generate_qr(
    State(state): State<SharedState>,
    query: Result<Query<FormValues>, QueryRejection>,
    request: Request,
) -> Response {
    let mut form = read_body(request, &state).await;

    // A body that failed mid-read hides the real fields, so report it first.
    if let Watermark::Broken(reason) = &form.watermark {
        return reject(GenerateError::Upload(reason.clone()));
    }

    match query {
        Ok(Query(values)) => form.fill_missing(values),
        Err(rejection) => debug!("Ignoring unparseable query string: {rejection}"),
    }

    let request = match QrRequest::parse(
        form.url.as_deref(),
        form.size.as_deref(),
        state.config().max_size,
    ) {
        Ok(request) => request,
        Err(e) => return reject(e),
    };

    let options = state.pipeline_options();
    let has_watermark = !matches!(form.watermark, Watermark::Absent);
    let size = request.size;
    let watermark = form.watermark;

    let result =
        tokio::task::spawn_blocking(move || qr_pipeline::generate(&request, watermark, &options))
            .await
            .unwrap_or_else(|e| Err(GenerateError::Internal(e.to_string())));

    match result {
        Ok(png) => {
            info!(size, has_watermark, bytes = png.len(), "QR code generated");
            ([(header::CONTENT_TYPE, "image/png")], png).into_response()
        }
        Err(e) => reject(e),
    }
}

fn reject(err: GenerateError) -> Response {
    let status = err.status_code();
    if status >= 500 {
        tracing::error!("QR generation failed: {err}");
    } else {
        warn!("Rejected QR request: {err}");
    }
    err_json(status, &err.to_string())
}

/// Read a multipart or urlencoded body. Any other body is an empty form.
async fn read_body(request: Request, state: &SharedState) -> GenerateForm {
    if is_urlencoded(request.headers()) {
        return match Form::<FormValues>::from_request(request, state).await {
            Ok(Form(values)) => GenerateForm {
                url: values.url,
                size: values.size,
                watermark: Watermark::Absent,
            },
            Err(rejection) => {
                let mut form = GenerateForm::default();
                mark_broken(&mut form, rejection.body_text());
                form
            }
        };
    }

    match Multipart::from_request(request, state).await {
        Ok(multipart) => read_form(multipart).await,
        Err(rejection) => {
            debug!("Request body is not a form: {rejection}");
            GenerateForm::default()
        }
    }
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"))
}

/// Collect `url`, `size` and `watermark`. A read failure marks the whole
/// form as broken; fields after it are lost.
async fn read_form(mut multipart: Multipart) -> GenerateForm {
    let mut form = GenerateForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                mark_broken(&mut form, e.body_text());
                break;
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "url" | "size" => {
                let value = match field.text().await {
                    Ok(value) => value,
                    Err(e) => {
                        mark_broken(&mut form, e.body_text());
                        break;
                    }
                };
                let slot = if name == "url" { &mut form.url } else { &mut form.size };
                slot.get_or_insert(value);
            }
            "watermark" => {
                // Browsers send an empty part with a blank filename when no file was chosen.
                let is_file = field.file_name().is_some_and(|f| !f.is_empty());
                match field.bytes().await {
                    Ok(_) if !is_file => debug!("Watermark field carries no file, ignoring"),
                    Ok(bytes) => {
                        if matches!(form.watermark, Watermark::Absent) {
                            form.watermark = Watermark::Present(bytes.into());
                        }
                    }
                    Err(e) => {
                        mark_broken(&mut form, e.body_text());
                        break;
                    }
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    form
}

fn mark_broken(form: &mut GenerateForm, reason: String) {
    warn!("Could not read form body: {reason}");
    form.watermark = Watermark::Broken(reason);
}
