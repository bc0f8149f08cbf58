use futures::future::LocalBoxFuture;
use gloo_net::http::{Request, RequestBuilder};
use wasm_bindgen::JsValue;
use web_sys::FormData;

use super::ApiError;
use super::client::{FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport};

/// [`Transport`] backed by the browser's `fetch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

impl Transport for GlooTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, ApiError>> {
        Box::pin(async move {
            let builder = match request.method {
                Method::Get => Request::get(&request.url),
                Method::Post => Request::post(&request.url),
                Method::Delete => Request::delete(&request.url),
            };

            let response = build(builder, request.body)?
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status();
            let status_text = response.status_text();
            let body = if status == super::client::HTTP_NO_CONTENT {
                String::new()
            } else {
                response
                    .text()
                    .await
                    .map_err(|e| ApiError::Transport(e.to_string()))?
            };

            Ok(HttpResponse {
                status,
                status_text,
                body,
            })
        })
    }
}

fn build(builder: RequestBuilder, body: RequestBody) -> Result<Request, ApiError> {
    let request = match body {
        RequestBody::Empty => builder.build(),
        RequestBody::Json(json) => builder.header("Content-Type", "application/json").body(json),
        // The browser sets the multipart boundary header itself.
        RequestBody::Multipart(parts) => builder.body(form_data(parts)?),
    };
    request.map_err(|e| ApiError::Transport(format!("Failed to build request: {}", e)))
}

fn form_data(parts: Vec<FormPart>) -> Result<FormData, ApiError> {
    let form = FormData::new().map_err(js_error)?;

    for part in parts {
        match part {
            FormPart::Text { name, value } => {
                form.append_with_str(&name, &value).map_err(js_error)?;
            }
            FormPart::File {
                name,
                file_name,
                mime_type,
                bytes,
            } => {
                let blob: web_sys::Blob =
                    gloo_file::Blob::new_with_options(bytes.as_slice(), Some(&mime_type)).into();
                form.append_with_blob_and_filename(&name, &blob, &file_name)
                    .map_err(js_error)?;
            }
        }
    }

    Ok(form)
}

fn js_error(err: JsValue) -> ApiError {
    ApiError::Transport(format!("{:?}", err))
}
