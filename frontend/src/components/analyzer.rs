use futures::FutureExt;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::{AnalyzeResponse, LocationId};
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use super::{AnalysisResult, render_error_message};
use crate::api::{ApiError, ImageUpload};
use crate::cache::CacheKey;
use crate::hooks::{use_query, use_service};

#[derive(Clone)]
struct Selected {
    file: GlooFile,
    preview: ObjectUrl,
}

/// Uploads a capture for identification and shows the verdict.
#[function_component(Analyzer)]
pub fn analyzer() -> Html {
    let service = use_service();
    let locations = use_query(CacheKey::Locations, |service| {
        async move { service.locations().await }.boxed_local()
    });

    let location = use_state(|| None::<LocationId>);
    let selected = use_state(|| None::<Selected>);
    let pending = use_state(|| false);
    let error = use_state(|| None::<ApiError>);
    let result = use_state(|| None::<AnalyzeResponse>);

    let on_location = {
        let location = location.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            location.set(select.value().parse().ok().map(LocationId));
        })
    };

    let on_file = {
        let selected = selected.clone();
        let error = error.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input
                .files()
                .and_then(|files| files.item(0))
                .filter(|file| file.type_().starts_with("image/"));
            input.set_value("");

            match file {
                Some(file) => {
                    let file = GlooFile::from(file);
                    error.set(None);
                    selected.set(Some(Selected {
                        preview: ObjectUrl::from(file.clone()),
                        file,
                    }));
                }
                None => error.set(Some(ApiError::Validation(
                    "No valid image file selected.".into(),
                ))),
            }
        })
    };

    let on_analyze = {
        let service = service.clone();
        let location = location.clone();
        let selected = selected.clone();
        let pending = pending.clone();
        let error = error.clone();
        let result = result.clone();
        Callback::from(move |_: MouseEvent| {
            let service = service.clone();
            let location_id = *location;
            let file = selected.as_ref().map(|selected| selected.file.clone());
            let selected = selected.clone();
            let pending = pending.clone();
            let error = error.clone();
            let result = result.clone();

            pending.set(true);
            error.set(None);
            spawn_local(async move {
                let outcome = match read_upload(file).await {
                    Ok(upload) => service.analyze(location_id, upload).await,
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(response) => {
                        result.set(Some(response));
                        selected.set(None);
                    }
                    Err(err) => {
                        log::error!("Analysis failed: {}", err);
                        error.set(Some(err));
                    }
                }
                pending.set(false);
            });
        })
    };

    let ready = location.is_some() && selected.is_some() && !*pending;

    html! {
        <div class="analyzer">
            <div class="upload-section">
                <label for="location-select">{"Location"}</label>
                <select id="location-select" onchange={on_location}>
                    <option value="" selected={location.is_none()}>{"Select a location"}</option>
                    { for locations.data.iter().flat_map(|list| list.iter()).map(|loc| html! {
                        <option value={loc.id.to_string()} selected={*location == Some(loc.id)}>
                            { loc.name.clone() }
                        </option>
                    }) }
                </select>

                <label for="image-input" class="file-input-label">
                    <i class="fa-solid fa-cloud-arrow-up"></i>
                    {" Choose an image"}
                </label>
                <input id="image-input" type="file" accept="image/*" onchange={on_file} />

                if let Some(selected) = (*selected).clone() {
                    <div class="preview-area">
                        <img src={selected.preview.to_string()} alt={selected.file.name()} />
                    </div>
                }

                <button class="analyze-button" onclick={on_analyze} disabled={!ready}>
                    <i class="fa-solid fa-magnifying-glass"></i>
                    { if *pending { " Analyzing..." } else { " Analyze Image" } }
                </button>
            </div>

            { render_error_message((*error).as_ref().or(locations.error.as_ref())) }

            if let Some(response) = (*result).clone() {
                <AnalysisResult result={response} />
            }
        </div>
    }
}

async fn read_upload(file: Option<GlooFile>) -> Result<ImageUpload, ApiError> {
    let Some(file) = file else {
        return Err(ApiError::Validation("Select an image to analyze.".into()));
    };
    let bytes = gloo_file::futures::read_as_bytes(&file)
        .await
        .map_err(|err| ApiError::Validation(format!("Could not read {}: {}", file.name(), err)))?;
    Ok(ImageUpload::new(file.name(), file.raw_mime_type(), bytes))
}
