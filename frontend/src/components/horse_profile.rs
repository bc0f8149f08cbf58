use futures::FutureExt;
use shared::{HorseId, resolve_image_url};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use super::{DetectionTimeline, render_error_message, render_loading};
use crate::api::ApiError;
use crate::cache::CacheKey;
use crate::hooks::{use_query, use_service};

#[derive(Properties, PartialEq)]
pub struct HorseProfileProps {
    pub horse_id: HorseId,
    pub on_deleted: Callback<()>,
}

#[function_component(HorseProfile)]
pub fn horse_profile(props: &HorseProfileProps) -> Html {
    let service = use_service();
    let horse_id = props.horse_id;
    let detail = use_query(CacheKey::Horse(horse_id), move |service| {
        async move { service.horse(horse_id).await }.boxed_local()
    });
    let delete_error = use_state(|| None::<ApiError>);

    let on_delete = {
        let delete_error = delete_error.clone();
        let on_deleted = props.on_deleted.clone();
        Callback::from(move |_: MouseEvent| {
            let service = service.clone();
            let delete_error = delete_error.clone();
            let on_deleted = on_deleted.clone();
            spawn_local(async move {
                match service.delete_horse(horse_id).await {
                    Ok(()) => on_deleted.emit(()),
                    Err(err) => delete_error.set(Some(err)),
                }
            });
        })
    };

    if detail.data.is_none() && detail.error.as_ref().is_some_and(ApiError::is_not_found) {
        return html! { <p class="empty-state">{"This horse is no longer registered."}</p> };
    }

    let error = (*delete_error).as_ref().or(detail.error.as_ref());
    let Some(detail) = detail.data.clone() else {
        return html! {
            <>
                { render_error_message(error) }
                if error.is_none() { { render_loading("Loading horse...") } }
            </>
        };
    };
    let horse = &detail.horse;

    html! {
        <div class="horse-profile">
            { render_error_message(error) }
            <div class="horse-header">
                <img src={resolve_image_url(&horse.reference_image_path)} alt={horse.name.clone()} />
                <div>
                    <h2>{ horse.name.clone() }</h2>
                    if let Some(description) = horse.description.clone() {
                        <p class="horse-description">{ description }</p>
                    }
                    <p class="horse-registered">
                        { format!("Registered {}", horse.created_at.format("%Y-%m-%d")) }
                    </p>
                </div>
                <button class="delete-button" onclick={on_delete}>
                    <i class="fa-solid fa-trash"></i>{" Delete"}
                </button>
            </div>
            <DetectionTimeline {horse_id} />
        </div>
    }
}
