use futures::FutureExt;
use shared::timeline::RecentActivity;
use shared::{DashboardSummary, DetectionFilter, HorseId, resolve_image_url};
use yew::prelude::*;

use super::{ConfidenceBadge, render_error_message, render_loading};
use crate::cache::CacheKey;
use crate::hooks::use_query;

#[derive(Properties, PartialEq)]
pub struct DashboardProps {
    pub on_select_horse: Callback<HorseId>,
}

#[function_component(Dashboard)]
pub fn dashboard(props: &DashboardProps) -> Html {
    let horses = use_query(CacheKey::Horses, |service| {
        async move { service.horses().await }.boxed_local()
    });
    let locations = use_query(CacheKey::Locations, |service| {
        async move { service.locations().await }.boxed_local()
    });
    let detections = use_query(
        CacheKey::Detections(DetectionFilter::default()),
        |service| async move { service.detections(DetectionFilter::default()).await }.boxed_local(),
    );

    let error = horses
        .error
        .as_ref()
        .or(locations.error.as_ref())
        .or(detections.error.as_ref());

    let (Some(horse_list), Some(location_list), Some(detection_list)) = (
        horses.data.clone(),
        locations.data.clone(),
        detections.data.clone(),
    ) else {
        return html! {
            <>
                { render_error_message(error) }
                if error.is_none() { { render_loading("Loading dashboard...") } }
            </>
        };
    };

    let summary = DashboardSummary::build(&horse_list, &location_list, &detection_list);

    html! {
        <div class="dashboard">
            { render_error_message(error) }
            <div class="stat-cards">
                { render_stat("Horses", summary.horse_count) }
                { render_stat("Locations", summary.location_count) }
                { render_stat("Detections", summary.detection_count) }
                { render_stat("Identified", summary.matched_count) }
            </div>

            <section class="horse-list">
                <h2>{"Horses"}</h2>
                if horse_list.is_empty() {
                    <p class="empty-state">{"No horses registered yet."}</p>
                }
                <ul>
                    { for horse_list.iter().map(|horse| {
                        let id = horse.id;
                        let onclick = props.on_select_horse.reform(move |_: MouseEvent| id);
                        html! {
                            <li class="horse-card" {onclick}>
                                <img src={resolve_image_url(&horse.reference_image_path)} alt={horse.name.clone()} />
                                <span>{ horse.name.clone() }</span>
                            </li>
                        }
                    }) }
                </ul>
            </section>

            <section class="recent-activity">
                <h2>{"Recent Activity"}</h2>
                if summary.recent.is_empty() {
                    <p class="empty-state">{"No detections yet."}</p>
                }
                <ul>
                    { for summary.recent.iter().map(render_activity) }
                </ul>
            </section>
        </div>
    }
}

fn render_stat(label: &str, value: usize) -> Html {
    html! {
        <div class="stat-card">
            <p class="stat-label">{ label }</p>
            <p class="stat-value">{ value.to_string() }</p>
        </div>
    }
}

fn render_activity(activity: &RecentActivity) -> Html {
    let detection = &activity.detection;
    html! {
        <li class="activity-item">
            <span class="activity-horse">
                { activity.top_candidate.clone().unwrap_or_else(|| "Unidentified".to_string()) }
            </span>
            <span class="badge">{ detection.action.clone() }</span>
            <ConfidenceBadge confidence={detection.confidence} />
            <span class="activity-time">{ detection.timestamp.format("%Y-%m-%d %H:%M").to_string() }</span>
        </li>
    }
}
