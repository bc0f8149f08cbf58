use futures::FutureExt;
use shared::{Detection, HorseId, Verdict, group_by_date, resolve_image_url};
use yew::prelude::*;

use super::{ConfidenceBadge, render_error_message, render_loading};
use crate::cache::CacheKey;
use crate::hooks::use_query;

#[derive(Properties, PartialEq)]
pub struct DetectionTimelineProps {
    pub horse_id: HorseId,
}

/// Sightings of one horse, newest first, one section per day.
#[function_component(DetectionTimeline)]
pub fn detection_timeline(props: &DetectionTimelineProps) -> Html {
    let horse_id = props.horse_id;
    let timeline = use_query(CacheKey::Timeline(horse_id), move |service| {
        async move { service.timeline(horse_id).await }.boxed_local()
    });

    let Some(detections) = timeline.data.clone() else {
        return html! {
            <>
                { render_error_message(timeline.error.as_ref()) }
                if timeline.loading { { render_loading("Loading timeline...") } }
            </>
        };
    };

    if detections.is_empty() {
        return html! { <p class="empty-state">{"No detections for this horse yet."}</p> };
    }

    html! {
        <div class="timeline">
            { render_error_message(timeline.error.as_ref()) }
            { for group_by_date(&detections).into_iter().map(|group| html! {
                <section class="timeline-day">
                    <h3>{ group.date.format("%A, %B %-d, %Y").to_string() }</h3>
                    <ul>
                        { for group.detections.into_iter().map(render_detection) }
                    </ul>
                </section>
            }) }
        </div>
    }
}

fn render_detection(detection: &Detection) -> Html {
    let verdict = Verdict::review(detection);
    html! {
        <li class={classes!("timeline-entry", verdict.classification.css_class())}>
            <img src={resolve_image_url(&detection.image_path)} alt={detection.action.clone()} />
            <div>
                <span class="timeline-time">{ detection.timestamp.format("%H:%M").to_string() }</span>
                <span class="timeline-horse">{ verdict.headline() }</span>
                <span class="badge">{ detection.action.clone() }</span>
                <ConfidenceBadge confidence={detection.confidence} />
            </div>
        </li>
    }
}
