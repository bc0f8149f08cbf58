pub mod analysis_result;
pub mod analyzer;
pub mod confidence_badge;
pub mod dashboard;
pub mod detection_timeline;
pub mod horse_profile;

pub use analysis_result::AnalysisResult;
pub use analyzer::Analyzer;
pub use confidence_badge::ConfidenceBadge;
pub use dashboard::Dashboard;
pub use detection_timeline::DetectionTimeline;
pub use horse_profile::HorseProfile;

use yew::prelude::*;

use crate::api::ApiError;

pub fn render_error_message(error: Option<&ApiError>) -> Html {
    match error {
        Some(err) => html! {
            <div class="error-message">
                <i class="fa-solid fa-circle-exclamation"></i>
                <p>{ err.to_string() }</p>
            </div>
        },
        None => html! {},
    }
}

pub fn render_loading(label: &str) -> Html {
    html! {
        <div class="loading">
            <i class="fa-solid fa-spinner fa-spin"></i>
            <span>{ label }</span>
        </div>
    }
}
