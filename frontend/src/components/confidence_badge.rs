use shared::ConfidenceLevel;
use shared::review::confidence_percent;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ConfidenceBadgeProps {
    pub confidence: f64,
}

#[function_component(ConfidenceBadge)]
pub fn confidence_badge(props: &ConfidenceBadgeProps) -> Html {
    let level = ConfidenceLevel::classify(props.confidence);
    html! {
        <span class={classes!("confidence-badge", level.css_class())} title={level.to_string()}>
            { format!("{}%", confidence_percent(props.confidence)) }
        </span>
    }
}
