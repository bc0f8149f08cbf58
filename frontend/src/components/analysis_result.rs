use shared::{AnalyzeResponse, RankedScore, Verdict, resolve_image_url};
use yew::prelude::*;

use super::ConfidenceBadge;

#[derive(Properties, PartialEq)]
pub struct AnalysisResultProps {
    pub result: AnalyzeResponse,
}

#[function_component(AnalysisResult)]
pub fn analysis_result(props: &AnalysisResultProps) -> Html {
    let raw_open = use_state(|| false);
    let result = &props.result;
    let verdict = Verdict::review(result);

    let toggle_raw = {
        let raw_open = raw_open.clone();
        Callback::from(move |_: MouseEvent| raw_open.set(!*raw_open))
    };

    html! {
        <div class={classes!("results-container", verdict.classification.css_class())}>
            <div class="result-header">
                <h2>{ verdict.headline() }</h2>
                <img class="analyzed-image" src={resolve_image_url(&result.image_path)} alt="Analyzed" />
            </div>

            <div class="result-summary">
                <div>
                    <p class="result-label">{"Action"}</p>
                    <span class="badge">{ result.action.clone() }</span>
                </div>
                <div>
                    <p class="result-label">{"Confidence"}</p>
                    <ConfidenceBadge confidence={result.confidence} />
                </div>
                <div>
                    <p class="result-label">{"Status"}</p>
                    <span class={classes!("badge", if result.kept { "kept" } else { "discarded" })}>
                        { result.status_label() }
                    </span>
                </div>
            </div>

            if verdict.ranked_scores.is_empty() {
                <div class="detailed-results">
                    <p class="result-label">{"Horse"}</p>
                    <p class="horse-name">{ verdict.fallback_label.clone().unwrap_or_default() }</p>
                </div>
            } else {
                <div class="detailed-results">
                    <h3>{"Horse Identification"}</h3>
                    <div class="result-bars">
                        { for verdict.ranked_scores.iter().map(render_score) }
                    </div>
                </div>
            }

            if let Some(raw) = verdict.raw_response.clone() {
                <div class="raw-response">
                    <button class="raw-toggle" onclick={toggle_raw}>
                        {"Raw VLM Response "}
                        <i class={classes!("fa-solid", if *raw_open { "fa-chevron-up" } else { "fa-chevron-down" })}></i>
                    </button>
                    if *raw_open {
                        <pre>{ raw }</pre>
                    }
                </div>
            }
        </div>
    }
}

fn render_score(ranked: &RankedScore) -> Html {
    html! {
        <div class={classes!("result-item", ranked.is_best_match.then_some("best-match"))}>
            <div class="result-label">
                { ranked.score.horse_name.clone() }
                if ranked.is_best_match {
                    <span class="badge best-match-badge">{"Best match"}</span>
                }
            </div>
            <div class="result-bar-container">
                <div class={classes!("result-bar", ranked.level.css_class())}
                     style={format!("width: {}%", ranked.percent)}></div>
            </div>
            <div class="result-value">{ format!("{}%", ranked.percent) }</div>
        </div>
    }
}
