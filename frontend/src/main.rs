use std::rc::Rc;

use horsewatch_frontend::api::{ApiClient, GlooTransport};
use horsewatch_frontend::cache::QueryCache;
use horsewatch_frontend::components::{Analyzer, Dashboard, HorseProfile};
use horsewatch_frontend::config::AppConfig;
use horsewatch_frontend::hooks::AppContext;
use horsewatch_frontend::runtime::BrowserRuntime;
use horsewatch_frontend::service::HorseWatch;
use shared::HorseId;
use yew::prelude::*;

#[derive(Clone, Copy, PartialEq)]
enum View {
    Dashboard,
    Analyzer,
    Horse(HorseId),
}

enum Msg {
    Show(View),
}

struct Model {
    context: AppContext,
    view: View,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        let config = AppConfig::load();
        let cache = QueryCache::new(Rc::new(BrowserRuntime), config.cache_config());
        let client = ApiClient::new(GlooTransport, config.api_base_url.clone());
        log::info!("HorseWatch client talking to {:?}", client.base_url());

        Self {
            context: AppContext {
                service: Rc::new(HorseWatch::new(client, cache)),
            },
            view: View::Dashboard,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Show(view) if view != self.view => {
                self.view = view;
                true
            }
            Msg::Show(_) => false,
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <ContextProvider<AppContext> context={self.context.clone()}>
                <div class="container">
                    { self.render_header(ctx) }
                    <main class="main-content">
                        { self.render_view(ctx) }
                    </main>
                    <footer class="app-footer">
                        <p>{"HorseWatch | Rust WASM"}</p>
                    </footer>
                </div>
            </ContextProvider<AppContext>>
        }
    }
}

impl Model {
    fn render_header(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let tab = |label: &'static str, view: View| {
            let active = self.view == view;
            html! {
                <button class={classes!("nav-tab", active.then_some("active"))}
                        onclick={link.callback(move |_| Msg::Show(view))}>
                    { label }
                </button>
            }
        };

        html! {
            <header class="app-header">
                <h1><i class="fa-solid fa-horse-head"></i>{" HorseWatch"}</h1>
                <nav>
                    { tab("Dashboard", View::Dashboard) }
                    { tab("Analyze", View::Analyzer) }
                </nav>
            </header>
        }
    }

    fn render_view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        match self.view {
            View::Dashboard => html! {
                <Dashboard on_select_horse={link.callback(|id| Msg::Show(View::Horse(id)))} />
            },
            View::Analyzer => html! { <Analyzer /> },
            View::Horse(horse_id) => html! {
                <HorseProfile
                    key={horse_id.to_string()}
                    {horse_id}
                    on_deleted={link.callback(|_| Msg::Show(View::Dashboard))}
                />
            },
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<Model>::new().render();
}
