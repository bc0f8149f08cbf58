//! Glue between the query cache and yew components.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::api::{ApiError, GlooTransport};
use crate::cache::{CacheEvent, CacheKey};
use crate::service::HorseWatch;

pub type Service = HorseWatch<GlooTransport>;

/// Shared by every view through a `ContextProvider`.
#[derive(Clone)]
pub struct AppContext {
    pub service: Rc<Service>,
}

impl PartialEq for AppContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.service, &other.service)
    }
}

pub struct QueryState<V> {
    pub data: Option<Rc<V>>,
    pub error: Option<ApiError>,
    pub loading: bool,
}

impl<V> Default for QueryState<V> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: true,
        }
    }
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            loading: self.loading,
        }
    }
}

impl<V> PartialEq for QueryState<V> {
    fn eq(&self, other: &Self) -> bool {
        let same_data = match (&self.data, &other.data) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_data && self.error == other.error && self.loading == other.loading
    }
}

pub enum QueryAction<V> {
    /// A new key is being read; whatever is cached for it is shown meanwhile.
    Start(Option<Rc<V>>),
    Loaded(Rc<V>),
    Failed(ApiError),
}

impl<V> Reducible for QueryState<V> {
    type Action = QueryAction<V>;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let next = match action {
            QueryAction::Start(data) => Self {
                loading: data.is_none(),
                data,
                error: None,
            },
            QueryAction::Loaded(data) => Self {
                data: Some(data),
                error: None,
                loading: false,
            },
            // Keep showing the last good value next to the error.
            QueryAction::Failed(error) => Self {
                data: self.data.clone(),
                error: Some(error),
                loading: false,
            },
        };
        Rc::new(next)
    }
}

#[hook]
pub fn use_service() -> Rc<Service> {
    use_context::<AppContext>()
        .expect("AppContext must be provided above every view")
        .service
}

/// Reads `key` through the cache and re-renders whenever a fetch for it
/// settles, including refreshes triggered by mutations elsewhere.
#[hook]
pub fn use_query<V, F>(key: CacheKey, load: F) -> UseReducerHandle<QueryState<V>>
where
    V: 'static,
    F: Fn(Rc<Service>) -> LocalBoxFuture<'static, Result<Rc<V>, ApiError>> + 'static,
{
    let service = use_service();
    let state = use_reducer(QueryState::<V>::default);

    {
        let dispatcher = state.dispatcher();
        use_effect_with(key, move |key| {
            let cache = service.cache().clone();
            let active = Rc::new(Cell::new(true));

            let subscription = cache.subscribe(key, {
                let dispatcher = dispatcher.clone();
                let cache = cache.clone();
                let key = key.clone();
                move |event| match event {
                    CacheEvent::Updated => {
                        if let Some(data) = cache.peek::<V>(&key) {
                            dispatcher.dispatch(QueryAction::Loaded(data));
                        }
                    }
                    CacheEvent::Failed(err) => dispatcher.dispatch(QueryAction::Failed(err.clone())),
                }
            });

            dispatcher.dispatch(QueryAction::Start(cache.peek::<V>(key)));
            spawn_local({
                let active = Rc::clone(&active);
                let key = key.clone();
                async move {
                    let result = load(service).await;
                    if !active.get() {
                        return;
                    }
                    match result {
                        Ok(data) => dispatcher.dispatch(QueryAction::Loaded(data)),
                        Err(err) => {
                            log::error!("Loading {} failed: {}", key, err);
                            dispatcher.dispatch(QueryAction::Failed(err));
                        }
                    }
                }
            });

            move || {
                active.set(false);
                drop(subscription);
            }
        });
    }

    state
}
