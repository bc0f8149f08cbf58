//! Cache-backed entry point the views talk to.
//!
//! Reads go through the [`QueryCache`]; mutations go straight to the service
//! and, once they succeed, invalidate the families they affect.

use std::rc::Rc;

use shared::{
    AnalyzeResponse, Detection, DetectionFilter, Horse, HorseDetail, HorseId, Location, LocationId,
};

use crate::api::{ApiClient, ApiError, ImageUpload, Transport};
use crate::cache::{CacheKey, Mutation, QueryCache};

pub struct HorseWatch<T> {
    client: Rc<ApiClient<T>>,
    cache: QueryCache,
}

impl<T: Transport + 'static> HorseWatch<T> {
    pub fn new(client: ApiClient<T>, cache: QueryCache) -> Self {
        Self {
            client: Rc::new(client),
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn horses(&self) -> Result<Rc<Vec<Horse>>, ApiError> {
        let client = Rc::clone(&self.client);
        self.cache
            .get(CacheKey::Horses, move || {
                let client = Rc::clone(&client);
                async move { client.list_horses().await }
            })
            .await
    }

    pub async fn horse(&self, id: HorseId) -> Result<Rc<HorseDetail>, ApiError> {
        let client = Rc::clone(&self.client);
        self.cache
            .get(CacheKey::Horse(id), move || {
                let client = Rc::clone(&client);
                async move { client.get_horse(id).await }
            })
            .await
    }

    pub async fn locations(&self) -> Result<Rc<Vec<Location>>, ApiError> {
        let client = Rc::clone(&self.client);
        self.cache
            .get(CacheKey::Locations, move || {
                let client = Rc::clone(&client);
                async move { client.list_locations().await }
            })
            .await
    }

    pub async fn detections(
        &self,
        filter: DetectionFilter,
    ) -> Result<Rc<Vec<Detection>>, ApiError> {
        let client = Rc::clone(&self.client);
        self.cache
            .get(CacheKey::Detections(filter), move || {
                let client = Rc::clone(&client);
                async move { client.list_detections(filter).await }
            })
            .await
    }

    pub async fn timeline(&self, horse_id: HorseId) -> Result<Rc<Vec<Detection>>, ApiError> {
        let client = Rc::clone(&self.client);
        self.cache
            .get(CacheKey::Timeline(horse_id), move || {
                let client = Rc::clone(&client);
                async move { client.timeline(horse_id).await }
            })
            .await
    }

    pub async fn create_horse(
        &self,
        name: &str,
        description: Option<&str>,
        image: ImageUpload,
    ) -> Result<Horse, ApiError> {
        let horse = self.client.create_horse(name, description, image).await?;
        log::info!("Registered horse {} ({})", horse.name, horse.id);
        self.cache.apply(Mutation::CreateHorse);
        Ok(horse)
    }

    pub async fn delete_horse(&self, id: HorseId) -> Result<(), ApiError> {
        self.client.delete_horse(id).await?;
        // The horse is gone; refetching its detail would only 404.
        self.cache.remove(&CacheKey::Horse(id));
        self.cache.remove(&CacheKey::Timeline(id));
        self.cache.apply(Mutation::DeleteHorse);
        Ok(())
    }

    pub async fn create_location(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Location, ApiError> {
        let location = self.client.create_location(name, description).await?;
        self.cache.apply(Mutation::CreateLocation);
        Ok(location)
    }

    pub async fn delete_location(&self, id: LocationId) -> Result<(), ApiError> {
        self.client.delete_location(id).await?;
        self.cache.apply(Mutation::DeleteLocation);
        Ok(())
    }

    pub async fn analyze(
        &self,
        location_id: Option<LocationId>,
        image: ImageUpload,
    ) -> Result<AnalyzeResponse, ApiError> {
        let response = self.client.analyze(location_id, image).await?;
        log::info!(
            "Detection {} recorded (horse {:?}, confidence {:.2}, kept {})",
            response.detection_id,
            response.horse_id,
            response.confidence,
            response.kept
        );
        self.cache.apply(Mutation::Analyze);
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::FutureExt;
    use futures::executor::LocalPool;
    use futures::future;
    use shared::{ConfidenceLevel, Verdict};

    use super::*;
    use crate::api::{HttpResponse, Method};
    use crate::testing::{
        ANALYZE_JSON, DAISY_JSON, DETECTION_JSON, HORSE_JSON, LOCATION_JSON, MockTransport,
        jpeg, test_cache,
    };

    fn service(pool: &LocalPool) -> (HorseWatch<Rc<MockTransport>>, Rc<MockTransport>) {
        let mock = MockTransport::new();
        let (cache, _) = test_cache(pool);
        (
            HorseWatch::new(ApiClient::new(Rc::clone(&mock), ""), cache),
            mock,
        )
    }

    #[test]
    fn concurrent_horse_reads_issue_one_request() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}]", HORSE_JSON)),
        );

        let (a, b) = pool.run_until(future::join(service.horses(), service.horses()));
        assert_eq!(mock.count(Method::Get, "/api/horses"), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn create_horse_invalidates_horse_list() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}]", HORSE_JSON)),
        );
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}, {}]", HORSE_JSON, DAISY_JSON)),
        );
        mock.reply(Method::Post, "/api/horses", HttpResponse::json(201, DAISY_JSON));

        let before = pool.run_until(service.horses()).unwrap();
        assert_eq!(before.len(), 1);

        let daisy = pool
            .run_until(service.create_horse("Daisy", None, jpeg()))
            .unwrap();
        let after = pool.run_until(service.horses()).unwrap();

        assert_eq!(after.len(), 2);
        assert!(after.contains(&daisy));
        assert_eq!(mock.count(Method::Get, "/api/horses"), 2);
    }

    #[test]
    fn validation_failure_leaves_cache_alone() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}]", HORSE_JSON)),
        );

        pool.run_until(service.horses()).unwrap();
        let err = pool
            .run_until(service.create_horse("", None, jpeg()))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        pool.run_until(service.horses()).unwrap();
        assert_eq!(mock.count(Method::Get, "/api/horses"), 1);
        assert_eq!(mock.count(Method::Post, "/api/horses"), 0);
    }

    #[test]
    fn failed_location_delete_keeps_cached_locations() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/locations",
            HttpResponse::json(200, &format!("[{}]", LOCATION_JSON)),
        );
        mock.reply(
            Method::Delete,
            "/api/locations/3",
            HttpResponse::json(409, r#"{"detail": "Cannot delete location with 1 associated detection(s). Remove detections first."}"#)
                .with_status_text("Conflict"),
        );

        let before = pool.run_until(service.locations()).unwrap();
        let err = pool
            .run_until(service.delete_location(LocationId(3)))
            .unwrap_err();
        assert!(err.is_conflict());

        let after = pool.run_until(service.locations()).unwrap();
        assert!(Rc::ptr_eq(&before, &after));
        assert_eq!(after[0].id, LocationId(3));
        assert_eq!(mock.count(Method::Get, "/api/locations"), 1);
    }

    #[test]
    fn successful_location_delete_refetches() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/locations",
            HttpResponse::json(200, &format!("[{}]", LOCATION_JSON)),
        );
        mock.reply(Method::Get, "/api/locations", HttpResponse::json(200, "[]"));
        mock.reply(Method::Delete, "/api/locations/3", HttpResponse::no_content());

        pool.run_until(service.locations()).unwrap();
        pool.run_until(service.delete_location(LocationId(3)))
            .unwrap();
        assert!(pool.run_until(service.locations()).unwrap().is_empty());
    }

    #[test]
    fn analyze_refreshes_detections_and_horses() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(Method::Get, "/api/detections", HttpResponse::json(200, "[]"));
        mock.reply(
            Method::Get,
            "/api/detections",
            HttpResponse::json(200, &format!("[{}]", DETECTION_JSON)),
        );
        mock.reply(
            Method::Get,
            "/api/horses/7",
            HttpResponse::json(
                200,
                &format!(r#"{{"horse": {}, "recent_detections": []}}"#, HORSE_JSON),
            ),
        );
        mock.reply(
            Method::Get,
            "/api/horses/7",
            HttpResponse::json(
                200,
                &format!(
                    r#"{{"horse": {}, "recent_detections": [{}]}}"#,
                    HORSE_JSON, DETECTION_JSON
                ),
            ),
        );
        mock.reply(
            Method::Get,
            "/api/locations",
            HttpResponse::json(200, &format!("[{}]", LOCATION_JSON)),
        );
        mock.reply(
            Method::Post,
            "/api/detections/analyze?location_id=3",
            HttpResponse::json(200, ANALYZE_JSON),
        );

        let all = DetectionFilter::default();
        assert!(pool.run_until(service.detections(all)).unwrap().is_empty());
        assert!(
            pool.run_until(service.horse(HorseId(7)))
                .unwrap()
                .recent_detections
                .is_empty()
        );
        pool.run_until(service.locations()).unwrap();

        pool.run_until(service.analyze(Some(LocationId(3)), jpeg()))
            .unwrap();

        assert_eq!(pool.run_until(service.detections(all)).unwrap().len(), 1);
        assert_eq!(
            pool.run_until(service.horse(HorseId(7)))
                .unwrap()
                .recent_detections
                .len(),
            1
        );
        pool.run_until(service.locations()).unwrap();
        assert_eq!(mock.count(Method::Get, "/api/locations"), 1);
    }

    #[test]
    fn analyze_end_to_end_verdict() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Post,
            "/api/detections/analyze?location_id=3",
            HttpResponse::json(200, ANALYZE_JSON),
        );

        let response = pool
            .run_until(service.analyze(Some(LocationId(3)), jpeg()))
            .unwrap();
        let verdict = Verdict::review(&response);

        assert_eq!(verdict.classification, ConfidenceLevel::High);
        assert_eq!(verdict.best_match_id, Some(HorseId(7)));
        assert_eq!(verdict.ranked_scores[0].score.horse_name, "Kenny");
        assert!(verdict.ranked_scores[0].is_best_match);
        assert_eq!(verdict.ranked_scores[1].score.horse_name, "Daisy");
        assert!(!verdict.ranked_scores[1].is_best_match);
        assert_eq!(verdict.raw_response.as_deref(), Some("{\"horse\": \"Kenny\"}"));
    }

    #[test]
    fn timeline_is_cached_per_horse() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/detections/7/timeline",
            HttpResponse::json(200, &format!("[{}]", DETECTION_JSON)),
        );
        mock.reply(
            Method::Get,
            "/api/detections/9/timeline",
            HttpResponse::json(200, "[]"),
        );

        assert_eq!(pool.run_until(service.timeline(HorseId(7))).unwrap().len(), 1);
        assert!(pool.run_until(service.timeline(HorseId(9))).unwrap().is_empty());
        pool.run_until(service.timeline(HorseId(7))).unwrap();
        assert_eq!(mock.count(Method::Get, "/api/detections/7/timeline"), 1);
    }

    #[test]
    fn deleted_horse_is_not_refetched() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/horses/7",
            HttpResponse::json(
                200,
                &format!(r#"{{"horse": {}, "recent_detections": []}}"#, HORSE_JSON),
            ),
        );
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}]", HORSE_JSON)),
        );
        mock.reply(Method::Get, "/api/horses", HttpResponse::json(200, "[]"));
        mock.reply(Method::Delete, "/api/horses/7", HttpResponse::no_content());

        let events = Rc::new(std::cell::Cell::new(0));
        let detail_key = CacheKey::Horse(HorseId(7));
        let _detail_watch = service.cache().subscribe(&detail_key, {
            let events = Rc::clone(&events);
            move |_| events.set(events.get() + 1)
        });
        let _list_watch = service.cache().subscribe(&CacheKey::Horses, |_| {});

        pool.run_until(service.horse(HorseId(7))).unwrap();
        pool.run_until(service.horses()).unwrap();
        let seen = events.get();

        pool.run_until(service.delete_horse(HorseId(7))).unwrap();
        pool.run_until_stalled();

        assert_eq!(mock.count(Method::Get, "/api/horses/7"), 1);
        assert_eq!(events.get(), seen);
        assert!(service.cache().peek::<HorseDetail>(&detail_key).is_none());
        // The list is still watched, so it refreshes straight away.
        assert_eq!(mock.count(Method::Get, "/api/horses"), 2);
        assert_eq!(
            service.cache().peek::<Vec<Horse>>(&CacheKey::Horses).map(|list| list.len()),
            Some(0)
        );
    }

    #[test]
    fn readers_join_a_slow_request() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.reply(
            Method::Get,
            "/api/horses",
            HttpResponse::json(200, &format!("[{}]", HORSE_JSON)),
        );
        let release = mock.hold_next();

        let mut first = service.horses().boxed_local();
        assert!(pool.run_until(future::poll_immediate(&mut first)).is_none());
        assert!(service.cache().is_fetching(&CacheKey::Horses));

        let mut second = service.horses().boxed_local();
        assert!(pool.run_until(future::poll_immediate(&mut second)).is_none());
        pool.run_until_stalled();

        release.send(()).unwrap();
        let (a, b) = pool.run_until(future::join(first, second));
        assert_eq!(a.unwrap()[0].name, "Kenny");
        assert_eq!(b.unwrap()[0].name, "Kenny");
        assert_eq!(mock.count(Method::Get, "/api/horses"), 1);
        assert!(!service.cache().is_fetching(&CacheKey::Horses));
    }

    #[test]
    fn network_blip_is_absorbed_by_retry() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);
        mock.fail(
            Method::Get,
            "/api/locations",
            ApiError::Transport("connection reset".into()),
        );
        mock.reply(
            Method::Get,
            "/api/locations",
            HttpResponse::json(200, &format!("[{}]", LOCATION_JSON)),
        );

        let locations = pool.run_until(service.locations()).unwrap();
        assert_eq!(locations[0].name, "North paddock");
        assert_eq!(mock.count(Method::Get, "/api/locations"), 2);
    }

    #[test]
    fn transport_errors_propagate_after_retry() {
        let mut pool = LocalPool::new();
        let (service, mock) = service(&pool);

        let err = pool.run_until(service.horses()).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(mock.count(Method::Get, "/api/horses"), 2);
    }
}
