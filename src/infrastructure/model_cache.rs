//! Lazily populated cache of per-crop disease models

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use moka::future::Cache;
use tracing::{debug, info, warn};

use crate::domain::{CropModel, DomainError, ImageClassifier, ModelLoader};
use crate::infrastructure::observability::record_model_load;

/// Disease model provider.
///
/// With caching enabled, concurrent first requests for the same crop share a
/// single load (`try_get_with` coalesces initializers per key) and failed
/// loads are not remembered. Without caching every call loads from disk.
pub struct DiseaseModelCache {
    loader: Arc<dyn ModelLoader>,
    cache: Option<Cache<String, Arc<dyn ImageClassifier>>>,
}

impl std::fmt::Debug for DiseaseModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiseaseModelCache")
            .field("enabled", &self.cache.is_some())
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl DiseaseModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>, capacity: u64) -> Self {
        Self {
            loader,
            cache: Some(Cache::builder().max_capacity(capacity.max(1)).build()),
        }
    }

    /// Load from disk on every request
    pub fn uncached(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            cache: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub async fn get(&self, model: &CropModel) -> Result<Arc<dyn ImageClassifier>, DomainError> {
        let Some(cache) = &self.cache else {
            return self.load(model).await;
        };

        let key = model.crop().to_string();

        if let Some(hit) = cache.get(&key).await {
            debug!(crop = %key, "Disease model cache hit");
            return Ok(hit);
        }

        cache
            .try_get_with(key, self.load(model))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Load every registered model up front
    pub async fn preload<'a>(
        &self,
        models: impl IntoIterator<Item = &'a CropModel>,
    ) -> Result<usize, DomainError> {
        let mut loaded = 0;

        for model in models {
            self.get(model).await?;
            loaded += 1;
        }

        info!(count = loaded, "Preloaded disease models");
        Ok(loaded)
    }

    pub fn cached_count(&self) -> u64 {
        self.cache.as_ref().map(|c| c.entry_count()).unwrap_or(0)
    }

    /// Flush pending cache maintenance so `cached_count` is exact
    pub async fn sync(&self) {
        if let Some(cache) = &self.cache {
            cache.run_pending_tasks().await;
        }
    }

    async fn load(&self, model: &CropModel) -> Result<Arc<dyn ImageClassifier>, DomainError> {
        let loader = self.loader.clone();
        let path: PathBuf = model.model_path().to_path_buf();
        let crop = model.crop().to_string();
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| DomainError::internal(format!("model load task failed: {}", e)))?;

        match &result {
            Ok(_) => {
                info!(
                    crop = %crop,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Loaded disease model"
                );
                record_model_load(&crop, true);
            }
            Err(e) => {
                warn!(crop = %crop, error = %e, "Failed to load disease model");
                record_model_load(&crop, false);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::domain::classifier::mock::StaticClassifier;
    use crate::domain::classifier::MockModelLoader;
    use crate::domain::LabelSet;

    fn corn() -> CropModel {
        CropModel::new(
            "Corn",
            "/models/corn.onnx",
            LabelSet::new(["Blight", "Common Rust", "Gray Leaf Spot", "Healthy"]).unwrap(),
        )
    }

    fn static_model(path: &Path) -> Result<Arc<dyn ImageClassifier>, DomainError> {
        Ok(Arc::new(StaticClassifier::new(
            path.display().to_string(),
            vec![0.1, 0.7, 0.1, 0.1],
        )))
    }

    #[tokio::test]
    async fn test_cached_model_loaded_once() {
        let mut loader = MockModelLoader::new();
        loader
            .expect_load()
            .times(1)
            .returning(|path| static_model(path));

        let cache = DiseaseModelCache::new(Arc::new(loader), 8);

        let first = cache.get(&corn()).await.unwrap();
        let second = cache.get(&corn()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        cache.sync().await;
        assert_eq!(cache.cached_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_share_one_load() {
        let mut loader = MockModelLoader::new();
        loader.expect_load().times(1).returning(|path| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            static_model(path)
        });

        let cache = Arc::new(DiseaseModelCache::new(Arc::new(loader), 8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get(&corn()).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let mut loader = MockModelLoader::new();
        let mut seq = mockall::Sequence::new();
        loader
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|path| Err(DomainError::model_load(path.display().to_string(), "truncated file")));
        loader
            .expect_load()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|path| static_model(path));

        let cache = DiseaseModelCache::new(Arc::new(loader), 8);

        let err = cache.get(&corn()).await.unwrap_err();
        assert!(matches!(err, DomainError::ModelLoad { .. }));

        assert!(cache.get(&corn()).await.is_ok());
    }

    #[tokio::test]
    async fn test_uncached_loads_every_time() {
        let mut loader = MockModelLoader::new();
        loader
            .expect_load()
            .times(3)
            .returning(|path| static_model(path));

        let cache = DiseaseModelCache::uncached(Arc::new(loader));

        for _ in 0..3 {
            cache.get(&corn()).await.unwrap();
        }
        assert!(!cache.is_enabled());
        assert_eq!(cache.cached_count(), 0);
    }

    #[tokio::test]
    async fn test_preload_loads_all_models() {
        let mut loader = MockModelLoader::new();
        loader
            .expect_load()
            .times(2)
            .returning(|path| static_model(path));

        let cache = DiseaseModelCache::new(Arc::new(loader), 8);
        let models = vec![
            corn(),
            CropModel::new("Wheat", "/models/wheat.onnx", LabelSet::new(["wheat_Healthy"]).unwrap()),
        ];

        let loaded = cache.preload(&models).await.unwrap();
        assert_eq!(loaded, 2);

        cache.get(&models[1]).await.unwrap();
    }
}
