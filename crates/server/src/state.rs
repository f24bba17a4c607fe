use db::DBService;
use services::services::{blob_store::BlobBackend, image::ImageService};
use sqlx::SqlitePool;

/// Shared handles passed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    images: ImageService,
}

impl AppState {
    pub fn new(db: DBService, backend: BlobBackend) -> Self {
        let images = ImageService::new(db.pool.clone(), backend);
        Self { db, images }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }
}
