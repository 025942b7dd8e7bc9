use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, orm_from_pool},
    services::image_store::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub images: ImageStore,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = orm_from_pool(&pool);
        let images = ImageStore::new(config.upload_dir.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
            images,
        }
    }
}
