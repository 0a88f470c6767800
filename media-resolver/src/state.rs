use std::sync::Arc;

use crate::db::DbPool;
use crate::models::FlagStore;
use crate::resolver::MediaResolver;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub resolver: Arc<MediaResolver>,
    pub flags: FlagStore
}
