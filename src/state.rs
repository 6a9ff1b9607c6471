use std::{path::PathBuf, sync::Arc};

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
};

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: Arc<str>,
    pub ttl_hours: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: JwtSettings,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(pool: DbPool, jwt: JwtSettings, upload_dir: impl Into<PathBuf>) -> Self {
        let orm = create_orm_conn(&pool);
        Self {
            pool,
            orm,
            jwt,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn from_config(pool: DbPool, config: &AppConfig) -> Self {
        let jwt = JwtSettings {
            secret: Arc::from(config.jwt_secret.as_str()),
            ttl_hours: config.jwt_ttl_hours,
        };
        Self::new(pool, jwt, config.upload_dir.as_str())
    }
}
