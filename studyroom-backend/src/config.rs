// studyroom-backend/src/config.rs
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    /// 共有リンクURL等の組み立てに使うフロントエンドのベースURL
    pub frontend_url: String,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv().ok(); // .env ファイルを読み込む (存在しなくてもエラーにしない)

        let database_url = env::var("DATABASE_URL")?;
        let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let cookie_secure = env::var("APP_ENV").unwrap_or_default() == "production";

        Ok(Config {
            database_url,
            server_addr,
            frontend_url,
            cookie_secure,
        })
    }
}
