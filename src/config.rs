use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the external chat-completion API the agent talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub agent: AgentConfig,
    /// Comma-separated origin list, or "*" for permissive CORS.
    pub allow_origins: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "campus-admin".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "campus-admin-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(30),
        };
        let agent = AgentConfig {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: std::env::var("AGENT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
            base_url: std::env::var("AGENT_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
        };
        let allow_origins = std::env::var("ALLOW_ORIGINS").unwrap_or_else(|_| "*".into());
        Ok(Self {
            database_url,
            jwt,
            agent,
            allow_origins,
        })
    }

    pub fn cors_origins(&self) -> Vec<String> {
        if self.allow_origins.trim() == "*" {
            return vec!["*".into()];
        }
        self.allow_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
