use anyhow::{Context, Result};
use storage::models::RankingParameters;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    /// Clubs with fewer riders than this have their rider list hidden in public standings.
    pub min_public_group_size: u32,
    pub ranking_parameters: RankingParameters,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let min_public_group_size = match std::env::var("MIN_PUBLIC_GROUP_SIZE") {
            Ok(value) => value
                .parse()
                .context("MIN_PUBLIC_GROUP_SIZE must be a non-negative number")?,
            Err(_) => 1,
        };

        let ranking_parameters = match std::env::var("RANKING_PARAMETERS") {
            Ok(path) => load_ranking_parameters(&path)?,
            Err(_) => RankingParameters::default(),
        };

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            min_public_group_size,
            ranking_parameters,
        })
    }
}

fn load_ranking_parameters(path: &str) -> Result<RankingParameters> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read ranking parameters from {}", path))?;
    parse_ranking_parameters(&raw).with_context(|| format!("Invalid ranking parameters in {}", path))
}

fn parse_ranking_parameters(raw: &str) -> Result<RankingParameters> {
    let params: RankingParameters = serde_json::from_str(raw)?;
    params.validate().map_err(anyhow::Error::msg)?;
    Ok(params)
}
