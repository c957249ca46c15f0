use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::Parser;

use crate::errors::WikiError;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATA_DIR: &str = "files";
pub const DEFAULT_ASSET_DIR: &str = "assets";

/// Application configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "flatwiki", version, about = "A personal wiki of markdown files")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "WIKI_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "WIKI_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the markdown pages
    #[arg(short = 'd', long = "data", env = "WIKI_DATA", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Directory with templates and public files, used in debug mode
    #[arg(long = "assets", env = "WIKI_ASSETS", default_value = DEFAULT_ASSET_DIR)]
    pub asset_dir: PathBuf,

    /// Read templates and public files live from the asset directory
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

impl Config {
    /// Defaults with a custom data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_dir: data_dir.into(),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            debug: false,
        }
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> Result<SocketAddr, WikiError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| WikiError::Internal(format!("invalid host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(DEFAULT_DATA_DIR)
    }
}
