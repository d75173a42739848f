use {
    crate::auction::entities::Amount,
    anyhow::Result,
    clap::{
        crate_authors,
        crate_description,
        crate_name,
        crate_version,
        Args,
        Parser,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    std::{
        fs,
        time::Duration,
    },
};

mod server;

#[derive(Parser, Debug)]
#[command(name = crate_name!())]
#[command(author = crate_authors!())]
#[command(about = crate_description!())]
#[command(version = crate_version!())]
pub enum Options {
    /// Run the auction server service.
    Run(RunOptions),
}

#[derive(Args, Clone, Debug)]
pub struct RunOptions {
    /// Server Options
    #[command(flatten)]
    pub server: server::Options,

    #[command(flatten)]
    pub config: ConfigOptions,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Config Options")]
#[group(id = "Config")]
pub struct ConfigOptions {
    /// Path to a configuration file containing the engine and collaborator settings
    #[arg(long = "config")]
    #[arg(env = "AUCTION_CONFIG")]
    #[arg(default_value = "config.yaml")]
    pub config: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub engine:        EngineConfig,
    pub collaborators: CollaboratorConfig,
}

impl Config {
    pub fn load(path: &str) -> Result<Config> {
        let yaml_content = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&yaml_content)?;
        Ok(config)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Absolute floor for the bid increment, in minor currency units.
    #[serde(default = "default_bid_increment_floor")]
    pub bid_increment_floor:      Amount,
    /// Bound on any collaborator call before the attempt is failed.
    #[serde(with = "humantime_serde", default = "default_collaborator_timeout")]
    pub collaborator_timeout:     Duration,
    /// Capacity of the engine event fan-out channel.
    #[serde(default = "default_event_channel_size")]
    pub event_channel_size:       usize,
    /// Header carrying the client IP behind the reverse proxy.
    #[serde(default = "default_requester_ip_header_name")]
    pub requester_ip_header_name: String,
}

fn default_bid_increment_floor() -> Amount {
    1_000_000
}

fn default_collaborator_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_event_channel_size() -> usize {
    1000
}

fn default_requester_ip_header_name() -> String {
    "X-Forwarded-For".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollaboratorConfig {
    /// Base URL of the identity service answering bidding-eligibility checks.
    pub identity_url:     String,
    /// Base URL of the notification dispatch service.
    pub notification_url: String,
    /// Base URL of the transaction service receiving settlement requests.
    pub settlement_url:   String,
}
