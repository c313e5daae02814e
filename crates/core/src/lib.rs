pub mod config;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    TorrentPolicyConfig, TransmissionConfig,
};
pub use torrent_client::{
    TorrentClient, TorrentClientError, TorrentDescriptor, TorrentPriority, TorrentProperties,
    TorrentStatus, TransmissionClient,
};
