pub mod parse;
pub mod types;

pub use parse::ConfigError;
pub use types::{
    BasicCredentials, Config, IndexConfig, QueueConfig, Settings, TlsConfig, TlsMode, WebConfig,
};
