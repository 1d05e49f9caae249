pub mod settings;

pub use settings::{default_server_url, settings, Settings};
