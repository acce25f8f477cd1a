pub mod settings;

pub use settings::{Logger, Monitor, Relay, Settings};
