pub mod navigator;

pub use navigator::{Decision, NavigatorConfig, RealtimeNavigator};
