pub mod callbacks;
pub mod client;
pub mod error;
pub mod origin;
pub mod protocol;

pub use self::{
    client::{user_agent_suffix, BuildProfile, LogLevel, ShellClient, ShellClientBuilder},
    error::ShellError,
    origin::NavigationDirective,
    protocol::{ScanResultEvent, ScanStatus},
};

uniffi::setup_scaffolding!();
