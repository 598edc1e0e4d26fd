pub mod publisher_config;

pub use publisher_config::{DeploymentTarget, PublisherConfig};
