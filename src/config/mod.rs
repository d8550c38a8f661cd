//! Configuration module

mod site;

pub use site::ContentConfig;
pub use site::RepositoryConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::WebhookConfig;
