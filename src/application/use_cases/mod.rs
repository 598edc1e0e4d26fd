pub mod publish_site;

pub use publish_site::{
    PublishReport, PublishSiteConfig, PublishSiteError, PublishSiteUseCase, PublishStage,
};
