//! # publisher - GitHub Pages deployment
//!
//! `publisher` copies a project's build output into a local clone of a
//! deployment repository, commits it and pushes the branch. Deployment
//! targets are declared in a `publisher.yml` file at the project root.
//!
//! ## Quick Start
//!
//! 1. Describe the deployment in `publisher.yml`:
//!
//! ```yaml
//! message: "Deploy ${SHA} (${TAG}) on ${DATE}"
//! files: ["dist/*"]
//! exclude: ["dist/**/*.map"]
//! preRun: "npm run build"
//! targets:
//!   prod:
//!     branch: gh-pages
//!     repo: acme/site
//!     url: www.example.com
//! ```
//!
//! 2. Publish:
//!
//! ```bash
//! publisher --tag v1.4.0 prod
//! ```
//!
//! ## Architecture
//!
//! - [`domain`]: the configuration model and the `owner/name` value object
//! - [`application`]: the publish workflow
//! - [`infrastructure`]: git, file system and process access
//! - [`presentation`]: the command line interface
//! - [`common`]: error type, result helpers, templates and verbosity
//!
//! ## Using the Library
//!
//! ```rust,no_run
//! use publisher::application::use_cases::publish_site::{
//!     PublishSiteConfig, PublishSiteUseCase,
//! };
//! use publisher::common::verbosity::Verbosity;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PublishSiteConfig::new("prod", ".")
//!     .with_tag(Some("v1.4.0".to_string()))
//!     .with_verbosity(Verbosity::Verbose);
//!
//! let report = PublishSiteUseCase::new(config).execute()?;
//! println!("Copied {} files", report.sync.copied_files);
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

pub mod application;
pub mod common;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use crate::common::error::PublisherError;
pub use crate::common::result::PublisherResult as Result;
