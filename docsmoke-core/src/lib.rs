pub mod backend;
pub mod config;
pub mod constants;
pub mod crawl;
pub mod discovery;
pub mod error;
pub mod expect;
pub mod fixtures;
pub mod helpers;
pub mod model;
pub mod pages;
pub mod report;
pub mod runner;

pub use backend::{HttpSessionFactory, SessionFactory, factory_for};
pub use config::{ArtifactPolicy, Backend, Project, SuiteConfig};
pub use crawl::{CrawlReport, ExternalPolicy, LinkCrawler};
pub use error::{Result, SmokeError};
pub use fixtures::Fixtures;
pub use model::{DiscoveryCounts, LinkRecord, LinkStatus, RunSummary, TestResult, TestStatus};
pub use pages::{BasePage, HomePage, Navigation, PageObject};
pub use report::ReporterKind;
pub use runner::{Runner, TestCase, TestRegistry};
