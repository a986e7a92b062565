pub mod classify;
pub mod crawler;
pub mod indicators;
pub mod patterns;
pub mod resolvers;
pub mod runner;

pub use classify::classify;
pub use crawler::{ClosureReport, DependencyCrawler};
pub use indicators::detect;
pub use resolvers::SourceResolver;
pub use runner::{BatchReport, PageOutcome, Pipeline};
