pub mod config;
pub mod locate;
pub mod pipeline;
pub mod report;
pub mod sheets;
pub mod translate;
