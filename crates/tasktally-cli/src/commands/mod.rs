pub mod advice;
pub mod config;
pub mod report;
pub mod stats;
pub mod task;
pub mod track;
