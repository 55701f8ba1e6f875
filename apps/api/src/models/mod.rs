pub mod application;
pub mod attachment;
pub mod submission;
