pub mod config;
pub mod mailchimp;
pub mod poll;
pub mod segments;
pub mod templates;
pub mod workflow;
