// Configuration: everything the `create` wizard needs to turn user input
// into a registered runner.

pub mod checklist;
pub mod config_manager;
pub mod permission_validator;
pub mod prompt_manager;
pub mod registration_pipeline;
pub mod runner_cache;
pub mod runner_host;
