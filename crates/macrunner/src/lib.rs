// macrunner: provisions self-hosted GitHub Actions runners for a repository
// or an organization and installs them as background services.
//
// Architecture:
//   main → Runner::execute_command → create / list / scale
//   create → ConfigManager → PermissionValidator → Workspace
//          → RegistrationPipeline (RunnerCache, RunnerHost)

pub mod command_settings;
pub mod configuration;
pub mod github;
pub mod runner;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;
