// macrunner-common: shared services for macrunner.
// Host context, tracing, console I/O, process invocation and the workspace
// record store; depends on `macrunner-sdk`.

pub mod constants;
pub mod host_context;
pub mod http_client_factory;
pub mod process_invoker;
pub mod secret_masker;
pub mod terminal;
pub mod tracing;
pub mod workspace_store;

// ---------------------------------------------------------------------------
// Re-exports for convenient access
// ---------------------------------------------------------------------------

pub use constants::{
    Architecture, OsPlatform, WellKnownDirectory, CURRENT_ARCHITECTURE, CURRENT_PLATFORM,
};
pub use host_context::HostContext;
pub use http_client_factory::HttpClientFactory;
pub use process_invoker::ProcessInvokerService;
pub use secret_masker::SecretMasker;
pub use terminal::{ConsoleColor, Terminal};
pub use tracing::{TraceEventType, TraceManager, TraceSetting, Tracing};
pub use workspace_store::{RunnerRecord, WorkspaceSettings, WorkspaceStore};
