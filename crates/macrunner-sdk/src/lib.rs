// macrunner-sdk: Foundation layer for macrunner.
// No dependencies on the other macrunner crates; provides the trace
// abstraction, the child-process invoker and filesystem helpers.

pub mod build_constants;
pub mod io_util;
pub mod process_invoker;
pub mod string_util;
pub mod trace;

pub use build_constants::{MacrunnerPackage, Source};
pub use io_util::IOUtil;
pub use process_invoker::{ProcessExitCodeError, ProcessInvoker};
pub use string_util::StringUtil;
pub use trace::TraceWriter;
