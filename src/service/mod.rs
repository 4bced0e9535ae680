//! Statement and pipeline execution over the `Database`/`Session` seam.

mod crud;
pub mod pipeline;
pub mod resolver;
pub mod session;
pub mod statement;
pub use crud::CrudService;
pub use pipeline::PipelineExecutor;
pub use resolver::LocalScope;
pub use session::{Database, ExecOutcome, Row, Session};
pub use statement::{StatementExecutor, StatementOutcome};
