pub mod bridge;
pub mod geometry;
pub mod manipulator;
pub mod mesh;
pub mod operators;
pub mod report;
pub mod scene;
pub mod session;

pub use operators::{OperatorKind, OperatorStatus};
pub use session::EditSession;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
