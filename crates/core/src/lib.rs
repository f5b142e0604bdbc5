pub mod error;
pub mod event;
pub mod observation;
pub mod snapshot;
pub mod verdict;

pub use error::EngineError;
pub use event::Event;
pub use observation::{Case, DynamicObservation, StaticAttributes};
pub use snapshot::{CaseAlignment, ContextFact, ContextSnapshot};
pub use verdict::{CaseVerdict, ItemVerdict, StateEntry, Violation, ViolationKind};
