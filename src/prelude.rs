//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use cert_manager_operator::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{reconcile, BackoffState, Reconciler, ReconcilerError};

// Collaborator seams
pub use crate::crd_source::{CrdSource, FileCrdSource};
pub use crate::events::{EventSink, KubeEventSink, RecordingEventSink};
pub use crate::store::{InMemoryStore, KubeObjectStore, ObjectKey, ObjectStore, ResourceKind};

// Registry and synthesis
pub use crate::registry::{ComponentName, Labels, SupportedVersion};
pub use crate::synth::{synthesize, DesiredObject};

// Config types
pub use crate::config::ControllerConfig;
