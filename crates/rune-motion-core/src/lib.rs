//! Navigation-gated entrance/exit animation orchestration.
//!
//! This crate provides:
//! - **Element registry**: live animated elements, parent/child indexes and
//!   per-scope duration aggregates
//! - **Animation controllers**: the per-element lifecycle state machine and
//!   interaction excursions
//! - **Stagger coordination**: ordered, delayed dispatch of child entrances
//! - **Navigation gate**: route changes held back until outgoing exits
//!   resolve or a fallback deadline passes
//! - **Retention**: hooks keeping the outgoing view alive while it animates
//!
//! # Architecture
//!
//! ```text
//! MotionRuntime
//!   ├── ElementRegistry
//!   │     └── AnimationController (one per element)
//!   ├── NavigationGate ── RetentionAdapter / RouteCommitter
//!   ├── VisualEngine (TimelineEngine or host engine)
//!   └── EventQueue
//! ```
//!
//! # Example
//!
//! ```
//! use rune_motion_core::{
//!     AnimatedElement, MemoryRouter, MotionConfig, MotionRuntime, ScopeId, TimelineEngine,
//!     ViewRetainer, VisualState,
//! };
//!
//! let mut runtime = MotionRuntime::new(
//!     MotionConfig::default(),
//!     TimelineEngine::new(),
//!     ViewRetainer::new(),
//!     MemoryRouter::new("/home".into()),
//!     "/home".into(),
//! );
//! runtime.mount(
//!     AnimatedElement::new("title", ScopeId::new("home"))
//!         .with_exit(VisualState::new().with("opacity", 0.0)),
//! );
//! runtime.tick(0.0);
//!
//! let mut ticket = runtime.request_navigation("/work");
//! let mut now = 0.0;
//! while ticket.try_outcome().is_none() {
//!     now += 16.0;
//!     runtime.tick(now);
//! }
//! assert_eq!(runtime.current_location().as_str(), "/work");
//! ```

pub mod controller;
pub mod easing;
pub mod engine;
pub mod error;
pub mod events;
pub mod gate;
pub mod registry;
pub mod retention;
pub mod router;
pub mod runtime;
pub mod signal;
pub mod stagger;
pub mod transition;
pub mod types;
pub mod value;
pub mod variant;

pub use controller::{AnimationController, ControllerContext, Interaction};
pub use easing::EasingFunction;
pub use engine::{Completion, TimelineEngine, TweenId, TweenOptions, VisualEngine};
pub use error::{CommitError, EngineError, MotionError, Result, ValueError};
pub use events::{BarrierRelease, ElementEvent, EventQueue, GateEvent, MotionEvent};
pub use gate::{GateContext, NavigationGate, NavigationRequest, RequestStatus};
pub use registry::{AnimatedElement, ElementRegistry};
pub use retention::{NoRetention, RetentionAdapter, ViewHandle, ViewRetainer};
pub use router::{MemoryRouter, RouteCommitter};
pub use runtime::MotionRuntime;
pub use signal::{CancelReason, ExitOutcome, ExitSignal, NavigationOutcome, NavigationTicket};
pub use stagger::{StaggerParams, StaggerPlan};
pub use transition::{OrderingPolicy, Repeat, StaggerDirection, TransitionSpec};
pub use types::{ElementId, ElementStatus, Generation, Location, Millis, RequestId, ScopeId};
pub use value::{MotionValue, PropertyMap, RawValue};
pub use variant::VisualState;

pub use rune_config::{CollisionPolicy, MotionConfig};
