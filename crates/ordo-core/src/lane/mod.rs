// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Lane Abstraction
//!
//! A **Lane** is one swappable mesh-processing pass. The optimizer pipeline
//! keeps its passes in a [`LaneRegistry`] and drives each of them through the
//! same lifecycle, passing data in and out through a [`LaneContext`].
//!
//! A lane that cannot apply to a mesh does not fail: it leaves the mesh
//! untouched and reports why through its own outcome type placed in the
//! context. [`LaneError`] is reserved for a malformed context.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ordo_core::lane::{Lane, LaneContext, LaneError, LaneKind};
//! use ordo_core::Geometry;
//!
//! struct ClearPrimitives;
//!
//! impl Lane for ClearPrimitives {
//!     fn strategy_name(&self) -> &'static str { "ClearPrimitives" }
//!     fn lane_kind(&self) -> LaneKind { LaneKind::Indexing }
//!
//!     fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError> {
//!         let geometry = ctx
//!             .get_mut::<Geometry>()
//!             .ok_or(LaneError::missing("Geometry"))?;
//!         geometry.set_primitive_sets(Vec::new());
//!         Ok(())
//!     }
//!
//!     fn as_any(&self) -> &dyn std::any::Any { self }
//!     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Error type for lane operations.
#[derive(Debug)]
pub enum LaneError {
    /// The context passed to the lane lacks an entry or holds the wrong type.
    InvalidContext {
        /// What the lane expected.
        expected: &'static str,
        /// Description of what was received.
        received: String,
    },
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::InvalidContext { expected, received } => {
                write!(
                    f,
                    "Invalid lane context: expected {expected}, got {received}"
                )
            }
        }
    }
}

impl std::error::Error for LaneError {}

impl LaneError {
    /// Convenience constructor for a missing context entry.
    pub fn missing(type_name: &'static str) -> Self {
        LaneError::InvalidContext {
            expected: type_name,
            received: "not found in LaneContext".into(),
        }
    }
}

/// Classification of mesh passes, used for routing and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Vertex deduplication and conversion to indexed triangles.
    Indexing,
    /// Triangle reordering for post-transform cache reuse.
    CacheOrdering,
    /// Vertex renumbering for sequential fetch.
    AccessOrdering,
    /// Read-only measurements.
    Diagnostics,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Indexing => write!(f, "Indexing"),
            LaneKind::CacheOrdering => write!(f, "CacheOrdering"),
            LaneKind::AccessOrdering => write!(f, "AccessOrdering"),
            LaneKind::Diagnostics => write!(f, "Diagnostics"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LaneContext
// ─────────────────────────────────────────────────────────────────────────────

/// A type-keyed bag of owned values handed to a lane.
///
/// The pipeline moves the [`Geometry`](crate::Geometry) being processed into
/// the context, runs a lane, then takes it back out together with whatever
/// outcome the lane recorded.
///
/// ```rust,ignore
/// let mut ctx = LaneContext::new();
/// ctx.insert(geometry);
/// lane.execute(&mut ctx)?;
/// let geometry = ctx.remove::<Geometry>().unwrap();
/// ```
pub struct LaneContext {
    data: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl LaneContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    /// Inserts a value, keyed by its concrete type.
    ///
    /// If a value of the same type was already present, it is replaced.
    pub fn insert<T: 'static + Send + Sync>(&mut self, value: T) {
        self.data.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a shared reference to a value by type.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.data.get(&TypeId::of::<T>())?.downcast_ref()
    }

    /// Returns a mutable reference to a value by type.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.data.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    /// Checks whether a value of the given type is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.data.contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a value by type.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.data
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast().ok().map(|b| *b))
    }
}

impl Default for LaneContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LaneContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneContext")
            .field("entries", &self.data.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LaneRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// An ordered collection of [`Lane`] trait objects.
///
/// Registration order is execution order for the pipeline.
pub struct LaneRegistry {
    lanes: Vec<Box<dyn Lane>>,
}

impl LaneRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { lanes: Vec::new() }
    }

    /// Adds a lane to the registry.
    pub fn register(&mut self, lane: Box<dyn Lane>) {
        self.lanes.push(lane);
    }

    /// Finds a lane by its strategy name.
    pub fn get(&self, name: &str) -> Option<&dyn Lane> {
        self.lanes
            .iter()
            .find(|l| l.strategy_name() == name)
            .map(|b| b.as_ref())
    }

    /// Returns a slice of all registered lanes.
    pub fn all(&self) -> &[Box<dyn Lane>] {
        &self.lanes
    }

    /// Returns the number of registered lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Returns `true` if no lanes are registered.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl Default for LaneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LaneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.lanes.iter().map(|l| l.strategy_name()))
            .finish()
    }
}

/// Base trait for every mesh pass.
///
/// ## Lifecycle
///
/// ```text
/// on_initialize(ctx)  →  [ execute(ctx) ]*  →  on_shutdown(ctx)
/// ```
///
/// Lanes hold no per-mesh state between `execute` calls, with the exception
/// of diagnostic lanes that accumulate totals on purpose.
pub trait Lane: Send + Sync {
    /// Human-readable name identifying this lane's strategy.
    ///
    /// Used for logging and as the `pass` label of telemetry metrics.
    fn strategy_name(&self) -> &'static str;

    /// The kind of processing this lane performs.
    fn lane_kind(&self) -> LaneKind;

    /// Estimated relative cost of running this lane on the mesh in `ctx`.
    ///
    /// Default returns `1.0`.
    fn estimate_cost(&self, _ctx: &LaneContext) -> f32 {
        1.0
    }

    // --- Lifecycle ---

    /// Called once before the first `execute`.
    fn on_initialize(&self, _ctx: &mut LaneContext) -> Result<(), LaneError> {
        Ok(())
    }

    /// Runs the pass on the data found in `ctx`.
    fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError>;

    /// Called when the owning pipeline is dropped or reset.
    fn on_shutdown(&self, _ctx: &mut LaneContext) {}

    // --- Downcasting ---

    /// Downcast to a concrete type for type-specific operations.
    fn as_any(&self) -> &dyn Any;

    /// Downcast to a concrete type (mutable) for type-specific operations.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting;

    impl Lane for Counting {
        fn strategy_name(&self) -> &'static str {
            "Counting"
        }

        fn lane_kind(&self) -> LaneKind {
            LaneKind::Diagnostics
        }

        fn execute(&self, ctx: &mut LaneContext) -> Result<(), LaneError> {
            let value = ctx.get_mut::<u32>().ok_or(LaneError::missing("u32"))?;
            *value += 1;
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_context_round_trip() {
        let mut ctx = LaneContext::new();
        ctx.insert(7u32);
        ctx.insert(String::from("mesh"));

        assert!(ctx.contains::<u32>());
        assert_eq!(ctx.get::<String>().map(String::as_str), Some("mesh"));
        assert_eq!(ctx.remove::<u32>(), Some(7));
        assert!(!ctx.contains::<u32>());
    }

    #[test]
    fn test_execute_reports_missing_entry() {
        let lane = Counting;
        let mut ctx = LaneContext::new();

        let err = lane.execute(&mut ctx).unwrap_err();
        assert!(
            err.to_string().contains("expected u32"),
            "Unexpected message: {err}"
        );

        ctx.insert(1u32);
        lane.execute(&mut ctx).unwrap();
        assert_eq!(ctx.get::<u32>(), Some(&2));
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = LaneRegistry::new();
        registry.register(Box::new(Counting));

        assert_eq!(registry.len(), 1);
        assert!(registry.get("Counting").is_some());
        assert!(registry.get("Other").is_none());
        assert_eq!(
            registry.get("Counting").map(|l| l.lane_kind()),
            Some(LaneKind::Diagnostics)
        );
    }
}
