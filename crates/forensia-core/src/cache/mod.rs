//! In-memory caching primitives shared by the resource controllers.
//!
//! - `TtlCell` / `KeyedTtlCache`: payloads with a fixed time-to-live
//! - `InFlightGuard` / `KeyedInFlightGuard`: one outstanding fetch per key
//!
//! Nothing here performs I/O and nothing is persisted; contents live only as
//! long as the owning controller.

pub mod cell;
pub mod guard;

pub use cell::{age_display, CachedData, KeyedTtlCache, TtlCell, DEFAULT_TTL};
pub use guard::{FlightPermit, InFlightGuard, KeyedFlightPermit, KeyedInFlightGuard};
