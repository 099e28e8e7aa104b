//! Discord announcements for booking lifecycle changes.
//!
//! [`Announcer`] is the production [`LifecycleHook`](crate::booking::LifecycleHook):
//! after each committed change it renders a French embed and posts it to the
//! configured channel. Player names are turned into member mentions by the
//! [`IdentityResolver`], which memoizes lookups in a [`TtlCache`].

pub mod announcer;
pub mod cache;
pub mod resolver;

pub use announcer::{Announcer, DEFAULT_TIME_ZONE, DisplayZone, NotifyConfig, event_label};
pub use cache::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL, ExpiringCache, TtlCache};
pub use resolver::IdentityResolver;
