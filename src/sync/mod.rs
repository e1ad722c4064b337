// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live synchronization: shard keys, the aggregate cache, subscription
//! lifecycle, and read accessors.

pub mod cache;
pub mod shard;
pub mod subscriptions;
pub mod view;

pub use cache::{AggregateCache, ShardState};
pub use shard::{DateWindow, ShardKey};
pub use subscriptions::SubscriptionManager;
pub use view::{ActivityEntry, CacheView};
