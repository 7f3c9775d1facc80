//! # rigshare-state: Client-Side Stores
//!
//! The cooperating stores the web client reads from and writes to. There is
//! no shared transaction: each store commits on its own and publishes a
//! change event, and dependent views re-read.
//!
//! ## Store Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Marketplace (facade)                            │
//! │                                                                         │
//! │  ┌──────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌──────────┐        │
//! │  │ listings │ │ rentals │ │ messages │ │ reviews │ │favorites │ users  │
//! │  └────┬─────┘ └────┬────┘ └────┬─────┘ └────┬────┘ └────┬─────┘        │
//! │       │            │           │            │           │              │
//! │       └────────────┴─────┬─────┴────────────┴───────────┘              │
//! │                          ▼                                              │
//! │            ┌──────────────────────────┐     ┌──────────────┐           │
//! │            │ StateBackend (memory or  │     │   EventBus   │           │
//! │            │ directory of JSON files) │     │  (broadcast) │           │
//! │            └──────────────────────────┘     └──────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use rigshare_state::{Marketplace, StateConfig};
//!
//! let mut market = Marketplace::open(&StateConfig::in_memory()).unwrap();
//! let user = market.users_mut().register("John Doe", "john@example.com").unwrap();
//! assert!(market.favorites_mut().toggle("some-listing").unwrap());
//! assert_eq!(market.users().get(&user.id).unwrap().name, "John Doe");
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod favorites;
pub mod listings;
pub mod marketplace;
pub mod messages;
pub mod rentals;
pub mod reviews;
pub mod search;
pub mod sequencer;
pub mod users;

pub use backend::{FileBackend, MemoryBackend, StateBackend};
pub use config::StateConfig;
pub use error::{StateError, StateResult};
pub use events::{EventBus, StoreEvent};
pub use favorites::FavoritesStore;
pub use listings::{ListingStore, LoadState};
pub use marketplace::{Marketplace, RentalSubmission};
pub use messages::MessageStore;
pub use rentals::{RentalGroups, RentalStore};
pub use reviews::ReviewStore;
pub use search::SearchSession;
pub use sequencer::{LatestOnly, RequestToken};
pub use users::UserDirectory;

#[cfg(test)]
pub(crate) mod testing {
    //! Backend that can be told to fail writes.

    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use crate::backend::{MemoryBackend, StateBackend};
    use crate::error::{StateError, StateResult};

    #[derive(Default)]
    pub struct FailingBackend {
        inner: MemoryBackend,
        fail_all: AtomicBool,
        failing_keys: Mutex<HashSet<String>>,
    }

    impl FailingBackend {
        pub fn fail_writes(&self, fail: bool) {
            self.fail_all.store(fail, Ordering::SeqCst);
        }

        pub fn fail_key(&self, key: &str) {
            self.failing_keys.lock().unwrap().insert(key.to_string());
        }

        fn check(&self, key: &str) -> StateResult<()> {
            if self.fail_all.load(Ordering::SeqCst) || self.failing_keys.lock().unwrap().contains(key) {
                return Err(StateError::Backend(format!("write to {key} refused")));
            }
            Ok(())
        }
    }

    impl StateBackend for FailingBackend {
        fn load(&self, key: &str) -> StateResult<Option<String>> {
            self.inner.load(key)
        }

        fn save(&self, key: &str, value: &str) -> StateResult<()> {
            self.check(key)?;
            self.inner.save(key, value)
        }

        fn remove(&self, key: &str) -> StateResult<()> {
            self.check(key)?;
            self.inner.remove(key)
        }

        fn keys_with_prefix(&self, prefix: &str) -> StateResult<Vec<String>> {
            self.inner.keys_with_prefix(prefix)
        }
    }
}
