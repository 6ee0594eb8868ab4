#![cfg(test)]

use std::sync::Once;

mod dataset;
mod harness;
mod stubs {
    pub mod memory;
}
mod tests {
    mod browser;
    mod listing;
    mod mutations;
    mod poller;
}

use harness::Harness;
use stubs::memory::MemoryStore;

static LOG_INIT: Once = Once::new();

fn harness() -> Harness {
    LOG_INIT.call_once(env_logger::init);

    let store = MemoryStore::default();
    dataset::populate(&store, dataset::REPO);
    Harness::new(store)
}
