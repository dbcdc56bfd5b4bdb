pub mod payment_watcher;

pub use payment_watcher::{PaymentWatcher, WatchOutcome};
