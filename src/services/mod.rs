pub mod detector;
pub mod formatter;
pub mod notification_service;
pub mod cycle_service;
pub mod scheduler;

pub use cycle_service::{CycleReport, CycleService, PendingDelivery};
pub use notification_service::{Notifier, WebhookNotifier};
pub use scheduler::Scheduler;
