mod alert_evaluator;
mod health_check;
mod notification_dispatcher;
mod ssl_check;

pub use alert_evaluator::run_alert_evaluator;
pub use health_check::run_health_check;
pub use notification_dispatcher::run_notification_dispatcher;
pub use ssl_check::run_ssl_check;
