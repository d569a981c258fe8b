mod alert_channel;
mod alert_rule;
mod check;
mod incident;
mod monitor;
mod tenant;

pub use alert_channel::{AlertChannel, ChannelType, CreateAlertChannel};
pub use alert_rule::{AlertRule, CreateAlertRule, TriggerType};
pub use check::MonitorCheck;
pub use incident::Incident;
pub use monitor::{CreateMonitor, Monitor, MonitorType, UpdateMonitor};
pub use tenant::{Role, Tenant, TenantUser, User};
