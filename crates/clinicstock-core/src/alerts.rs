//! # Alert Rules
//!
//! Turns classified items into notification records for the bell menu and
//! the daily digest e-mail. One alert per item that is not `ok`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::status::{days_until_expiration, ItemStatus, ItemWithStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Expired,
    ExpiringSoon,
    LowStock,
}

impl AlertKind {
    /// Expiry alerts are gated by [`crate::plan::Feature::ExpirationAlerts`].
    pub fn is_expiry(&self) -> bool {
        matches!(self, AlertKind::Expired | AlertKind::ExpiringSoon)
    }
}

/// Ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub item_id: String,
    pub item_name: String,
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

fn alert_for(entry: &ItemWithStatus, now: DateTime<Utc>) -> Option<Alert> {
    let item = &entry.item;
    let (kind, severity, message) = match entry.status {
        ItemStatus::Ok => return None,
        ItemStatus::Expired => {
            let when = item
                .expiration_date
                .map(|d| format!(" on {}", d))
                .unwrap_or_default();
            (
                AlertKind::Expired,
                Severity::Critical,
                format!("{} expired{}", item.name, when),
            )
        }
        ItemStatus::ExpiringSoon => {
            let message = match item.expiration_date {
                Some(date) => match days_until_expiration(date, now) {
                    0 => format!("{} expires today", item.name),
                    days => format!("{} expires in {}", item.name, plural(days, "day")),
                },
                None => format!("{} expires soon", item.name),
            };
            (AlertKind::ExpiringSoon, Severity::Warning, message)
        }
        ItemStatus::LowStock => (
            AlertKind::LowStock,
            Severity::Info,
            format!("{} is running low ({} left)", item.name, item.quantity),
        ),
    };

    Some(Alert {
        item_id: item.id.clone(),
        item_name: item.name.clone(),
        kind,
        severity,
        message,
    })
}

/// Builds alerts sorted by severity, then item name, then id.
pub fn build_alerts(items: &[ItemWithStatus], now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts: Vec<Alert> = items.iter().filter_map(|e| alert_for(e, now)).collect();
    alerts.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.item_name.cmp(&b.item_name))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    alerts
}
