//! Active alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Minor => write!(f, "Minor"),
            AlertSeverity::Moderate => write!(f, "Moderate"),
            AlertSeverity::Severe => write!(f, "Severe"),
            AlertSeverity::Extreme => write!(f, "Extreme"),
        }
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minor" => Ok(AlertSeverity::Minor),
            "moderate" => Ok(AlertSeverity::Moderate),
            "severe" => Ok(AlertSeverity::Severe),
            "extreme" => Ok(AlertSeverity::Extreme),
            other => Err(format!("Unknown alert severity: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertUrgency {
    Immediate,
    Expected,
    Future,
    Past,
}

/// A single active alert as published by an alerting upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: AlertSeverity,
    pub urgency: AlertUrgency,
    /// Type of event, e.g. "Flood Warning"
    pub event: String,
    pub onset: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// Set of alerts active around a coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertBulletin {
    pub alerts: Vec<Alert>,
    pub count: usize,
}

impl AlertBulletin {
    #[must_use]
    pub fn new(alerts: Vec<Alert>) -> Self {
        let count = alerts.len();
        Self { alerts, count }
    }

    /// An empty bulletin; the synthesizer never invents alerts
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Alerts that have not yet expired at `now`
    #[must_use]
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.expires > now).collect()
    }

    /// Highest severity among active alerts
    #[must_use]
    pub fn max_severity(&self) -> Option<AlertSeverity> {
        self.alerts.iter().map(|a| a.severity).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alert(id: &str, severity: AlertSeverity, expires_in: Duration) -> Alert {
        let now = Utc::now();
        Alert {
            id: id.to_string(),
            title: "Test alert".to_string(),
            description: "Testing".to_string(),
            severity,
            urgency: AlertUrgency::Expected,
            event: "Flood Warning".to_string(),
            onset: now,
            expires: now + expires_in,
        }
    }

    #[test]
    fn test_active_filters_expired() {
        let bulletin = AlertBulletin::new(vec![
            alert("1", AlertSeverity::Minor, Duration::hours(2)),
            alert("2", AlertSeverity::Severe, Duration::hours(-1)),
        ]);
        let active = bulletin.active_at(Utc::now());
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "1");
    }

    #[test]
    fn test_max_severity() {
        let bulletin = AlertBulletin::new(vec![
            alert("1", AlertSeverity::Minor, Duration::hours(1)),
            alert("2", AlertSeverity::Extreme, Duration::hours(1)),
        ]);
        assert_eq!(bulletin.max_severity(), Some(AlertSeverity::Extreme));
        assert_eq!(AlertBulletin::empty().max_severity(), None);
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("severe".parse::<AlertSeverity>(), Ok(AlertSeverity::Severe));
        assert_eq!("Extreme".parse::<AlertSeverity>(), Ok(AlertSeverity::Extreme));
        assert!("catastrophic".parse::<AlertSeverity>().is_err());
    }
}
