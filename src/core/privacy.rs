//! Privacy controls: opt-in feature gates with an audit trail
//!
//! Everything defaults off. The guard records every check it performs so
//! callers can show what was asked for and why it was answered that way.

/// Opt-in switches for data-emitting features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrivacySettings {
    pub telemetry_enabled: bool,
    pub crash_reporting_enabled: bool,
    pub usage_analytics_enabled: bool,
    pub diagnostic_export_enabled: bool,
}

impl PrivacySettings {
    pub fn any_enabled(&self) -> bool {
        self.telemetry_enabled
            || self.crash_reporting_enabled
            || self.usage_analytics_enabled
            || self.diagnostic_export_enabled
    }

    pub fn all_disabled(&self) -> bool {
        !self.any_enabled()
    }

    /// Names of enabled features, in a fixed order
    pub fn enabled_features(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.telemetry_enabled {
            result.push("telemetry");
        }
        if self.crash_reporting_enabled {
            result.push("crash_reporting");
        }
        if self.usage_analytics_enabled {
            result.push("usage_analytics");
        }
        if self.diagnostic_export_enabled {
            result.push("diagnostic_export");
        }
        result
    }
}

/// One recorded privacy decision
#[derive(Debug, Clone)]
pub struct PrivacyAuditEntry {
    pub feature: String,
    pub was_allowed: bool,
    pub reason: String,
}

/// Enforces privacy settings and keeps an append-only audit log
#[derive(Default)]
pub struct PrivacyGuard {
    settings: PrivacySettings,
    audit_log: Vec<PrivacyAuditEntry>,
}

impl PrivacyGuard {
    pub fn new(settings: PrivacySettings) -> Self {
        Self {
            settings,
            audit_log: Vec::new(),
        }
    }

    pub fn update_settings(&mut self, settings: PrivacySettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &PrivacySettings {
        &self.settings
    }

    /// Check a feature and record the decision in the audit log
    pub fn is_allowed(&mut self, feature: &str) -> bool {
        let entry = self.check(feature);
        let allowed = entry.was_allowed;
        self.audit_log.push(entry);
        allowed
    }

    /// Check a feature without recording it
    pub fn check(&self, feature: &str) -> PrivacyAuditEntry {
        let (was_allowed, reason) = match feature {
            "telemetry" => (
                self.settings.telemetry_enabled,
                if self.settings.telemetry_enabled {
                    "telemetry opt-in"
                } else {
                    "telemetry not enabled"
                },
            ),
            "crash_reporting" => (
                self.settings.crash_reporting_enabled,
                if self.settings.crash_reporting_enabled {
                    "crash reporting opt-in"
                } else {
                    "crash reporting not enabled"
                },
            ),
            "usage_analytics" => (
                self.settings.usage_analytics_enabled,
                if self.settings.usage_analytics_enabled {
                    "usage analytics opt-in"
                } else {
                    "usage analytics not enabled"
                },
            ),
            "diagnostic_export" => (
                self.settings.diagnostic_export_enabled,
                if self.settings.diagnostic_export_enabled {
                    "diagnostic export opt-in"
                } else {
                    "diagnostic export not enabled"
                },
            ),
            _ => {
                return PrivacyAuditEntry {
                    feature: feature.to_string(),
                    was_allowed: false,
                    reason: format!("unknown feature: {}", feature),
                }
            }
        };

        PrivacyAuditEntry {
            feature: feature.to_string(),
            was_allowed,
            reason: reason.to_string(),
        }
    }

    pub fn audit_log(&self) -> &[PrivacyAuditEntry] {
        &self.audit_log
    }

    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }
}
