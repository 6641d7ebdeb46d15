use crate::config::InstituteSettings;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub institute_name: String,
    pub institute_code: String,
    pub academic_year: String,
    pub current_semester: i32,
    pub nba_threshold: f64,
    pub co_attainment_threshold: f64,
    pub po_attainment_threshold: f64,
    pub email_notifications: bool,
    pub mark_entry_reminders: bool,
    pub nba_compliance_alerts: bool,
    /// Minutes
    pub session_timeout: u32,
    pub password_policy: String,
    pub two_factor_auth: bool,
    pub backup_frequency: String,
    pub maintenance_mode: bool,
    pub debug_mode: bool,
}

impl From<&InstituteSettings> for SettingsResponse {
    fn from(settings: &InstituteSettings) -> Self {
        Self {
            institute_name: settings.institute_name.clone(),
            institute_code: settings.institute_code.clone(),
            academic_year: settings.academic_year.clone(),
            current_semester: settings.current_semester,
            nba_threshold: settings.nba_threshold,
            co_attainment_threshold: settings.co_attainment_threshold,
            po_attainment_threshold: settings.po_attainment_threshold,
            email_notifications: settings.email_notifications,
            mark_entry_reminders: settings.mark_entry_reminders,
            nba_compliance_alerts: settings.nba_compliance_alerts,
            session_timeout: settings.session_timeout,
            password_policy: settings.password_policy.clone(),
            two_factor_auth: settings.two_factor_auth,
            backup_frequency: settings.backup_frequency.clone(),
            maintenance_mode: settings.maintenance_mode,
            debug_mode: settings.debug_mode,
        }
    }
}
