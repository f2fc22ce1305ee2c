//! Onboarding request shapes and the fixed provisioning defaults: the
//! nine-ministry starter set and the per-country settings seed.

use serde::Deserialize;
use std::collections::HashMap;

use crate::store::{MinistrySeed, SettingsSeed};
use crate::types::{MinistryModules, MinistryType};

pub mod provision;

pub use provision::{provision, ProvisionError, ProvisionOutcome};

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardingRequest {
    pub church: ChurchFields,
    pub theme: ThemeFields,
    pub admin: AdminFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChurchFields {
    pub name: String,
    pub slug: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFields {
    pub system_name: String,
    pub primary_color: String,
    pub secondary_color: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFields {
    pub full_name: String,
    pub phone: Option<String>,
}

/// Field-level rejection of a malformed onboarding submission.
#[derive(Debug, thiserror::Error)]
#[error("invalid onboarding request")]
pub struct InvalidRequest {
    pub field_errors: HashMap<String, String>,
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl OnboardingRequest {
    /// Shape checks only. Slug validity and uniqueness belong to
    /// [`provision`], which owns those guards.
    pub fn validate(&self) -> Result<(), InvalidRequest> {
        let mut field_errors = HashMap::new();
        if self.church.name.trim().is_empty() {
            field_errors.insert("church.name".to_string(), "name is required".to_string());
        }
        if self.church.country.trim().is_empty() {
            field_errors.insert("church.country".to_string(), "country is required".to_string());
        }
        if self.theme.system_name.trim().is_empty() {
            field_errors.insert(
                "theme.systemName".to_string(),
                "system name is required".to_string(),
            );
        }
        if !is_hex_color(&self.theme.primary_color) {
            field_errors.insert(
                "theme.primaryColor".to_string(),
                "must be a #rrggbb color".to_string(),
            );
        }
        if !is_hex_color(&self.theme.secondary_color) {
            field_errors.insert(
                "theme.secondaryColor".to_string(),
                "must be a #rrggbb color".to_string(),
            );
        }
        if self.admin.full_name.trim().is_empty() {
            field_errors.insert(
                "admin.fullName".to_string(),
                "full name is required".to_string(),
            );
        }
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(InvalidRequest { field_errors })
        }
    }
}

/// Settings every new tenant starts with. Timezone follows the church's
/// country; the feature toggles are fixed policy, not user input.
pub fn settings_for_country(country: &str) -> SettingsSeed {
    let timezone = if country == "US" {
        "America/New_York"
    } else {
        "America/Sao_Paulo"
    };
    SettingsSeed {
        timezone: timezone.to_string(),
        language: "pt-BR".to_string(),
        enable_visitor_form: true,
        enable_pathfinders: false,
        enable_adventurers: false,
        enable_treasury: false,
        enable_communication: true,
    }
}

/// The nine starter ministries, instantiated verbatim for every new
/// tenant in this order with these module presets.
pub fn default_ministries() -> Vec<MinistrySeed> {
    fn seed(
        name: &str,
        ministry_type: MinistryType,
        modules: [bool; 5],
    ) -> MinistrySeed {
        let [agenda, scale, documents, reports, notifications] = modules;
        MinistrySeed {
            name: name.to_string(),
            ministry_type,
            modules: MinistryModules {
                agenda,
                scale,
                documents,
                reports,
                notifications,
            },
        }
    }

    vec![
        seed("Music", MinistryType::Music, [true, true, false, true, true]),
        seed("Media", MinistryType::Media, [true, true, false, false, true]),
        seed("Sound", MinistryType::Sound, [true, true, false, false, true]),
        seed("Broadcast", MinistryType::Broadcast, [true, true, false, false, true]),
        seed("Reception", MinistryType::Reception, [true, true, false, true, true]),
        seed("Youth", MinistryType::Youth, [true, true, true, true, true]),
        seed("Secretariat", MinistryType::Secretariat, [false, false, true, true, true]),
        seed("Eldership", MinistryType::Eldership, [true, true, true, true, true]),
        seed("Programming", MinistryType::Programming, [true, false, false, true, true]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OnboardingRequest {
        OnboardingRequest {
            church: ChurchFields {
                name: "Riverside Church".to_string(),
                slug: "Riverside Church".to_string(),
                address: None,
                city: Some("Porto Alegre".to_string()),
                state: Some("RS".to_string()),
                country: "BR".to_string(),
                phone: None,
                email: None,
            },
            theme: ThemeFields {
                system_name: "Riverside".to_string(),
                primary_color: "#1a2b3c".to_string(),
                secondary_color: "#FFffFF".to_string(),
            },
            admin: AdminFields {
                full_name: "Joana Prado".to_string(),
                phone: Some("+55 51 99999-0000".to_string()),
            },
        }
    }

    #[test]
    fn wire_shape_uses_camel_case_keys() {
        let parsed: OnboardingRequest = serde_json::from_value(serde_json::json!({
            "church": {
                "name": "Igreja Central",
                "slug": "igreja-central",
                "country": "BR",
                "city": null,
                "state": null,
                "address": null,
                "phone": null,
                "email": null
            },
            "theme": {
                "systemName": "Central",
                "primaryColor": "#112233",
                "secondaryColor": "#445566"
            },
            "admin": {
                "fullName": "Marcos Lima",
                "phone": null
            }
        }))
        .unwrap();
        assert_eq!(parsed.theme.system_name, "Central");
        assert_eq!(parsed.admin.full_name, "Marcos Lima");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn colors_must_be_six_hex_digits() {
        for bad in ["112233", "#11223", "#1122334", "#11223g", "", "#"] {
            let mut req = request();
            req.theme.primary_color = bad.to_string();
            let err = req.validate().unwrap_err();
            assert!(
                err.field_errors.contains_key("theme.primaryColor"),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn blank_required_fields_are_reported_together() {
        let mut req = request();
        req.church.name = "  ".to_string();
        req.admin.full_name = String::new();
        let err = req.validate().unwrap_err();
        assert!(err.field_errors.contains_key("church.name"));
        assert!(err.field_errors.contains_key("admin.fullName"));
        assert_eq!(err.field_errors.len(), 2);
    }

    #[test]
    fn settings_follow_the_country() {
        assert_eq!(settings_for_country("US").timezone, "America/New_York");
        assert_eq!(settings_for_country("BR").timezone, "America/Sao_Paulo");
        assert_eq!(settings_for_country("PT").timezone, "America/Sao_Paulo");

        let seed = settings_for_country("BR");
        assert_eq!(seed.language, "pt-BR");
        assert!(seed.enable_visitor_form);
        assert!(seed.enable_communication);
        assert!(!seed.enable_pathfinders);
        assert!(!seed.enable_adventurers);
        assert!(!seed.enable_treasury);
    }

    #[test]
    fn starter_set_is_nine_ministries_in_fixed_order() {
        let seeds = default_ministries();
        let types: Vec<MinistryType> = seeds.iter().map(|s| s.ministry_type).collect();
        assert_eq!(
            types,
            vec![
                MinistryType::Music,
                MinistryType::Media,
                MinistryType::Sound,
                MinistryType::Broadcast,
                MinistryType::Reception,
                MinistryType::Youth,
                MinistryType::Secretariat,
                MinistryType::Eldership,
                MinistryType::Programming,
            ]
        );

        let secretariat = &seeds[6];
        assert!(!secretariat.modules.agenda);
        assert!(!secretariat.modules.scale);
        assert!(secretariat.modules.documents);
        assert!(secretariat.modules.reports);
        assert!(secretariat.modules.notifications);

        let youth = &seeds[5];
        assert!(youth.modules.agenda && youth.modules.scale && youth.modules.documents);
    }
}
