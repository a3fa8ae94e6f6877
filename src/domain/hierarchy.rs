// Farm hierarchy domain model: Company -> Farm -> Flock -> Device
use serde::{Deserialize, Serialize};
use std::fmt;

pub type EntityId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: EntityId,
    pub company_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub registration_number: Option<String>,
    /// Zone manager in charge of the farm.
    #[serde(default)]
    pub responsable_id: Option<EntityId>,
    /// Livestock owner of the farm.
    #[serde(default)]
    pub ganadero_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flock {
    pub id: EntityId,
    pub farm_id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: EntityId,
    pub farm_id: EntityId,
    /// Devices not bound to a flock are shared by every flock of the farm.
    #[serde(default)]
    pub flock_id: Option<EntityId>,
    pub name: String,
}

impl Device {
    pub fn serves_flock(&self, flock_id: EntityId) -> bool {
        self.flock_id.is_none_or(|id| id == flock_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserRole {
    SuperMaster,
    Master,
    ResponsableZona,
    Ganadero,
    Other(String),
}

impl UserRole {
    pub fn parse(role: &str) -> Self {
        match role.trim() {
            "SuperMaster" => UserRole::SuperMaster,
            "Master" => UserRole::Master,
            "ResponsableZona" => UserRole::ResponsableZona,
            "Ganadero" => UserRole::Ganadero,
            other => UserRole::Other(other.to_string()),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::SuperMaster => f.write_str("SuperMaster"),
            UserRole::Master => f.write_str("Master"),
            UserRole::ResponsableZona => f.write_str("ResponsableZona"),
            UserRole::Ganadero => f.write_str("Ganadero"),
            UserRole::Other(role) => f.write_str(role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: EntityId,
    pub role: UserRole,
}

impl User {
    pub fn new(id: EntityId, role: UserRole) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(UserRole::parse("Master"), UserRole::Master);
        assert_eq!(UserRole::parse(" Ganadero "), UserRole::Ganadero);
        assert_eq!(
            UserRole::parse("Auditor"),
            UserRole::Other("Auditor".to_string())
        );
        assert_eq!(UserRole::parse("ResponsableZona").to_string(), "ResponsableZona");
    }

    #[test]
    fn test_device_serves_flock() {
        let shared = Device {
            id: 1,
            farm_id: 10,
            flock_id: None,
            name: "barn sensor".to_string(),
        };
        let bound = Device {
            flock_id: Some(5),
            ..shared.clone()
        };

        assert!(shared.serves_flock(5));
        assert!(bound.serves_flock(5));
        assert!(!bound.serves_flock(6));
    }

    #[test]
    fn test_farm_deserializes_camel_case() {
        let farm: Farm = serde_json::from_str(
            r#"{"id":1,"companyId":3,"name":"North","responsableId":7}"#,
        )
        .unwrap();
        assert_eq!(farm.responsable_id, Some(7));
        assert_eq!(farm.ganadero_id, None);
        assert_eq!(farm.registration_number, None);
    }
}
