// Role-scoped farm visibility
use super::error::CoreError;
use super::hierarchy::{Farm, User, UserRole};

/// Whether the user's role lets them see `farm`.
///
/// SuperMaster and Master see everything, ResponsableZona sees the farms they
/// manage and Ganadero sees the farms they own. Unrecognised roles are not
/// filtered.
pub fn can_see_farm(farm: &Farm, user: &User) -> bool {
    match &user.role {
        UserRole::SuperMaster | UserRole::Master | UserRole::Other(_) => true,
        UserRole::ResponsableZona => farm.responsable_id == Some(user.id),
        UserRole::Ganadero => farm.ganadero_id == Some(user.id),
    }
}

/// Restrict `farms` to those the user's role may see.
pub fn filter_farms(farms: &[Farm], user: &User) -> Vec<Farm> {
    if let UserRole::Other(role) = &user.role {
        // TODO: decide whether unknown roles should see nothing; kept permissive for now.
        tracing::warn!(
            user_id = user.id,
            role = %role,
            "Unrecognised role, farm visibility is unrestricted"
        );
    }
    farms
        .iter()
        .filter(|farm| can_see_farm(farm, user))
        .cloned()
        .collect()
}

/// Gate for queries below the farm level: flocks, devices and telemetry.
pub fn ensure_farm_visible(farm: &Farm, user: &User) -> Result<(), CoreError> {
    if can_see_farm(farm, user) {
        Ok(())
    } else {
        tracing::debug!(user_id = user.id, farm_id = farm.id, "Farm outside user scope");
        Err(CoreError::AccessDenied)
    }
}

/// Like [`filter_farms`], but an empty result caused by filtering is an
/// access error. A company with no farms at all is not.
pub fn accessible_farms(farms: &[Farm], user: &User) -> Result<Vec<Farm>, CoreError> {
    let visible = filter_farms(farms, user);
    if visible.is_empty() && !farms.is_empty() {
        return Err(CoreError::AccessDenied);
    }
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(id: i64, responsable_id: Option<i64>, ganadero_id: Option<i64>) -> Farm {
        Farm {
            id,
            company_id: 1,
            name: format!("farm {}", id),
            registration_number: None,
            responsable_id,
            ganadero_id,
        }
    }

    fn ids(farms: &[Farm]) -> Vec<i64> {
        farms.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_zone_manager_sees_own_farms() {
        let farms = vec![farm(1, Some(7), None), farm(2, Some(9), None)];
        let user = User::new(7, UserRole::ResponsableZona);
        assert_eq!(ids(&filter_farms(&farms, &user)), vec![1]);
    }

    #[test]
    fn test_ganadero_sees_owned_farms() {
        let farms = vec![
            farm(1, Some(7), Some(3)),
            farm(2, Some(7), Some(4)),
            farm(3, None, Some(3)),
        ];
        let user = User::new(3, UserRole::Ganadero);
        assert_eq!(ids(&filter_farms(&farms, &user)), vec![1, 3]);
    }

    #[test]
    fn test_masters_and_unknown_roles_see_everything() {
        let farms = vec![farm(1, Some(7), None), farm(2, None, Some(4))];
        for role in [
            UserRole::SuperMaster,
            UserRole::Master,
            UserRole::Other("Auditor".to_string()),
        ] {
            let user = User::new(99, role);
            assert_eq!(ids(&filter_farms(&farms, &user)), vec![1, 2]);
        }
    }

    #[test]
    fn test_empty_input() {
        let user = User::new(7, UserRole::ResponsableZona);
        assert!(filter_farms(&[], &user).is_empty());
        assert_eq!(accessible_farms(&[], &user), Ok(vec![]));
    }

    #[test]
    fn test_single_farm_gate() {
        let own = farm(1, Some(7), Some(3));
        let foreign = farm(2, Some(9), Some(4));

        let manager = User::new(7, UserRole::ResponsableZona);
        assert_eq!(ensure_farm_visible(&own, &manager), Ok(()));
        assert_eq!(ensure_farm_visible(&foreign, &manager), Err(CoreError::AccessDenied));

        let owner = User::new(3, UserRole::Ganadero);
        assert_eq!(ensure_farm_visible(&own, &owner), Ok(()));
        assert_eq!(ensure_farm_visible(&foreign, &owner), Err(CoreError::AccessDenied));

        let master = User::new(1, UserRole::Master);
        assert_eq!(ensure_farm_visible(&foreign, &master), Ok(()));
    }

    #[test]
    fn test_filtered_to_nothing_is_access_denied() {
        let farms = vec![farm(1, Some(9), None)];
        let user = User::new(7, UserRole::ResponsableZona);
        assert_eq!(accessible_farms(&farms, &user), Err(CoreError::AccessDenied));
    }
}
