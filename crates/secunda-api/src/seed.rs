//! # Demo Dataset
//!
//! Loads a small directory (six buildings, the activity tree rooted at
//! "Главная категория", a dozen organizations) through the services, so
//! every write passes the same validation as API traffic.
//!
//! Seeding is idempotent. Buildings are matched by address, activities by
//! name and parent, organizations by exact name. Existing organizations
//! are moved to the listed building and get the listed phones.

use std::collections::BTreeMap;

use secunda_core::filter::MAX_PAGE_LIMIT;
use secunda_core::{
    Activity, ActivityId, Building, BuildingId, DirectoryError, NewActivity, NewBuilding,
    NewOrganization, Organization, OrganizationFilter, OrganizationPatch, Page,
};

use crate::state::AppState;

const BUILDINGS: &[(&str, f64, f64)] = &[
    ("г. Москва, ул. Ленина 1", 55.7558, 37.6176),
    ("г. Москва, ул. Тверская 10", 55.7570, 37.6150),
    ("г. Москва, пр-т Мира 50", 55.7890, 37.6320),
    ("г. Санкт-Петербург, Невский проспект 100", 59.9340, 30.3350),
    ("г. Новосибирск, Красный проспект 1", 55.0300, 82.9200),
    ("г. Екатеринбург, ул. Ленина 50", 56.8380, 60.6050),
];

const ROOT_ACTIVITY: &str = "Главная категория";

/// Second-level activities under the root, each with its leaves.
const ACTIVITY_TREE: &[(&str, &[&str])] = &[
    ("Еда", &["Мясная продукция", "Молочная продукция"]),
    ("Автомобили", &["Грузовые", "Легковые"]),
    ("Услуги", &["Ремонт", "Доставка"]),
    ("Спорту", &["Экипировка", "Фитнес"]),
];

struct OrganizationSeed {
    name: &'static str,
    address: &'static str,
    phones: &'static [&'static str],
    /// Names absent from the tree are skipped.
    activities: &'static [&'static str],
}

const ORGANIZATIONS: &[OrganizationSeed] = &[
    OrganizationSeed {
        name: "ЕдаМаркет",
        address: "г. Москва, ул. Ленина 1",
        phones: &["2-222-222", "8-923-666-13-13"],
        activities: &["Еда"],
    },
    OrganizationSeed {
        name: "Мясной рай",
        address: "г. Москва, ул. Ленина 1",
        phones: &["3-333-333"],
        activities: &["Мясная продукция"],
    },
    OrganizationSeed {
        name: "Молочка+",
        address: "г. Москва, ул. Тверская 10",
        phones: &["8-900-111-22-33"],
        activities: &["Молочная продукция"],
    },
    OrganizationSeed {
        name: "АвтоГруз",
        address: "г. Москва, пр-т Мира 50",
        phones: &["+7-495-000-00-01"],
        activities: &["Грузовые"],
    },
    OrganizationSeed {
        name: "Запчасти 24",
        address: "г. Москва, пр-т Мира 50",
        phones: &["+7-495-000-00-02"],
        activities: &["Запчасти"],
    },
    OrganizationSeed {
        name: "Аксессуары PRO",
        address: "г. Москва, ул. Тверская 10",
        phones: &["+7-495-000-00-03"],
        activities: &["Аксессуары"],
    },
    OrganizationSeed {
        name: "Фитнес-спорт",
        address: "г. Санкт-Петербург, Невский проспект 100",
        phones: &["+7-812-777-77-77"],
        activities: &["Фитнес"],
    },
    OrganizationSeed {
        name: "Сервис Ремонт",
        address: "г. Новосибирск, Красный проспект 1",
        phones: &["+7-383-222-22-22"],
        activities: &["Ремонт"],
    },
    OrganizationSeed {
        name: "ДоставкаЕды",
        address: "г. Москва, ул. Ленина 1",
        phones: &["+7-999-123-45-67"],
        activities: &["Еда", "Доставка"],
    },
    OrganizationSeed {
        name: "Еда маркет",
        address: "г. Екатеринбург, ул. Ленина 50",
        phones: &["+7-343-100-00-01"],
        activities: &["Еда"],
    },
    OrganizationSeed {
        name: "NullActivities",
        address: "г. Новосибирск, Красный проспект 1",
        phones: &[],
        activities: &[],
    },
    OrganizationSeed {
        name: "БлизкоКЦентру",
        address: "г. Москва, ул. Тверская 10",
        phones: &["+7-495-000-00-04"],
        activities: &["Молочная продукция"],
    },
];

/// Counts reported after a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub buildings_created: usize,
    pub activities_created: usize,
    pub organizations_created: usize,
    pub organizations_updated: usize,
}

/// Load the demo dataset into the store behind `state`.
pub async fn seed(state: &AppState) -> Result<SeedSummary, DirectoryError> {
    let mut summary = SeedSummary::default();
    let buildings = seed_buildings(state, &mut summary).await?;
    let activities = seed_activities(state, &mut summary).await?;
    seed_organizations(state, &buildings, &activities, &mut summary).await?;

    tracing::info!(
        buildings_created = summary.buildings_created,
        activities_created = summary.activities_created,
        organizations_created = summary.organizations_created,
        organizations_updated = summary.organizations_updated,
        "seed complete"
    );
    Ok(summary)
}

async fn seed_buildings(
    state: &AppState,
    summary: &mut SeedSummary,
) -> Result<BTreeMap<&'static str, BuildingId>, DirectoryError> {
    let existing = all_buildings(state).await?;
    let mut by_address = BTreeMap::new();

    for &(address, latitude, longitude) in BUILDINGS {
        let id = match existing.iter().find(|b| b.address == address) {
            Some(building) => building.id,
            None => {
                summary.buildings_created += 1;
                state
                    .buildings
                    .create(NewBuilding {
                        address: address.to_string(),
                        latitude,
                        longitude,
                    })
                    .await?
                    .id
            }
        };
        by_address.insert(address, id);
    }
    Ok(by_address)
}

async fn seed_activities(
    state: &AppState,
    summary: &mut SeedSummary,
) -> Result<BTreeMap<&'static str, ActivityId>, DirectoryError> {
    let mut existing = all_activities(state).await?;
    let mut by_name = BTreeMap::new();

    let root = ensure_activity(state, &mut existing, summary, ROOT_ACTIVITY, None).await?;
    by_name.insert(ROOT_ACTIVITY, root);

    for &(group, leaves) in ACTIVITY_TREE {
        let group_id = ensure_activity(state, &mut existing, summary, group, Some(root)).await?;
        by_name.insert(group, group_id);
        for &leaf in leaves {
            let leaf_id =
                ensure_activity(state, &mut existing, summary, leaf, Some(group_id)).await?;
            by_name.insert(leaf, leaf_id);
        }
    }
    Ok(by_name)
}

async fn ensure_activity(
    state: &AppState,
    existing: &mut Vec<Activity>,
    summary: &mut SeedSummary,
    name: &str,
    parent_id: Option<ActivityId>,
) -> Result<ActivityId, DirectoryError> {
    if let Some(activity) = existing
        .iter()
        .find(|a| a.name == name && a.parent_id == parent_id)
    {
        return Ok(activity.id);
    }
    let activity = state
        .activities
        .create(NewActivity {
            name: name.to_string(),
            parent_id,
        })
        .await?;
    summary.activities_created += 1;
    let id = activity.id;
    existing.push(activity);
    Ok(id)
}

async fn seed_organizations(
    state: &AppState,
    buildings: &BTreeMap<&'static str, BuildingId>,
    activities: &BTreeMap<&'static str, ActivityId>,
    summary: &mut SeedSummary,
) -> Result<(), DirectoryError> {
    for row in ORGANIZATIONS {
        let building_id = *buildings.get(row.address).ok_or_else(|| {
            DirectoryError::Unexpected(format!("seed address {:?} has no building", row.address))
        })?;
        let phones: Vec<String> = row.phones.iter().map(|p| p.to_string()).collect();
        let activity_ids: Vec<ActivityId> = row
            .activities
            .iter()
            .filter_map(|name| activities.get(name).copied())
            .collect();

        match find_organization(state, row.name).await? {
            Some(existing) => {
                state
                    .organizations
                    .update(
                        existing.id,
                        OrganizationPatch {
                            name: None,
                            building_id: Some(building_id),
                            phones: Some(phones),
                            activity_ids: (!activity_ids.is_empty()).then_some(activity_ids),
                        },
                    )
                    .await?;
                summary.organizations_updated += 1;
            }
            None => {
                state
                    .organizations
                    .create(NewOrganization {
                        name: row.name.to_string(),
                        building_id,
                        phones,
                        activity_ids,
                    })
                    .await?;
                summary.organizations_created += 1;
            }
        }
    }
    Ok(())
}

/// The organization named exactly `name`, if any.
async fn find_organization(
    state: &AppState,
    name: &str,
) -> Result<Option<Organization>, DirectoryError> {
    let filter = OrganizationFilter {
        organization_name: Some(name.to_string()),
        ..OrganizationFilter::default()
    };
    let mut offset = 0;
    loop {
        let page = Page::new(offset, MAX_PAGE_LIMIT)?;
        let batch = state.organizations.filter(&filter, page).await?;
        let exhausted = batch.len() < MAX_PAGE_LIMIT as usize;
        if let Some(found) = batch.into_iter().find(|o| o.name == name) {
            return Ok(Some(found));
        }
        if exhausted {
            return Ok(None);
        }
        offset += u64::from(MAX_PAGE_LIMIT);
    }
}

async fn all_buildings(state: &AppState) -> Result<Vec<Building>, DirectoryError> {
    let mut all = Vec::new();
    loop {
        let page = Page::new(all.len() as u64, MAX_PAGE_LIMIT)?;
        let batch = state.buildings.list(page).await?;
        let exhausted = batch.len() < MAX_PAGE_LIMIT as usize;
        all.extend(batch);
        if exhausted {
            return Ok(all);
        }
    }
}

async fn all_activities(state: &AppState) -> Result<Vec<Activity>, DirectoryError> {
    let mut all = Vec::new();
    loop {
        let page = Page::new(all.len() as u64, MAX_PAGE_LIMIT)?;
        let batch = state.activities.list(page).await?;
        let exhausted = batch.len() < MAX_PAGE_LIMIT as usize;
        all.extend(batch);
        if exhausted {
            return Ok(all);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_run_creates_everything() {
        let state = AppState::new();
        let summary = seed(&state).await.unwrap();
        assert_eq!(summary.buildings_created, 6);
        assert_eq!(summary.activities_created, 13);
        assert_eq!(summary.organizations_created, 12);
        assert_eq!(summary.organizations_updated, 0);
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let state = AppState::new();
        seed(&state).await.unwrap();
        let again = seed(&state).await.unwrap();
        assert_eq!(again.buildings_created, 0);
        assert_eq!(again.activities_created, 0);
        assert_eq!(again.organizations_created, 0);
        assert_eq!(again.organizations_updated, 12);

        let organizations = state
            .organizations
            .filter(&OrganizationFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(organizations.len(), 12);
    }

    #[tokio::test]
    async fn food_search_reaches_the_meat_shop() {
        let state = AppState::new();
        seed(&state).await.unwrap();
        let found = state
            .organizations
            .search_by_activity_name("еда", Page::default())
            .await
            .unwrap();
        let names: Vec<&str> = found.iter().map(|o| o.name.as_str()).collect();
        assert!(names.contains(&"Мясной рай"));
        assert!(names.contains(&"Молочка+"));
        assert!(!names.contains(&"АвтоГруз"));
    }

    #[tokio::test]
    async fn unknown_activity_names_are_skipped() {
        let state = AppState::new();
        seed(&state).await.unwrap();
        let parts = find_organization(&state, "Запчасти 24")
            .await
            .unwrap()
            .unwrap();
        let details = state.organizations.get(parts.id).await.unwrap();
        assert!(details.activity_ids.is_empty());
    }

    #[tokio::test]
    async fn exact_name_match_distinguishes_similar_names() {
        let state = AppState::new();
        seed(&state).await.unwrap();
        let market = find_organization(&state, "Еда маркет").await.unwrap().unwrap();
        assert_eq!(market.name, "Еда маркет");
        assert!(find_organization(&state, "Еда").await.unwrap().is_none());
    }
}
