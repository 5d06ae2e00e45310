use super::catalog::SummitCatalog;
use super::domain::{Summit, SummitCode};
use std::collections::HashSet;

/// Catalog summits not in `activated`, in catalog order.
pub fn remaining_summits(catalog: &SummitCatalog, activated: &HashSet<SummitCode>) -> Vec<Summit> {
    catalog
        .summits()
        .iter()
        .filter(|summit| !activated.contains(&summit.code))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SummitCatalog {
        SummitCatalog::new(
            ["GM/ES-003", "GM/ES-001", "GM/CS-002"]
                .iter()
                .map(|code| Summit {
                    code: SummitCode::new(code),
                    name: format!("Hill {code}"),
                    latitude: 57.1,
                    longitude: -3.7,
                    altitude_m: 1000,
                    points: 8,
                    region: "ES".to_string(),
                })
                .collect(),
        )
        .expect("valid catalog")
    }

    #[test]
    fn keeps_catalog_order_and_attributes() {
        let catalog = catalog();
        let activated = HashSet::from([SummitCode::new("GM/ES-001")]);

        let remaining = remaining_summits(&catalog, &activated);
        let codes: Vec<_> = remaining.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["GM/ES-003", "GM/CS-002"]);
        assert_eq!(remaining[0].name, "Hill GM/ES-003");
        assert_eq!(remaining[0].points, 8);
    }

    #[test]
    fn unknown_codes_are_ignored_and_full_set_is_empty() {
        let catalog = catalog();
        let everything: HashSet<_> = catalog
            .summits()
            .iter()
            .map(|s| s.code.clone())
            .chain([SummitCode::new("GM/SS-999")])
            .collect();

        assert!(remaining_summits(&catalog, &everything).is_empty());
        assert_eq!(remaining_summits(&catalog, &HashSet::new()).len(), 3);
    }
}
