use std::collections::BTreeSet;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Ring, RenderShape};

use crate::{Permit, Regulation, RegulationKind};

/// A zone polygon or street segment carrying regulations. Loaded once and never modified.
/// Deserializing goes through `RegulationArea::new`, so loaded data is validated the same way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AreaFields")]
pub struct RegulationArea {
    /// Like "sf_rpp_q_001"
    pub id: String,
    /// Shown first when summarizing the rules. Falls back to the ID.
    pub name: String,
    pub boundary: Ring,
    pub regulations: Vec<Regulation>,
    /// Several permit areas may share one boundary.
    pub valid_permit_areas: BTreeSet<String>,
    pub requires_permit: bool,
    /// 1 to 10. Picks the primary area when several overlap.
    pub restrictiveness: u8,
}

impl RegulationArea {
    pub fn new(
        id: String,
        name: String,
        boundary: Ring,
        regulations: Vec<Regulation>,
        valid_permit_areas: BTreeSet<String>,
        requires_permit: bool,
        restrictiveness: u8,
    ) -> Result<RegulationArea> {
        if !(1..=10).contains(&restrictiveness) {
            bail!(
                "RegulationArea {} has restrictiveness {}, must be 1 to 10",
                id,
                restrictiveness
            );
        }
        Ok(RegulationArea {
            id,
            name,
            boundary,
            regulations,
            valid_permit_areas: valid_permit_areas
                .into_iter()
                .map(|code| code.trim().to_ascii_uppercase())
                .collect(),
            requires_permit,
            restrictiveness,
        })
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn is_metered(&self) -> bool {
        self.regulations
            .iter()
            .any(|r| r.kind == RegulationKind::Metered)
    }

    pub fn regulations_of(&self, kind: RegulationKind) -> impl Iterator<Item = &Regulation> {
        self.regulations.iter().filter(move |r| r.kind == kind)
    }

    pub fn accepts(&self, permit: &Permit) -> bool {
        self.valid_permit_areas
            .iter()
            .any(|code| permit.matches_area(code))
    }

    pub fn render_shape(&self) -> RenderShape {
        RenderShape {
            ring: &self.boundary,
            metered: self.is_metered(),
        }
    }
}

impl fmt::Display for RegulationArea {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({}, restrictiveness {})",
            self.display_name(),
            self.id,
            self.restrictiveness
        )
    }
}

#[derive(Deserialize)]
struct AreaFields {
    id: String,
    #[serde(default)]
    name: String,
    boundary: Ring,
    regulations: Vec<Regulation>,
    valid_permit_areas: BTreeSet<String>,
    requires_permit: bool,
    restrictiveness: u8,
}

impl TryFrom<AreaFields> for RegulationArea {
    type Error = anyhow::Error;

    fn try_from(fields: AreaFields) -> Result<RegulationArea> {
        RegulationArea::new(
            fields.id,
            fields.name,
            fields.boundary,
            fields.regulations,
            fields.valid_permit_areas,
            fields.requires_permit,
            fields.restrictiveness,
        )
    }
}

#[cfg(test)]
mod tests {
    use geom::LonLat;

    use super::*;

    fn square() -> Ring {
        Ring::new(vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(0.001, 0.0),
            LonLat::new(0.001, 0.001),
            LonLat::new(0.0, 0.001),
        ])
        .unwrap()
    }

    #[test]
    fn restrictiveness_range() {
        for (value, ok) in [(0, false), (1, true), (8, true), (10, true), (11, false)] {
            let result = RegulationArea::new(
                "a".to_string(),
                String::new(),
                square(),
                Vec::new(),
                BTreeSet::new(),
                false,
                value,
            );
            assert_eq!(result.is_ok(), ok, "restrictiveness {}", value);
        }
    }

    #[test]
    fn permit_codes_normalized() {
        let area = RegulationArea::new(
            "a".to_string(),
            String::new(),
            square(),
            vec![Regulation::new(RegulationKind::Metered)],
            vec!["q".to_string(), " R".to_string()].into_iter().collect(),
            true,
            5,
        )
        .unwrap();
        assert!(area.accepts(&Permit::new("p1", "Q", "sf")));
        assert!(area.accepts(&Permit::new("p2", "r", "sf")));
        assert!(!area.accepts(&Permit::new("p3", "S", "sf")));
        assert!(area.is_metered());
        assert!(area.render_shape().metered);
        assert_eq!(area.display_name(), "a");
    }

    #[test]
    fn loading_validates() {
        let mut json = serde_json::json!({
            "id": "a",
            "boundary": square(),
            "regulations": [],
            "valid_permit_areas": ["q"],
            "requires_permit": true,
            "restrictiveness": 5,
        });
        let area: RegulationArea = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(area.valid_permit_areas, vec!["Q".to_string()].into_iter().collect());
        assert_eq!(area.display_name(), "a");

        json["restrictiveness"] = serde_json::json!(11);
        assert!(serde_json::from_value::<RegulationArea>(json).is_err());
    }
}
