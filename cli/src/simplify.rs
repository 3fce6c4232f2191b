use anyhow::Result;

use geom::simplify::simplify;
use geom::{Ring, SimplificationOptions};
use parking_model::RegulationArea;

pub fn run(input: String, output: String, options_path: Option<String>) -> Result<()> {
    let opts: SimplificationOptions = match options_path {
        Some(path) => crate::read_json(&path)?,
        None => SimplificationOptions::default(),
    };
    let mut areas: Vec<RegulationArea> = crate::read_json(&input)?;

    let mut before = 0;
    let mut after = 0;
    for area in &mut areas {
        let pts = simplify(area.boundary.points(), &opts);
        before += area.boundary.points().len();
        match Ring::new(pts) {
            Ok(ring) => area.boundary = ring,
            Err(err) => warn!("Keeping the original boundary of {}: {}", area.id, err),
        }
        after += area.boundary.points().len();
    }
    info!(
        "Simplified {} boundaries from {} to {} points",
        areas.len(),
        before,
        after
    );

    crate::write_json(&output, &areas)
}
