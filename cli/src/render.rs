use anyhow::Result;
use serde::Serialize;

use geom::clip::{bounding_boxes_overlap, has_priority, subtract};
use geom::simplify::simplify;
use geom::{LonLat, Ring, SimplificationOptions};
use parking_model::RegulationArea;

/// The non-overlapping outline pieces of one area, ready to draw.
#[derive(Serialize)]
struct RenderedArea {
    id: String,
    metered: bool,
    pieces: Vec<Vec<LonLat>>,
}

pub fn run(input: String, output: String, options_path: Option<String>) -> Result<()> {
    let opts: SimplificationOptions = match options_path {
        Some(path) => crate::read_json(&path)?,
        None => SimplificationOptions::default(),
    };
    let mut areas: Vec<RegulationArea> = crate::read_json(&input)?;
    for area in &mut areas {
        match Ring::new(simplify(area.boundary.points(), &opts)) {
            Ok(ring) => area.boundary = ring,
            Err(err) => warn!("Keeping the original boundary of {}: {}", area.id, err),
        }
    }

    let mut rendered = Vec::new();
    let mut cut = 0;
    for (idx, area) in areas.iter().enumerate() {
        let mut pieces = vec![area.boundary.points().to_vec()];
        for (other_idx, other) in areas.iter().enumerate() {
            if idx == other_idx
                || !bounding_boxes_overlap(area.boundary.points(), other.boundary.points(), 0.0)
                || !has_priority(other.render_shape(), area.render_shape())
            {
                continue;
            }
            pieces = pieces
                .into_iter()
                .flat_map(|piece| subtract(&piece, other.boundary.points()))
                .collect();
        }
        if pieces.len() != 1 || pieces[0] != area.boundary.points() {
            cut += 1;
        }
        rendered.push(RenderedArea {
            id: area.id.clone(),
            metered: area.is_metered(),
            pieces,
        });
    }
    info!(
        "Cut {} of {} areas around the ones drawn on top of them",
        cut,
        rendered.len()
    );

    crate::write_json(&output, &rendered)
}
