use anyhow::Result;
use chrono::NaiveDateTime;

use geom::{Distance, LonLat};
use parking_model::{
    calculate_deadline, interpret, next_restriction, AreaLookup, LookupConfig, Permit,
    RegulationArea,
};

pub fn run(
    areas_path: String,
    lat: f64,
    lon: f64,
    now: NaiveDateTime,
    permit_codes: Vec<String>,
    accuracy: Option<f64>,
    config_path: Option<String>,
) -> Result<()> {
    let config: LookupConfig = match config_path {
        Some(path) => crate::read_json(&path)?,
        None => LookupConfig::default(),
    };
    let areas: Vec<RegulationArea> = crate::read_json(&areas_path)?;
    let lookup = AreaLookup::new(areas, config);

    let permits: Vec<Permit> = permit_codes
        .into_iter()
        .enumerate()
        .map(|(idx, code)| Permit::new(format!("cli{}", idx), code, String::new()))
        .collect();

    let pt = LonLat::new(lon, lat);
    if !pt.is_finite() {
        bail!("Bad position {}", pt);
    }
    let accuracy = match accuracy {
        Some(x) if x.is_finite() && x >= 0.0 => Some(Distance::meters(x)),
        Some(x) => bail!("Bad accuracy {}", x),
        None => None,
    };
    let result = lookup.find_area_with_accuracy(pt, accuracy);
    println!("Confidence: {:?}", result.confidence);
    let area = match result.primary_area {
        Some(area) => area,
        None => {
            println!("No regulation areas cover {}", pt);
            return Ok(());
        }
    };
    println!("Primary area: {}", area);
    if let Some(dist) = result.boundary_distance {
        println!("Distance to its boundary: {}", dist);
    }
    for other in result.overlapping_areas.iter().skip(1) {
        println!("Also overlapping: {}", other);
    }

    let rules = interpret(area, &permits, now);
    println!();
    println!("Status: {:?}", rules.status);
    for line in &rules.summary {
        println!("  {}", line);
    }
    for warning in &rules.warnings {
        println!("Warning ({:?}): {}", warning.severity, warning.message);
    }
    for flag in &rules.conditional_flags {
        println!("Note: {}", flag.message);
    }

    println!();
    match calculate_deadline(&area.regulations, rules.status, now) {
        Some(deadline) => println!("{}", deadline),
        None => println!("No time limit applies"),
    }
    if let Some(next) = next_restriction(&area.regulations, now) {
        println!("Next restriction starts {}", next);
    }
    Ok(())
}
