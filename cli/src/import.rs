use anyhow::Result;

use parking_model::raw::{import_areas, RawArea};

pub fn run(input: String, output: String) -> Result<()> {
    let raw: Vec<RawArea> = crate::read_json(&input)?;
    let areas = import_areas(&raw);
    if areas.is_empty() && !raw.is_empty() {
        bail!("None of the {} areas in {} could be imported", raw.len(), input);
    }
    crate::write_json(&output, &areas)
}
