use std::io::{self, Write};

use anyhow::Result;
use cats_algo::area_islands;
use cats_cli::cli::StudyArgs;
use cats_core::graph_utils::IslandSummary;
use cats_io::{load_buses, load_lines, load_service_area};
use tabwriter::TabWriter;

pub fn handle(study: &StudyArgs, json: bool) -> Result<()> {
    let config = study.resolve()?;
    let buses = load_buses(&config.inputs.buses)?;
    let lines = load_lines(&config.inputs.lines)?;
    let area = load_service_area(&config.inputs.area)?;
    let islands = area_islands(&area, &lines, &buses);
    let summaries: Vec<IslandSummary> = islands.iter().map(IslandSummary::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No lines of the network intersect '{}'", area.name);
        return Ok(());
    }
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "ISLAND\tBUSES\tMIN BUS\tKEPT")?;
    for summary in &summaries {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            summary.island_id,
            summary.node_count,
            summary.min_bus,
            if summary.island_id == 0 { "yes" } else { "" }
        )?;
    }
    writer.flush()?;
    Ok(())
}
