use std::path::Path;

use anyhow::{anyhow, Result};
use cats_core::{BusId, Line, LineId};

use crate::schema::{CsvTable, LINE_COLUMNS};

/// Load the line table.
///
/// `id` and `kv` are optional; a `geometry` column, when present, holds a WKT
/// `LINESTRING` in (lon lat) order.
pub fn load_lines(path: &Path) -> Result<Vec<Line>> {
    let table = CsvTable::read(path)?;
    table.require_all(LINE_COLUMNS)?;
    let f_bus = table.require("f_bus")?;
    let t_bus = table.require("t_bus")?;
    let r = table.require("r")?;
    let x = table.require("x")?;
    let b = table.require("b")?;
    let rate_a = table.require("rate_a")?;
    let id_col = table.column("id");
    let kv_col = table.column("kv");
    let geometry_col = table.column("geometry");

    let mut lines = Vec::with_capacity(table.len());
    for (idx, record) in table.records.iter().enumerate() {
        let row = idx + 1;
        let id = match id_col {
            Some(col) => table.id(record, col, row)?,
            None => row,
        };
        let path = match geometry_col {
            Some(col) => {
                let wkt = table.text(record, col);
                if wkt.is_empty() {
                    Vec::new()
                } else {
                    parse_linestring(wkt)
                        .map_err(|err| anyhow!("{}: row {row}: {err}", table.name()))?
                }
            }
            None => Vec::new(),
        };
        lines.push(Line {
            id: LineId::new(id),
            f_bus: BusId::new(table.id(record, f_bus, row)?),
            t_bus: BusId::new(table.id(record, t_bus, row)?),
            r: table.float(record, r, row)?,
            x: table.float(record, x, row)?,
            b: table.float(record, b, row)?,
            rate_a: table.float(record, rate_a, row)?,
            kv: match kv_col {
                Some(col) => table.float(record, col, row)?,
                None => 0.0,
            },
            path,
        });
    }
    Ok(lines)
}

/// Parse `LINESTRING (x y, x y, ...)` into coordinate pairs.
pub fn parse_linestring(wkt: &str) -> Result<Vec<[f64; 2]>> {
    let trimmed = wkt.trim();
    let body = trimmed
        .get(..10)
        .filter(|head| head.eq_ignore_ascii_case("linestring"))
        .map(|_| trimmed[10..].trim())
        .ok_or_else(|| anyhow!("expected a WKT LINESTRING, got '{trimmed}'"))?;
    let inner = body
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| anyhow!("unbalanced parentheses in '{trimmed}'"))?;

    inner
        .split(',')
        .map(|pair| {
            let mut parts = pair.split_whitespace();
            let x = parts.next().and_then(|v| v.parse::<f64>().ok());
            let y = parts.next().and_then(|v| v.parse::<f64>().ok());
            match (x, y) {
                (Some(x), Some(y)) => Ok([x, y]),
                _ => Err(anyhow!("bad coordinate '{}' in LINESTRING", pair.trim())),
            }
        })
        .collect()
}
