use std::path::Path;

use anyhow::{anyhow, bail, Result};
use cats_core::CostCurve;

use crate::schema::{CsvTable, COST_COLUMNS};

/// Column layout of the CATS `gencost` matrix.
pub const GENCOST_COLUMNS: &[&str] = &["model", "startup", "shutdown", "n", "c2", "c1", "c0"];

/// Load generator cost curves, one per generator row.
///
/// `.csv` files need the cost columns by name; `.mat` files (feature `mat`)
/// hold a single matrix named after the file stem with the
/// [`GENCOST_COLUMNS`] layout.
pub fn load_gencost(path: &Path) -> Result<Vec<CostCurve>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" => load_gencost_csv(path),
        "mat" => load_gencost_mat(path),
        other => bail!(
            "unsupported gencost extension '{other}' for {}; use .csv or .mat",
            path.display()
        ),
    }
}

fn load_gencost_csv(path: &Path) -> Result<Vec<CostCurve>> {
    let table = CsvTable::read(path)?;
    table.require_all(COST_COLUMNS)?;
    let cols: Vec<usize> = COST_COLUMNS
        .iter()
        .map(|c| table.require(c))
        .collect::<std::result::Result<_, _>>()?;

    let mut curves = Vec::with_capacity(table.len());
    for (idx, record) in table.records.iter().enumerate() {
        let row = idx + 1;
        let mut values = [0.0; 6];
        for (slot, &col) in values.iter_mut().zip(&cols) {
            *slot = table.float(record, col, row)?;
        }
        curves.push(curve_from(&values));
    }
    Ok(curves)
}

fn curve_from(values: &[f64; 6]) -> CostCurve {
    CostCurve {
        startup: values[0],
        shutdown: values[1],
        n: values[2],
        c2: values[3],
        c1: values[4],
        c0: values[5],
    }
}

#[cfg(feature = "mat")]
fn load_gencost_mat(path: &Path) -> Result<Vec<CostCurve>> {
    use anyhow::Context;
    use matfile::{MatFile, NumericData};

    let object_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| anyhow!("cannot derive matrix name from {}", path.display()))?;
    let file = MatFile::parse(std::fs::File::open(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;
    let array = file
        .find_by_name(object_name)
        .ok_or_else(|| anyhow!("{object_name} array not found in {}", path.display()))?;

    let dims = array.size();
    if dims.len() != 2 || dims[1] != GENCOST_COLUMNS.len() {
        bail!(
            "{} must be an n x {} matrix, got {:?}",
            object_name,
            GENCOST_COLUMNS.len(),
            dims
        );
    }
    let values: Vec<f64> = match array.data() {
        NumericData::Double { real, .. } => real.clone(),
        NumericData::Single { real, .. } => real.iter().map(|&x| x as f64).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|&x| x as f64).collect(),
        NumericData::Int64 { real, .. } => real.iter().map(|&x| x as f64).collect(),
        _ => bail!("{object_name} has an unsupported numeric type"),
    };

    // MATLAB stores column-major; skip the `model` column.
    let rows = dims[0];
    Ok((0..rows)
        .map(|row| {
            let mut curve = [0.0; 6];
            for (slot, col) in curve.iter_mut().zip(1..GENCOST_COLUMNS.len()) {
                *slot = values[col * rows + row];
            }
            curve_from(&curve)
        })
        .collect())
}

#[cfg(not(feature = "mat"))]
fn load_gencost_mat(path: &Path) -> Result<Vec<CostCurve>> {
    Err(anyhow!(
        "reading {} requires MATLAB support; rebuild with the 'mat' feature",
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_gencost_rows_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gencost.csv");
        fs::write(
            &path,
            "MODEL,STARTUP,SHUTDOWN,N,C2,C1,C0\n2,0,0,3,0.01,20,100\n2,5,0,3,0,15,0\n",
        )
        .unwrap();
        let curves = load_gencost(&path).unwrap();
        assert_eq!(curves.len(), 2);
        assert_eq!(curves[0].c1, 20.0);
        assert_eq!(curves[1].startup, 5.0);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_gencost(Path::new("gencost.json")).unwrap_err();
        assert!(err.to_string().contains("unsupported gencost extension"));
    }
}
