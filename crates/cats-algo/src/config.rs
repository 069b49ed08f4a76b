//! Study configuration.
//!
//! A [`StudyConfig`] names every input file, the output directory, the
//! pipeline variant and the modeling constants. It is read from TOML; any
//! section or key left out takes its default.
//!
//! ```toml
//! [inputs]
//! buses = "data/cats/CATS_buses.csv"
//! lines = "data/cats/CATS_lines.csv"
//! generators = "data/cats/CATS_gens.csv"
//! gencost = "data/cats/CATS_gencost.csv"
//! loads = "data/cats/CATS_loads.csv"
//! area = "data/sdge_service_area.geojson"
//!
//! [output]
//! dir = "inputs"
//!
//! [reduction]
//! variant = "extended"
//! import_cap = 200.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use cats_core::{CatsError, CatsResult, BASE_MVA};
use cats_io::LoadFormat;
use cats_ts::{default_representative_days, RepresentativeDay};
use serde::{Deserialize, Serialize};

use crate::gens::DEFAULT_IMPORT_CAP;
use crate::loads::{DEFAULT_LOAD_CLIP, DEFAULT_LOAD_SCALE};

/// Which outputs the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Mirrored lines, unmerged generators, scaled loads and representative days
    #[default]
    Base,
    /// Aggregated corridors, merged generators, candidates and capacity factors
    Extended,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Variant::Base => "base",
            Variant::Extended => "extended",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    pub inputs: InputConfig,
    pub output: OutputConfig,
    pub reduction: ReductionConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub buses: PathBuf,
    pub lines: PathBuf,
    pub generators: PathBuf,
    /// Separate cost table (CSV, or `.mat` with the `mat` feature)
    pub gencost: Option<PathBuf>,
    pub loads: PathBuf,
    pub load_format: LoadFormat,
    /// GeoJSON service-area boundary
    pub area: PathBuf,
    /// Solar capacity factors at generator sites
    pub solar_gen_cf: Option<PathBuf>,
    /// Solar capacity factors at demand sites
    pub solar_demand_cf: Option<PathBuf>,
    pub wind_cf: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write `run-<uuid>.json` next to the outputs
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("inputs"),
            manifest: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    pub variant: Variant,
    /// pmax (MW) given to every import unit in the extended variant
    pub import_cap: f64,
    /// First-hour threshold of the representative-day clip
    pub load_clip: f64,
    pub base_mva: f64,
    /// Divisor applied to loads in the base variant
    pub load_scale: f64,
    /// Add candidate solar and battery units (extended variant)
    pub candidates: bool,
    pub representative_days: Vec<RepresentativeDay>,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            variant: Variant::Base,
            import_cap: DEFAULT_IMPORT_CAP,
            load_clip: DEFAULT_LOAD_CLIP,
            base_mva: BASE_MVA,
            load_scale: DEFAULT_LOAD_SCALE,
            candidates: true,
            representative_days: default_representative_days(),
        }
    }
}

impl StudyConfig {
    /// Read a config file; relative paths are resolved against its directory.
    pub fn load_from(path: &Path) -> CatsResult<Self> {
        let contents = fs::read_to_string(path).map_err(|err| {
            CatsError::Config(format!("cannot read config {}: {err}", path.display()))
        })?;
        let mut config: Self = toml::from_str(&contents)
            .map_err(|err| CatsError::Config(format!("{}: {err}", path.display())))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn to_toml(&self) -> CatsResult<String> {
        toml::to_string_pretty(self).map_err(|err| CatsError::Config(err.to_string()))
    }

    /// Prefix every relative path with `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |path: &mut PathBuf| {
            if !path.as_os_str().is_empty() && path.is_relative() {
                *path = base.join(&*path);
            }
        };
        let inputs = &mut self.inputs;
        for path in [
            &mut inputs.buses,
            &mut inputs.lines,
            &mut inputs.generators,
            &mut inputs.loads,
            &mut inputs.area,
            &mut self.output.dir,
        ] {
            join(path);
        }
        for path in [
            &mut inputs.gencost,
            &mut inputs.solar_gen_cf,
            &mut inputs.solar_demand_cf,
            &mut inputs.wind_cf,
        ]
        .into_iter()
        .flatten()
        {
            join(path);
        }
    }

    /// Required inputs exist and constants are usable.
    pub fn validate(&self) -> CatsResult<()> {
        let inputs = &self.inputs;
        let required = [
            ("buses", &inputs.buses),
            ("lines", &inputs.lines),
            ("generators", &inputs.generators),
            ("loads", &inputs.loads),
            ("area", &inputs.area),
        ];
        for (name, path) in required {
            if path.as_os_str().is_empty() {
                return Err(CatsError::Config(format!("input '{name}' is not set")));
            }
            if !path.is_file() {
                return Err(CatsError::Config(format!(
                    "input '{name}' not found: {}",
                    path.display()
                )));
            }
        }
        let optional = [
            ("gencost", &inputs.gencost),
            ("solar_gen_cf", &inputs.solar_gen_cf),
            ("solar_demand_cf", &inputs.solar_demand_cf),
            ("wind_cf", &inputs.wind_cf),
        ];
        for (name, path) in optional {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(CatsError::Config(format!(
                        "input '{name}' not found: {}",
                        path.display()
                    )));
                }
            }
        }

        let reduction = &self.reduction;
        for (name, value) in [
            ("import_cap", reduction.import_cap),
            ("load_clip", reduction.load_clip),
            ("base_mva", reduction.base_mva),
            ("load_scale", reduction.load_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CatsError::Config(format!(
                    "reduction.{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.output.dir.as_os_str().is_empty() {
            return Err(CatsError::Config("output.dir is not set".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_modeling_constants() {
        let config = StudyConfig::default();
        assert_eq!(config.reduction.variant, Variant::Base);
        assert_eq!(config.reduction.import_cap, 200.0);
        assert_eq!(config.reduction.load_clip, 30.0);
        assert_eq!(config.reduction.base_mva, 100.0);
        assert_eq!(config.reduction.load_scale, 1000.0);
        assert!(config.reduction.candidates);
        assert_eq!(config.reduction.representative_days.len(), 4);
        assert_eq!(config.inputs.load_format, LoadFormat::Cats);
    }

    #[test]
    fn partial_file_keeps_defaults_and_resolves_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.toml");
        fs::write(
            &path,
            "[inputs]\nbuses = \"data/buses.csv\"\n\n[reduction]\nvariant = \"extended\"\nimport_cap = 150.0\n",
        )
        .unwrap();
        let config = StudyConfig::load_from(&path).unwrap();
        assert_eq!(config.reduction.variant, Variant::Extended);
        assert_eq!(config.reduction.import_cap, 150.0);
        assert_eq!(config.reduction.load_clip, 30.0);
        assert_eq!(config.inputs.buses, dir.path().join("data/buses.csv"));
        assert_eq!(config.output.dir, dir.path().join("inputs"));
        assert!(config.inputs.gencost.is_none());
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("study.toml");
        fs::write(&path, "[reduction]\nvariant = \"medium\"\n").unwrap();
        let err = StudyConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, CatsError::Config(_)));
    }

    #[test]
    fn missing_inputs_fail_validation() {
        let err = StudyConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("input 'buses' is not set"));
    }

    #[test]
    fn toml_round_trip() {
        let mut config = StudyConfig::default();
        config.reduction.variant = Variant::Extended;
        let text = config.to_toml().unwrap();
        let back: StudyConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.reduction.variant, Variant::Extended);
        assert_eq!(back.reduction.representative_days[3].name, "wi");
    }
}
