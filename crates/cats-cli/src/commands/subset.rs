use std::path::PathBuf;

use anyhow::Result;
use cats_algo::run_study;
use cats_cli::cli::{StudyArgs, VariantArg};
use cats_cli::manifest::record_manifest;
use tracing::info;

pub struct SubsetOptions<'a> {
    pub study: &'a StudyArgs,
    pub variant: Option<VariantArg>,
    pub out: Option<&'a PathBuf>,
    pub import_cap: Option<f64>,
    pub load_clip: Option<f64>,
    pub no_candidates: bool,
    pub no_manifest: bool,
    pub json: bool,
}

pub fn handle(options: SubsetOptions<'_>) -> Result<()> {
    let mut config = options.study.resolve()?;
    if let Some(variant) = options.variant {
        config.reduction.variant = variant.into();
    }
    if let Some(out) = options.out {
        config.output.dir = out.clone();
    }
    if let Some(cap) = options.import_cap {
        config.reduction.import_cap = cap;
    }
    if let Some(clip) = options.load_clip {
        config.reduction.load_clip = clip;
    }
    if options.no_candidates {
        config.reduction.candidates = false;
    }
    if options.no_manifest {
        config.output.manifest = false;
    }

    let summary = run_study(&config)?;

    if config.output.manifest {
        let mut params = vec![
            ("variant", config.reduction.variant.to_string()),
            ("area", config.inputs.area.display().to_string()),
            ("buses", config.inputs.buses.display().to_string()),
            ("lines", config.inputs.lines.display().to_string()),
            ("generators", config.inputs.generators.display().to_string()),
            ("loads", config.inputs.loads.display().to_string()),
            ("import_cap", config.reduction.import_cap.to_string()),
            ("load_clip", config.reduction.load_clip.to_string()),
        ];
        if let Some(config_path) = &options.study.config {
            params.push(("config", config_path.display().to_string()));
        }
        let path = record_manifest(&config.output.dir, "subset", &summary.outputs, &params)?;
        info!("Recorded run manifest {}", path.display());
    }

    if options.json {
        println!("{}", summary.to_json()?);
    } else {
        print!("{summary}");
    }
    Ok(())
}
