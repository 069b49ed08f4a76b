use std::path::PathBuf;

use anyhow::Result;
use cats_algo::{StudyConfig, Variant};
use cats_io::LoadFormat;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};

#[derive(Parser, Debug)]
#[command(name = "cats", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a service-area test system from the CATS tables
    Subset {
        #[command(flatten)]
        study: StudyArgs,

        /// Pipeline variant
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,

        /// Output directory
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,

        /// pmax (MW) given to import units in the extended variant
        #[arg(long)]
        import_cap: Option<f64>,

        /// First-hour load threshold for representative-day clipping
        #[arg(long)]
        load_clip: Option<f64>,

        /// Do not add candidate solar and battery units
        #[arg(long)]
        no_candidates: bool,

        /// Skip the run-<uuid>.json manifest
        #[arg(long)]
        no_manifest: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the connected components of the area-clipped line graph
    Islands {
        #[command(flatten)]
        study: StudyArgs,

        /// Print the islands as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load every configured input and report sizes and schema problems
    Inspect {
        #[command(flatten)]
        study: StudyArgs,
    },
}

/// Input selection shared by every subcommand; flags override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct StudyArgs {
    /// Study configuration (TOML)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub buses: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub lines: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub generators: Option<PathBuf>,

    /// Separate generator cost table
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub gencost: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub loads: Option<PathBuf>,

    /// Layout of the load file
    #[arg(long, value_enum)]
    pub load_format: Option<LoadFormatArg>,

    /// Service-area boundary (GeoJSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub area: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub solar_gen_cf: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub solar_demand_cf: Option<PathBuf>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub wind_cf: Option<PathBuf>,
}

impl StudyArgs {
    /// Config file (or defaults) with every flag given on the command line applied.
    pub fn resolve(&self) -> Result<StudyConfig> {
        let mut config = match &self.config {
            Some(path) => StudyConfig::load_from(path)?,
            None => StudyConfig::default(),
        };
        let inputs = &mut config.inputs;
        let required = [
            (&self.buses, &mut inputs.buses),
            (&self.lines, &mut inputs.lines),
            (&self.generators, &mut inputs.generators),
            (&self.loads, &mut inputs.loads),
            (&self.area, &mut inputs.area),
        ];
        for (flag, slot) in required {
            if let Some(path) = flag {
                *slot = path.clone();
            }
        }
        let optional = [
            (&self.gencost, &mut inputs.gencost),
            (&self.solar_gen_cf, &mut inputs.solar_gen_cf),
            (&self.solar_demand_cf, &mut inputs.solar_demand_cf),
            (&self.wind_cf, &mut inputs.wind_cf),
        ];
        for (flag, slot) in optional {
            if flag.is_some() {
                *slot = flag.clone();
            }
        }
        if let Some(format) = self.load_format {
            inputs.load_format = format.into();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Base,
    Extended,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Base => Variant::Base,
            VariantArg::Extended => Variant::Extended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoadFormatArg {
    /// Headerless complex matrix, row i = bus i
    Cats,
    /// CSV with a bus column and timestamp headers
    Table,
}

impl From<LoadFormatArg> for LoadFormat {
    fn from(arg: LoadFormatArg) -> Self {
        match arg {
            LoadFormatArg::Cats => LoadFormat::Cats,
            LoadFormatArg::Table => LoadFormat::Table,
        }
    }
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
