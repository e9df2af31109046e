use std::path::PathBuf;

/// Zone-to-region crosswalk CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "crosswalk", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Assign every zone to the region it overlaps most (forbids stdout)
    Assign(AssignArgs),
}

/// Secondary key for zones split evenly between regions.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreakArg {
    /// Smallest region name wins
    Name,
    /// First region in the input file wins
    Order,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Zone layer (GeoJSON FeatureCollection of polygons)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub zones: PathBuf,

    /// Region layer (GeoJSON FeatureCollection of polygons)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Zone property holding the unique zone identifier
    #[arg(long)]
    pub zone_id: String,

    /// Region property holding the region name
    #[arg(long)]
    pub region_name: String,

    /// Output assignments CSV
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Leave zones unassigned when the best region covers less than this share
    #[arg(long, value_name = "F")]
    pub min_share: Option<f64>,

    /// Tie-break rule for evenly split zones
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreakArg>,

    /// Worker threads (defaults to one per core)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Fail on the first invalid polygon instead of skipping it
    #[arg(long)]
    pub abort_on_invalid: bool,

    /// Also write every zone's scored candidate regions to this CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub candidates: Option<PathBuf>,

    /// Also write rejected zones and regions to this CSV
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub errors: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,
}
