use std::{fs, path::Path, sync::Arc};

use anyhow::{bail, Context, Result};
use crosswalk::{Crosswalk, CrosswalkConfig, InvalidPolicy, TieBreak, ZoneId};
use tracing::{info, warn};

use crate::{
    cli::{AssignArgs, Cli, TieBreakArg},
    io::{csv, geojson},
};

/// Refuse stdout and existing files unless `force` is set.
fn check_output(path: &Path, force: bool) -> Result<()> {
    if path.as_os_str() == "-" {
        bail!("[assign] writing to stdout is not supported; pass a file path");
    }
    if path.exists() && !force {
        bail!("[assign] {} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

/// Load the JSON config file, if any, then apply flag overrides.
fn build_config(args: &AssignArgs) -> Result<CrosswalkConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let bytes = fs::read(path)
                .with_context(|| format!("[assign] Failed to read config {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("[assign] Invalid config {}", path.display()))?
        }
        None => CrosswalkConfig::default(),
    };

    if let Some(share) = args.min_share { config.min_overlap_pct = Some(share) }
    if let Some(threads) = args.threads { config.threads = Some(threads) }
    if args.abort_on_invalid { config.on_invalid = InvalidPolicy::Abort }
    if args.candidates.is_some() { config.diagnostics = true }
    match args.tie_break {
        Some(TieBreakArg::Name) => config.tie_break = TieBreak::RegionName,
        Some(TieBreakArg::Order) => config.tie_break = TieBreak::RegionOrder,
        None => {}
    }

    config.validate()?;
    Ok(config)
}

pub fn run(_cli: &Cli, args: &AssignArgs) -> Result<()> {
    let outputs = [Some(&args.output), args.candidates.as_ref(), args.errors.as_ref()];
    for path in outputs.into_iter().flatten() {
        check_output(path, args.force)?;
    }
    let config = build_config(args)?;

    info!("[assign] reading zones from {}", args.zones.display());
    let zones = geojson::read_layer::<ZoneId>(&args.zones, &args.zone_id)?;
    info!("[assign] reading regions from {}", args.regions.display());
    let regions = geojson::read_layer::<Arc<str>>(&args.regions, &args.region_name)?;

    for (layer, errors) in [("zone", &zones.errors), ("region", &regions.errors)] {
        for err in errors {
            warn!("[assign] skipped {layer} feature {}: {}", err.index, err.reason);
        }
    }

    let crosswalk = Crosswalk::new(zones.set, regions.set, config)
        .context("[assign] Failed to prepare input layers")?;
    let report = crosswalk.run()?;

    csv::write_assignments(&report.assignments, &args.output)?;
    info!("[assign] wrote {} assignments to {}", report.assignments.len(), args.output.display());

    if let Some(path) = &args.candidates {
        csv::write_candidates(report.diagnostics.as_deref().unwrap_or_default(), path)?;
        info!("[assign] wrote candidates to {}", path.display());
    }
    if let Some(path) = &args.errors {
        csv::write_errors(&zones.errors, &regions.errors, &report.errors, path)?;
        info!("[assign] wrote errors to {}", path.display());
    }

    let s = report.summary;
    info!(
        "[assign] {} zones: {} matched, {} no overlap, {} below threshold, {} degenerate; {} invalid entities, {} unreadable features",
        s.zones, s.matched, s.no_overlap, s.below_threshold, s.degenerate, s.errors,
        zones.errors.len() + regions.errors.len(),
    );

    Ok(())
}
