//! Raster charts embedded in the report.

pub mod canvas;
pub mod cost_diagram;
pub mod distribution;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ReportError, Result};
use crate::fonts::RasterFonts;
use crate::inventory::Inventory;

pub use cost_diagram::CostDiagram;
pub use distribution::DistributionChart;

pub const COST_DIAGRAM_FILE: &str = "cost_structure.png";
pub const RESOURCE_CHART_FILE: &str = "resource_chart.png";

/// Chart files written for one run. A `None` entry means the chart was not
/// produced and its report section is left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChartArtifacts {
    pub cost_diagram: Option<PathBuf>,
    pub resource_chart: Option<PathBuf>,
}

/// Draws both charts into `output_dir`.
///
/// The distribution chart is skipped when there are no instances; any file of
/// that name left over from an earlier run is removed.
pub fn render_charts(
    inventory: &Inventory,
    fonts: &RasterFonts,
    output_dir: &Path,
) -> Result<ChartArtifacts> {
    let diagram_path = output_dir.join(COST_DIAGRAM_FILE);
    CostDiagram::from_inventory(inventory).render(fonts, &diagram_path)?;
    debug!("Wrote {}", diagram_path.display());

    let chart_path = output_dir.join(RESOURCE_CHART_FILE);
    let resource_chart = match DistributionChart::from_inventory(inventory) {
        Some(chart) => {
            chart.render(fonts, &chart_path)?;
            debug!("Wrote {}", chart_path.display());
            Some(chart_path)
        }
        None => {
            remove_stale(&chart_path)?;
            None
        }
    };

    Ok(ChartArtifacts {
        cost_diagram: Some(diagram_path),
        resource_chart,
    })
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ReportError::io(path, err)),
    }
}
