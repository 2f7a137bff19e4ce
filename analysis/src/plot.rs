#[cfg(test)]
mod plot_test;

use crate::nested::{count_tasklets, performance, DpuMap, Nested};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const TITLE_HEIGHT: u32 = 40;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Benchmark {0} has no series to plot")]
    Empty(String),
    #[error("Plot of {benchmark} with {rows}x{columns} cells does not fit in u32 pixels")]
    TooLarge {
        benchmark: String,
        rows: usize,
        columns: usize,
    },
    #[error("Failed to draw {path:?}: {message}")]
    Draw { path: PathBuf, message: String },
}

/// Renders one grid of normalized performance plots per benchmark
#[derive(Debug, Clone)]
pub struct Plotter {
    output: PathBuf,
    cell: (u32, u32),
}

impl Plotter {
    pub fn new(output: impl Into<PathBuf>, cell_width: u32, cell_height: u32) -> Self {
        Self {
            output: output.into(),
            cell: (cell_width, cell_height),
        }
    }

    /// `<output>/plot_<benchmark>.svg`
    pub fn path_for(&self, benchmark: &str) -> PathBuf {
        self.output.join(format!("plot_{benchmark}.svg"))
    }

    /// plot every benchmark, returns the written files
    #[tracing::instrument(level = "info", skip_all, fields(output = ?self.output))]
    pub fn plot_all(&self, nested: &Nested) -> Result<Vec<PathBuf>, PlotError> {
        nested
            .iter()
            .map(|(benchmark, dpus)| {
                info!("Plotting {benchmark}");

                self.plot_benchmark(benchmark, dpus)
            })
            .collect()
    }

    /// Grid with one row per dpu count and one column per tasklet count
    pub fn plot_benchmark(&self, benchmark: &str, dpus: &DpuMap) -> Result<PathBuf, PlotError> {
        let rows = dpus.len();
        let columns = count_tasklets(dpus);

        if rows == 0 || columns == 0 {
            return Err(PlotError::Empty(benchmark.to_string()));
        }

        let size = self
            .canvas_size(rows, columns)
            .ok_or_else(|| PlotError::TooLarge {
                benchmark: benchmark.to_string(),
                rows,
                columns,
            })?;

        let path = self.path_for(benchmark);
        debug!(rows = rows, columns = columns, "Setting grid size");

        self.draw(&path, benchmark, dpus, size, (rows, columns))
            .map_err(|message| PlotError::Draw {
                path: path.clone(),
                message,
            })?;

        Ok(path)
    }

    /// whole image in pixels, title band included
    fn canvas_size(&self, rows: usize, columns: usize) -> Option<(u32, u32)> {
        let width = self.cell.0.checked_mul(u32::try_from(columns).ok()?)?;
        let height = self
            .cell
            .1
            .checked_mul(u32::try_from(rows).ok()?)?
            .checked_add(TITLE_HEIGHT)?;

        Some((width, height))
    }

    fn draw(
        &self,
        path: &Path,
        benchmark: &str,
        dpus: &DpuMap,
        size: (u32, u32),
        (rows, columns): (usize, usize),
    ) -> Result<(), String> {
        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(|error| error.to_string())?;

        let root = root
            .titled(&format!("Benchmark : {benchmark}"), ("sans-serif", 28))
            .map_err(|error| error.to_string())?;
        let cells = root.split_evenly((rows, columns));

        for (row, (dpu_count, tasklets)) in dpus.iter().enumerate() {
            for (column, (tasklet_count, measures)) in tasklets.iter().enumerate() {
                let area = &cells[row * columns + column];
                let epochs = measures
                    .values()
                    .map(|series| series.history.len())
                    .max()
                    .unwrap_or(0)
                    .max(2);

                let mut chart = ChartBuilder::on(area)
                    .caption(
                        format!("{dpu_count} dpus {tasklet_count} tasklets"),
                        ("sans-serif", 16),
                    )
                    .margin(8)
                    .x_label_area_size(if row + 1 == rows { 30 } else { 10 })
                    .y_label_area_size(if column == 0 { 50 } else { 10 })
                    .build_cartesian_2d(0..epochs - 1, 0.0..1.1)
                    .map_err(|error| error.to_string())?;

                let mut mesh = chart.configure_mesh();
                if column == 0 {
                    mesh.y_desc("performance (normalized)");
                }
                if row + 1 == rows {
                    mesh.x_desc("measure n°");
                }
                mesh.draw().map_err(|error| error.to_string())?;

                for (index, (label, series)) in measures.iter().enumerate() {
                    let style = Palette99::pick(index).mix(1.0).stroke_width(2);

                    chart
                        .draw_series(LineSeries::new(
                            performance(&series.history).into_iter().enumerate(),
                            style,
                        ))
                        .map_err(|error| error.to_string())?
                        .label(label.as_str())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }

                chart
                    .configure_series_labels()
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&BLACK)
                    .draw()
                    .map_err(|error| error.to_string())?;
            }
        }

        root.present().map_err(|error| error.to_string())
    }
}
