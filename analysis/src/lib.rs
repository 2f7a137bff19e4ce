//! Views over a merged corpus: nested per-benchmark layout, regression checks
//! and plots.

pub mod check;
pub mod nested;
pub mod plot;

pub use check::{CheckAction, CheckRule, Checker, Finding, Report};
pub use nested::{measure_label, performance, DpuMap, MeasureMap, Nested, Series, TaskletMap};
pub use plot::{PlotError, Plotter};
