use super::{PlotError, Plotter};
use crate::nested::{DpuMap, Nested};
use dpubench_ingest::{Corpus, Identifier};
use std::fs;

#[test]
pub fn writes_one_file_per_benchmark() {
    let dir = tempfile::tempdir().unwrap();
    let id = |encoded: &str| encoded.parse::<Identifier>().unwrap();
    let corpus: Corpus = [
        (id("BS:16:10:1:CPU-DPU Time (ms)"), vec![2.0, 1.0, f64::NAN]),
        (id("BS:16:10:1:DPU Kernel Time (ms)"), vec![4.0, 4.0, 3.0]),
        (id("BS:4:10:64:DPU Kernel Time (ms)"), vec![8.0, 7.0, 9.0]),
        (id("VA:1:1:1:CPU time (ms)"), vec![1.0, 2.0, 3.0]),
    ]
    .into_iter()
    .collect();

    let plotter = Plotter::new(dir.path(), 400, 300);
    let written = plotter.plot_all(&Nested::expand(&corpus)).unwrap();

    assert_eq!(
        written,
        vec![dir.path().join("plot_BS.svg"), dir.path().join("plot_VA.svg")]
    );
    let svg = fs::read_to_string(&written[0]).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("1 dpus 16 tasklets"));
}

#[test]
pub fn single_epoch_still_plots() {
    let dir = tempfile::tempdir().unwrap();
    let corpus: Corpus = [("BS:4:1:64:CPU time (ms)".parse::<Identifier>().unwrap(), vec![12.5])]
        .into_iter()
        .collect();

    let written = Plotter::new(dir.path(), 400, 300)
        .plot_all(&Nested::expand(&corpus))
        .unwrap();

    assert_eq!(written.len(), 1);
}

#[test]
pub fn empty_benchmark_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = Plotter::new(dir.path(), 400, 300).plot_benchmark("BS", &DpuMap::new());

    assert!(matches!(result, Err(PlotError::Empty(_))));
}

#[test]
pub fn oversized_canvas_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let corpus: Corpus = [
        ("BS:4:1:1:CPU time (ms)".parse::<Identifier>().unwrap(), vec![1.0]),
        ("BS:4:1:64:CPU time (ms)".parse::<Identifier>().unwrap(), vec![1.0]),
    ]
    .into_iter()
    .collect();
    let nested = Nested::expand(&corpus);

    let result = Plotter::new(dir.path(), 400, u32::MAX / 2 + 1)
        .plot_benchmark("BS", nested.benchmark("BS").unwrap());

    assert!(matches!(result, Err(PlotError::TooLarge { rows: 2, columns: 1, .. })));
    assert!(!dir.path().join("plot_BS.svg").exists());
}
