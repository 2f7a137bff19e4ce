use super::{count_tasklets, measure_label, performance, Nested};
use dpubench_ingest::{Corpus, Identifier};

fn id(encoded: &str) -> Identifier {
    encoded.parse().unwrap()
}

fn corpus() -> Corpus {
    [
        (id("BS:16:10:1:CPU-DPU Time (ms)"), vec![2.0, 1.0]),
        (id("BS:16:10:1:DPU Kernel Time (ms)"), vec![4.0, 4.0]),
        (id("BS:4:10:1:DPU Kernel Time (ms)"), vec![8.0, f64::NAN]),
        (id("BS:16:10:64:DPU Kernel Time (ms)"), vec![1.0, 1.0]),
        (id("VA:1:1:1:CPU time (ms)"), vec![1.0, 2.0]),
    ]
    .into_iter()
    .collect()
}

#[test]
pub fn expand_nests_by_dpus_then_tasklets() {
    let nested = Nested::expand(&corpus());

    assert_eq!(nested.len(), 2);

    let bs = nested.benchmark("BS").unwrap();
    assert_eq!(bs.keys().copied().collect::<Vec<_>>(), vec![1, 64]);
    assert_eq!(bs[&1].keys().copied().collect::<Vec<_>>(), vec![4, 16]);
    assert_eq!(
        bs[&1][&16].keys().cloned().collect::<Vec<_>>(),
        vec!["CPU-DPU".to_string(), "DPU Kernel".to_string()]
    );
    assert_eq!(bs[&1][&16]["CPU-DPU"].history, vec![2.0, 1.0]);
    assert_eq!(count_tasklets(bs), 2);

    // no suffix to strip
    assert!(nested.benchmark("VA").unwrap()[&1][&1].contains_key("CPU time (ms)"));
    assert_eq!(nested.series().count(), 5);
}

#[test]
pub fn later_bl_wins() {
    let corpus: Corpus = [
        (id("HST-L:16:1:1:DPU Kernel Time (ms)"), vec![1.0]),
        (id("HST-L:16:2:1:DPU Kernel Time (ms)"), vec![2.0]),
    ]
    .into_iter()
    .collect();

    let nested = Nested::expand(&corpus);
    let series = &nested.benchmark("HST-L").unwrap()[&1][&16]["DPU Kernel"];

    assert_eq!(series.identifier.bl, 2);
    assert_eq!(series.history, vec![2.0]);
}

#[test]
pub fn stripped_label_collides_with_plain_one() {
    let corpus: Corpus = [
        (id("BS:16:1:1:DPU Kernel"), vec![1.0]),
        (id("BS:16:1:1:DPU Kernel Time (ms)"), vec![2.0]),
    ]
    .into_iter()
    .collect();

    let nested = Nested::expand(&corpus);
    let measures = &nested.benchmark("BS").unwrap()[&1][&16];

    assert_eq!(measures.len(), 1);
    assert_eq!(measures["DPU Kernel"].identifier.measure, "DPU Kernel Time (ms)");
}

#[test]
pub fn labels_strip_time_suffix() {
    assert_eq!(measure_label("Inter-DPU Time (ms)"), "Inter-DPU");
    assert_eq!(measure_label("CPU time (ms)"), "CPU time (ms)");
}

#[test]
pub fn performance_is_normalized_inverse() {
    assert_eq!(performance(&[2.0, 1.0, 4.0]), vec![0.5, 1.0, 0.25]);
    assert_eq!(performance(&[2.0, f64::NAN]), vec![1.0, 0.0]);
    assert_eq!(performance(&[f64::NAN, 0.0]), vec![0.0, 0.0]);
    assert!(performance(&[]).is_empty());
}
