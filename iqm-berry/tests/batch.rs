mod common;

use common::{init_logger, Dataset};
use iqm_berry::batch::{calculate_metrics, process_row, BatchConfig, RowError};
use iqm_berry::data::{LoadError, MriScan, Precision};
use iqm_berry::dataset::{read_cohort, BidsLayout, CohortRow, VolumeKind};
use iqm_berry::metrics::TissueLabels;
use iqm_berry::table::{read_metrics_csv, MetricsRow};
use ndarray::Array3;
use std::path::Path;

/// 计算单行, 要求没有降级.
fn metrics_of(row: &CohortRow, base: &Path, config: &BatchConfig) -> MetricsRow {
    let processed = process_row(row, base, config).unwrap();
    assert!(processed.degraded.is_empty(), "{:?}", processed.degraded);
    processed.metrics
}

#[test]
fn test_segmentation_is_optional() {
    init_logger();
    let ds = Dataset::new();
    let a = CohortRow::new("sub-01", "1");
    let b = CohortRow::new("sub-02", "1");
    ds.put_subject(&a, true);
    ds.put_subject(&b, false);

    let report = calculate_metrics(&[a.clone(), b.clone()], ds.base(), &BatchConfig::default());
    assert!(report.is_complete());
    assert_eq!(report.rows.len(), 2);

    let (ra, rb) = (&report.rows[0], &report.rows[1]);
    assert_eq!(ra.participant_id, "sub-01");
    assert_eq!(rb.participant_id, "sub-02");

    for r in [ra, rb] {
        assert!(r.efc.is_finite());
        assert!(r.efc > 0.0 && r.efc < 1.0);
        assert!(r.t_snr.is_some_and(|s| s.is_finite() && s > 0.0));
    }
    // 两个被试的体数据相同.
    assert_eq!(ra.efc, rb.efc);

    let cnr = ra.cnr.unwrap();
    let cjv = ra.cjv.unwrap();
    assert!(cnr.is_finite() && cnr > 0.0);
    assert!(cjv.is_finite() && cjv > 0.0);
    assert_eq!(rb.cnr, None);
    assert_eq!(rb.cjv, None);

    let out = ds.base().join("metrics.csv");
    report.write_csv(&out).unwrap();
    let back = read_metrics_csv(&out).unwrap();
    assert_eq!(back.len(), 2);
    assert!(back[0].has_segmentation_metrics());
    assert!(!back[1].has_segmentation_metrics());
    assert!((back[0].efc - ra.efc).abs() <= 0.5e-4);
    assert!((back[1].t_snr.unwrap() - rb.t_snr.unwrap()).abs() <= 0.5e-4);
}

#[test]
fn test_uniform_volume_is_representable() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-05", "2");
    let flat = Array3::<f32>::from_elem((10, 10, 10), 5.0);
    ds.put_volume(VolumeKind::Anatomical, &row, &flat);
    ds.put_volume(VolumeKind::Skullstrip, &row, &flat);

    let m = metrics_of(&row, ds.base(), &BatchConfig::default());
    // 强度全部相同时 EFC 取最大值.
    assert!((m.efc - 1.0).abs() < 1e-9);
    assert!(!m.t_snr.unwrap().is_finite());
    assert_eq!(m.cnr, None);
}

#[test]
fn test_missing_primary_is_skipped_and_reported() {
    init_logger();
    let ds = Dataset::new();
    let ok = CohortRow::new("sub-01", "1");
    let missing = CohortRow::new("sub-02", "1");
    let last = CohortRow::new("sub-03", "2");
    ds.put_subject(&ok, true);
    ds.put_subject(&last, false);

    let report = calculate_metrics(
        &[ok, missing.clone(), last],
        ds.base(),
        &BatchConfig::default(),
    );
    let ids: Vec<&str> = report.rows.iter().map(|r| r.participant_id.as_str()).collect();
    assert_eq!(ids, ["sub-01", "sub-03"]);

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.row, missing);
    match &failure.error {
        RowError::Missing { kind, path } => {
            assert_eq!(*kind, VolumeKind::Anatomical);
            assert_eq!(*path, ds.path_of(VolumeKind::Anatomical, &missing));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(failure.to_string().starts_with("sub-02 ses-1: "));
}

#[test]
fn test_missing_skullstrip_gives_null_snr() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-01", "1");
    let (scan, labels) = common::phantom(8);
    ds.put_volume(VolumeKind::Anatomical, &row, &scan);
    ds.put_labels(&row, &labels);

    let m = metrics_of(&row, ds.base(), &BatchConfig::default());
    assert_eq!(m.t_snr, None);
    assert!(m.cnr.is_some());
    assert!(m.cjv.is_some());
}

#[test]
fn test_segmentation_shape_mismatch_keeps_row() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-01", "1");
    let (scan, labels) = common::phantom(8);
    let (_, small) = common::phantom(6);
    ds.put_volume(VolumeKind::Anatomical, &row, &scan);
    ds.put_volume(VolumeKind::Skullstrip, &row, &common::brain_only(&scan, &labels));
    ds.put_labels(&row, &small);

    let report = calculate_metrics(&[row.clone()], ds.base(), &BatchConfig::default());
    assert!(report.failures.is_empty());
    assert!(!report.is_complete());
    assert_eq!(report.rows.len(), 1);

    let m = &report.rows[0];
    assert!(m.efc.is_finite());
    assert!(m.t_snr.is_some_and(|s| s.is_finite()));
    assert_eq!(m.cnr, None);
    assert_eq!(m.cjv, None);

    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].row, row);
    assert!(matches!(
        report.degraded[0].error,
        RowError::ShapeMismatch {
            expected: (8, 8, 8),
            found: (6, 6, 6)
        }
    ));
}

#[test]
fn test_corrupt_optional_inputs_degrade_row() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-01", "1");
    let (scan, _) = common::phantom(8);
    ds.put_volume(VolumeKind::Anatomical, &row, &scan);
    ds.put_garbage(VolumeKind::Skullstrip, &row);
    ds.put_garbage(VolumeKind::Segmentation, &row);

    let processed = process_row(&row, ds.base(), &BatchConfig::default()).unwrap();
    let m = &processed.metrics;
    assert!(m.efc.is_finite());
    assert_eq!(m.t_snr, None);
    assert_eq!(m.cnr, None);
    assert_eq!(m.cjv, None);

    let kinds: Vec<VolumeKind> = processed
        .degraded
        .iter()
        .map(|e| match e {
            RowError::Load {
                kind,
                source: LoadError::Nifti(_),
                ..
            } => *kind,
            other => panic!("unexpected error: {other}"),
        })
        .collect();
    assert_eq!(kinds, [VolumeKind::Skullstrip, VolumeKind::Segmentation]);
}

#[test]
fn test_corrupt_primary_fails_row() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-01", "1");
    ds.put_garbage(VolumeKind::Anatomical, &row);

    let report = calculate_metrics(&[row], ds.base(), &BatchConfig::default());
    assert!(report.rows.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        RowError::Load {
            kind: VolumeKind::Anatomical,
            ..
        }
    ));
}

#[test]
fn test_single_voxel_keeps_non_finite_efc() {
    init_logger();
    let ds = Dataset::new();
    let tiny = CohortRow::new("sub-01", "1");
    let next = CohortRow::new("sub-02", "1");
    ds.put_volume(VolumeKind::Anatomical, &tiny, &Array3::from_elem((1, 1, 1), 7.0));
    ds.put_subject(&next, false);

    let report = calculate_metrics(&[tiny, next], ds.base(), &BatchConfig::default());
    assert!(report.is_complete());
    assert_eq!(report.rows.len(), 2);
    assert!(!report.rows[0].efc.is_finite());
    assert_eq!(report.rows[0].t_snr, None);
    assert!(report.rows[1].efc.is_finite());
}

#[test]
fn test_custom_tissue_labels() {
    init_logger();
    let ds = Dataset::new();
    let aseg = CohortRow::new("sub-01", "1");
    let atlas = CohortRow::new("sub-02", "1");
    let (scan, labels) = common::phantom(8);
    // 同一体模, 换用另一套编码: 白质 1, 灰质 2, 背景 0.
    let relabeled = labels.mapv(|l| match l {
        common::WM => 1,
        common::GM => 2,
        _ => 0,
    });
    for (row, seg) in [(&aseg, &labels), (&atlas, &relabeled)] {
        ds.put_volume(VolumeKind::Anatomical, row, &scan);
        ds.put_labels(row, seg);
    }

    let custom = TissueLabels::from_mapping([("wm", [1]), ("gm", [2]), ("bg", [0])]).unwrap();
    let config = BatchConfig::default().with_tissues(custom);
    let expected = metrics_of(&aseg, ds.base(), &BatchConfig::default());
    let m = metrics_of(&atlas, ds.base(), &config);
    assert!(expected.cnr.is_some_and(|c| c.is_finite() && c > 0.0));
    assert_eq!(m.cnr, expected.cnr);
    assert_eq!(m.cjv, expected.cjv);

    // 默认编码下, 2 被当作白质, 1 不属于任何类别.
    let mismatched = metrics_of(&atlas, ds.base(), &BatchConfig::default());
    assert_ne!(mismatched.cnr, expected.cnr);
}

#[test]
fn test_precision_is_applied_to_primary() {
    init_logger();
    let ds = Dataset::new();
    let row = CohortRow::new("sub-01", "1");
    let data = Array3::from_shape_fn((4, 4, 4), |(a, b, c)| (a + b + c) as f32 + 0.75);
    let path = ds.put_volume(VolumeKind::Anatomical, &row, &data);

    let truncated = MriScan::open(&path, Precision::Int32).unwrap();
    assert!(truncated.data().iter().all(|v| v.fract() == 0.0));
    let raw = MriScan::open(&path, Precision::Float64).unwrap();
    assert!(raw.data().iter().all(|v| v.fract() == 0.75));

    let int = metrics_of(&row, ds.base(), &BatchConfig::default());
    let float = metrics_of(
        &row,
        ds.base(),
        &BatchConfig::default().with_precision(Precision::Float64),
    );
    assert_ne!(int.efc, float.efc);
}

#[test]
fn test_cohort_table_with_sub_prefixed_layout() {
    init_logger();
    let ds = Dataset::with_layout(BidsLayout::sub_prefixed());
    let tsv = ds.base().join("derivatives").join("scanning_parameters.tsv");
    std::fs::create_dir_all(tsv.parent().unwrap()).unwrap();
    std::fs::write(&tsv, "SubID\tSessionID\tSequence\n01\t1\tMPRAGE\n02\t1\tMP2RAGE\n").unwrap();

    let cohort = read_cohort(&tsv).unwrap();
    for row in &cohort {
        ds.put_subject(row, row.participant_id == "02");
    }

    let config = BatchConfig::default().with_layout(BidsLayout::sub_prefixed());
    let report = calculate_metrics(&cohort, ds.base(), &config);
    assert!(report.is_complete());
    assert_eq!(report.rows[0].cnr, None);
    assert!(report.rows[1].cnr.is_some());
}

#[cfg(feature = "rayon")]
#[test]
fn test_parallel_matches_sequential() {
    use iqm_berry::batch::par_calculate_metrics;

    init_logger();
    let ds = Dataset::new();
    let cohort: Vec<CohortRow> = (1..=6)
        .map(|i| CohortRow::new(format!("sub-{i:02}"), "1"))
        .collect();
    for (i, row) in cohort.iter().enumerate() {
        match i % 3 {
            0 => ds.put_subject(row, true),
            1 => ds.put_subject(row, false),
            _ => {}
        }
    }

    let config = BatchConfig::default();
    let seq = calculate_metrics(&cohort, ds.base(), &config);
    let par = par_calculate_metrics(&cohort, ds.base(), &config);
    assert_eq!(seq.rows, par.rows);
    let failed = |r: &iqm_berry::batch::BatchReport| {
        r.failures
            .iter()
            .map(|f| f.row.participant_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(failed(&seq), ["sub-03", "sub-06"]);
    assert_eq!(failed(&seq), failed(&par));
}
