// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

use epm_eval::pipeline::{EvaluationConfig, EvaluationPipeline, IoErrorPolicy, Job};
use epm_eval::report::{
    EvaluationReport, FILTERED_ALL_FILE, FILTERED_BY_CLASS_FILE, UNFILTERED_FILE,
};
use epm_eval::Measure;

const JOB: &str = r#"{
  "folds": [
    {
      "rules": [
        { "items": [ { "attribute": 0, "condition": { "equals": 1.0 } } ], "class": 1 },
        { "items": [ { "attribute": 0, "condition": { "equals": 0.0 } } ], "class": 0 },
        {
          "items": [ { "attribute": 1, "condition": { "between": { "min": 0.5, "max": 2.0 } } } ],
          "class": 1
        }
      ],
      "training": {
        "class_values": ["no", "yes"],
        "instances": [
          { "values": [1.0, 1.0], "class": 1 },
          { "values": [0.0, 0.0], "class": 0 },
          { "values": [0.0, 1.0], "class": 0 },
          { "values": [0.0, 0.0], "class": 0 }
        ]
      },
      "test": {
        "class_values": ["no", "yes"],
        "instances": [
          { "values": [1.0, 0.0], "class": 1 },
          { "values": [1.0, 1.0], "class": 1 },
          { "values": [0.0, 1.0], "class": 0 },
          { "values": [0.0, 0.0], "class": 0 }
        ]
      }
    },
    {
      "rules": [
        { "items": [ { "attribute": 0, "condition": { "equals": 1.0 } } ], "class": 1 },
        { "items": [ { "attribute": 0, "condition": { "equals": 0.0 } } ], "class": 0 }
      ],
      "training": {
        "class_values": ["no", "yes"],
        "instances": [
          { "values": [1.0, 0.0], "class": 1 },
          { "values": [0.0, 1.0], "class": 0 },
          { "values": [0.0, 0.0], "class": 0 }
        ]
      },
      "test": {
        "class_values": ["no", "yes"],
        "instances": [
          { "values": [1.0, 1.0], "class": 1 },
          { "values": [0.0, 0.0], "class": 0 }
        ]
      },
      "predictions": [[1, 0], [1, 0], [0, 0]]
    }
  ]
}"#;

#[test]
fn job_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let job_path = dir.path().join("job.json");
    std::fs::write(&job_path, JOB).unwrap();

    let job = Job::load(&job_path).unwrap();
    assert_eq!(job.folds.len(), 2);

    let config = EvaluationConfig {
        filter_by: Measure::Conf,
        top_n: 1,
        ..EvaluationConfig::default()
    };
    let pipeline = EvaluationPipeline::new(config.clone());
    let cv = pipeline.run(&job).unwrap();
    assert_eq!(cv.folds(), 2);

    let [unfiltered, filtered_all, filtered_by_class] = cv.averages().unwrap();
    // Fold 1 has 3 rules, fold 2 has 2.
    assert!((unfiltered.nrules - 2.5).abs() < 1e-12);
    assert!((filtered_all.nrules - 1.0).abs() < 1e-12);
    assert!((filtered_by_class.nrules - 2.0).abs() < 1e-12);
    // The voting predictions of fold 1 and the given ones of fold 2 are
    // both perfect for the unfiltered rules.
    assert!((unfiltered.acc - 1.0).abs() < 1e-12);
    assert!((unfiltered.auc - 1.0).abs() < 1e-12);

    let out = dir.path().join("results");
    cv.save(&out, IoErrorPolicy::Propagate).unwrap();
    for name in [UNFILTERED_FILE, FILTERED_ALL_FILE, FILTERED_BY_CLASS_FILE] {
        let text = std::fs::read_to_string(out.join(name)).unwrap();
        assert_eq!(text.lines().count(), 14);
        assert!(text.contains("RULE_NUMBER ==> --------"));
    }
    let text = std::fs::read_to_string(out.join(UNFILTERED_FILE)).unwrap();
    assert!(text.contains("NRULES ==> 2.500000"));

    let report = EvaluationReport::new(&config, &cv).unwrap();
    assert_eq!(report.folds, 2);
}

const BAD_CLASS_JOB: &str = r#"{"folds":[{
  "rules": [],
  "training": { "class_values": ["a"], "instances": [{ "values": [], "class": 3 }] },
  "test": { "class_values": ["a"], "instances": [] }
}]}"#;

#[test]
fn malformed_job_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let job_path = dir.path().join("job.json");
    std::fs::write(&job_path, BAD_CLASS_JOB).unwrap();

    let err = Job::load(&job_path).unwrap_err();
    assert!(format!("{:#}", err).contains("fold 0"));
}
