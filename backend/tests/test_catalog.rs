//! Exam catalog construction and lookups

use clinic_simulator_core_rs::catalog::{
    default_exams, BLOOD_TEST, ELECTROCARDIOGRAM, ELECTROENCEPHALOGRAM, OCCUPATIONAL_CONSULT,
    OPHTHALMOLOGY_CONSULT, SPIROMETRY, STRESS_TEST, X_RAY,
};
use clinic_simulator_core_rs::{ClinicError, Exam, ExamCatalog};

#[test]
fn test_default_durations() {
    let catalog = ExamCatalog::occupational_health();
    let expected = [
        ("Electrocardiogram", 8),
        ("Spirometry", 10),
        ("Electroencephalogram", 20),
        ("Stress Test", 25),
        ("TVI", 6),
        ("Audiometry", 8),
        ("Ophthalmology Consult", 15),
        ("Occupational Consult", 12),
        ("X-Ray", 6),
        ("Blood Test", 5),
    ];

    let ids: Vec<&str> = catalog.exam_ids().map(String::as_str).collect();
    assert_eq!(ids, expected.iter().map(|(id, _)| *id).collect::<Vec<_>>());
    for (id, duration) in expected {
        assert_eq!(catalog.duration(id).unwrap(), duration, "{}", id);
    }
}

#[test]
fn test_stress_test_precedence() {
    let catalog = ExamCatalog::occupational_health();
    let mut prerequisites = catalog.precedence_of(STRESS_TEST).unwrap().to_vec();
    prerequisites.sort();

    let mut expected = vec![
        ELECTROCARDIOGRAM.to_string(),
        ELECTROENCEPHALOGRAM.to_string(),
        SPIROMETRY.to_string(),
        OPHTHALMOLOGY_CONSULT.to_string(),
    ];
    expected.sort();
    assert_eq!(prerequisites, expected);
}

#[test]
fn test_exams_without_precedence_have_empty_set() {
    let catalog = ExamCatalog::occupational_health();
    for exam in [BLOOD_TEST, X_RAY, OCCUPATIONAL_CONSULT] {
        assert!(catalog.precedence_of(exam).unwrap().is_empty());
    }
}

#[test]
fn test_unknown_exam_lookups_fail() {
    let catalog = ExamCatalog::occupational_health();
    assert_eq!(
        catalog.duration("MRI"),
        Err(ClinicError::UnknownExam("MRI".to_string()))
    );
    assert!(catalog.precedence_of("MRI").is_err());
    assert!(!catalog.contains("MRI"));
    assert_eq!(catalog.position("MRI"), None);
}

#[test]
fn test_validation_errors() {
    assert!(matches!(
        ExamCatalog::new(vec![]),
        Err(ClinicError::InvalidConfig(_))
    ));
    assert!(matches!(
        ExamCatalog::new(vec![Exam::new("A", 0)]),
        Err(ClinicError::InvalidConfig(_))
    ));
    assert!(matches!(
        ExamCatalog::new(vec![Exam::new("A", 1), Exam::new("A", 2)]),
        Err(ClinicError::InvalidConfig(_))
    ));
    assert_eq!(
        ExamCatalog::new(vec![Exam::new("A", 1).with_prerequisites(["Z"])]),
        Err(ClinicError::UnknownExam("Z".to_string()))
    );
}

#[test]
fn test_exam_deserializes_without_prerequisites() {
    let exam: Exam = serde_json::from_str(r#"{"id": "A", "duration": 4}"#).unwrap();
    assert_eq!(exam, Exam::new("A", 4));
}

#[test]
fn test_default_exams_build_default_catalog() {
    assert_eq!(
        ExamCatalog::new(default_exams()).unwrap(),
        ExamCatalog::occupational_health()
    );
}
