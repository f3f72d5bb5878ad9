//! End-to-end tick loop scenarios
//!
//! Each test runs a small hand-written scenario and checks the per-tick
//! snapshots and events against a hand-computed timeline.

use clinic_simulator_core_rs::catalog::{
    BLOOD_TEST, ELECTROCARDIOGRAM, ELECTROENCEPHALOGRAM, OCCUPATIONAL_CONSULT, STRESS_TEST, TVI,
    X_RAY,
};
use clinic_simulator_core_rs::{
    simulate, ClinicError, Event, Exam, Orchestrator, PatientObservation, PatientStatus,
    RoutingConfig, Scenario, ScenarioEntry, SimulationConfig,
};

fn config(exams: Vec<Exam>, tick_budget: usize) -> SimulationConfig {
    SimulationConfig {
        tick_budget,
        exams,
        routing: RoutingConfig::unconstrained(),
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn clinic(tick_budget: usize) -> SimulationConfig {
    SimulationConfig {
        tick_budget,
        ..Default::default()
    }
}

#[test]
fn test_two_exams_in_sequence() {
    init_logging();
    let config = config(vec![Exam::new("A", 5), Exam::new("B", 10)], 20);
    let scenario = Scenario::new(vec![ScenarioEntry::new("P1", 0, ["A", "B"])]);
    let run = simulate(config, scenario).unwrap();
    let history = &run.history;

    // Tick 0: service starts with the full duration
    let room_a = history.room_at(0, "A").unwrap();
    assert_eq!(room_a.occupant(), Some("P1"));
    assert_eq!(room_a.remaining(), 5);

    for t in 0..5 {
        assert_eq!(history.room_at(t, "A").unwrap().remaining(), 5 - t);
    }

    // Tick 5: A completes and B starts in the same tick
    assert!(history.room_at(5, "A").unwrap().is_free());
    assert_eq!(history.room_at(5, "B").unwrap().remaining(), 10);
    let events = &history.snapshot(5).unwrap().events;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type(), "ExamCompleted");
    assert_eq!(events[1].event_type(), "ServiceStarted");

    // Tick 15: finalized
    match history.patient_at(15, "P1") {
        PatientObservation::Finalized(p) => {
            assert_eq!(p.completion_tick(), Some(15));
            assert_eq!(p.elapsed(), Some(15));
            assert_eq!(p.completed_exams(), ["A".to_string(), "B".to_string()]);
        }
        other => panic!("expected finalized patient, got {:?}", other),
    }
    assert!(matches!(
        history.patient_at(14, "P1"),
        PatientObservation::Active(_)
    ));
}

#[test]
fn test_queue_promotion_in_release_tick() {
    let config = config(vec![Exam::new("A", 5)], 15);
    let scenario = Scenario::new(vec![
        ScenarioEntry::new("P1", 0, ["A"]),
        ScenarioEntry::new("P2", 0, ["A"]),
    ]);
    let run = simulate(config, scenario).unwrap();
    let history = &run.history;

    let room = history.room_at(0, "A").unwrap();
    assert_eq!(room.occupant(), Some("P1"));
    assert_eq!(room.queue_position("P2"), Some(0));

    let room = history.room_at(5, "A").unwrap();
    assert_eq!(room.occupant(), Some("P2"));
    assert_eq!(room.remaining(), 5);
    assert_eq!(room.queue_len(), 0);

    let events = &history.snapshot(5).unwrap().events;
    assert_eq!(
        events,
        &vec![
            Event::ExamCompleted {
                tick: 5,
                patient_id: "P1".to_string(),
                exam: "A".to_string(),
            },
            Event::PromotedFromQueue {
                tick: 5,
                patient_id: "P2".to_string(),
                exam: "A".to_string(),
            },
            Event::PatientFinalized {
                tick: 5,
                patient_id: "P1".to_string(),
                arrival_tick: 0,
                elapsed: 5,
            },
        ]
    );

    let report = history.completion_report();
    assert_eq!(report.len(), 2);
    assert_eq!(report[1].patient_id, "P2");
    assert_eq!(report[1].completion_tick, 10);
    assert!(history.room_at(10, "A").unwrap().is_free());
}

#[test]
fn test_phase_order_arrival_after_release() {
    let config = config(vec![Exam::new("A", 3)], 10);
    let scenario = Scenario::new(vec![
        ScenarioEntry::new("P1", 0, ["A"]),
        ScenarioEntry::new("P2", 3, ["A"]),
    ]);
    let run = simulate(config, scenario).unwrap();

    let kinds: Vec<&str> = run
        .history
        .snapshot(3)
        .unwrap()
        .events
        .iter()
        .map(Event::event_type)
        .collect();
    assert_eq!(
        kinds,
        vec!["ExamCompleted", "Arrival", "ServiceStarted", "PatientFinalized"]
    );
    assert_eq!(run.history.room_at(3, "A").unwrap().occupant(), Some("P2"));
}

#[test]
fn test_routing_sees_earlier_decisions_in_same_tick() {
    let run = simulate(
        clinic(20),
        Scenario::new(vec![
            ScenarioEntry::new("P1", 0, [X_RAY, TVI]),
            ScenarioEntry::new("P2", 0, [X_RAY, TVI]),
        ]),
    )
    .unwrap();

    // TVI and X-Ray tie on duration; P1 takes TVI, P2 finds it busy
    assert_eq!(run.history.room_at(0, TVI).unwrap().occupant(), Some("P1"));
    assert_eq!(run.history.room_at(0, X_RAY).unwrap().occupant(), Some("P2"));
}

#[test]
fn test_intake_and_exit_order() {
    let run = simulate(
        clinic(40),
        Scenario::new(vec![ScenarioEntry::new(
            "P1",
            0,
            [OCCUPATIONAL_CONSULT, X_RAY, BLOOD_TEST],
        )]),
    )
    .unwrap();

    let report = run.history.completion_report();
    assert_eq!(report[0].completion_tick, 5 + 6 + 12);

    let last = run.history.last().unwrap();
    assert_eq!(
        last.finalized[0].completed_exams(),
        [
            BLOOD_TEST.to_string(),
            X_RAY.to_string(),
            OCCUPATIONAL_CONSULT.to_string()
        ]
    );
}

#[test]
fn test_stress_test_after_prerequisite() {
    let run = simulate(
        clinic(60),
        Scenario::new(vec![ScenarioEntry::new(
            "P1",
            0,
            [STRESS_TEST, ELECTROCARDIOGRAM],
        )]),
    )
    .unwrap();

    assert_eq!(
        run.history.room_at(0, ELECTROCARDIOGRAM).unwrap().occupant(),
        Some("P1")
    );
    assert!(run.history.room_at(0, STRESS_TEST).unwrap().is_free());
    assert_eq!(run.history.completion_report()[0].completion_tick, 8 + 25);
}

#[test]
fn test_budget_ends_with_patients_in_service() {
    let run = simulate(
        clinic(10),
        Scenario::new(vec![ScenarioEntry::new("P1", 0, [ELECTROENCEPHALOGRAM])]),
    )
    .unwrap();

    assert_eq!(run.history.len(), 10);
    let last = run.history.last().unwrap();
    assert_eq!(last.tick, 9);
    assert_eq!(last.active.len(), 1);
    assert!(last.finalized.is_empty());
    assert_eq!(
        last.active[0].status(),
        &PatientStatus::InService {
            exam: ELECTROENCEPHALOGRAM.to_string()
        }
    );
    assert_eq!(run.history.room_at(9, ELECTROENCEPHALOGRAM).unwrap().remaining(), 11);
}

#[test]
fn test_arrival_outside_budget_never_appears() {
    let run = simulate(
        clinic(5),
        Scenario::new(vec![ScenarioEntry::new("Late", 9, [X_RAY])]),
    )
    .unwrap();
    assert_eq!(run.history.patient_at(4, "Late"), PatientObservation::NotYetPresent);
}

#[test]
fn test_manual_ticks_then_exhaustion() {
    init_logging();
    let scenario = Scenario::new(vec![ScenarioEntry::new("P1", 1, [BLOOD_TEST])]);
    let mut orchestrator = Orchestrator::new(clinic(3), scenario).unwrap();

    let t0 = orchestrator.tick().unwrap();
    assert_eq!(t0.arrivals, 0);
    let t1 = orchestrator.tick().unwrap();
    assert_eq!((t1.tick, t1.arrivals, t1.services_started), (1, 1, 1));
    orchestrator.tick().unwrap();
    assert!(orchestrator.is_finished());
    assert_eq!(
        orchestrator.tick(),
        Err(ClinicError::BudgetExhausted { budget: 3 })
    );
    assert_eq!(orchestrator.history().len(), 3);
}

#[test]
fn test_ingestion_errors() {
    let cases = vec![
        (
            Scenario::new(vec![ScenarioEntry::new("P1", 0, Vec::<String>::new())]),
            ClinicError::EmptyRequiredSet("P1".to_string()),
        ),
        (
            Scenario::new(vec![ScenarioEntry::new("P1", 0, ["MRI"])]),
            ClinicError::UnknownExam("MRI".to_string()),
        ),
        (
            Scenario::new(vec![
                ScenarioEntry::new("P1", 0, [X_RAY]),
                ScenarioEntry::new("P1", 2, [TVI]),
            ]),
            ClinicError::DuplicatePatient("P1".to_string()),
        ),
        (
            Scenario::new(vec![ScenarioEntry::new("P1", 0, [X_RAY, X_RAY])]),
            ClinicError::DuplicateExam {
                patient: "P1".to_string(),
                exam: X_RAY.to_string(),
            },
        ),
    ];

    for (scenario, expected) in cases {
        assert_eq!(Orchestrator::new(clinic(10), scenario).err(), Some(expected));
    }
}

#[test]
fn test_unordered_arrivals_are_accepted() {
    let run = simulate(
        clinic(10),
        Scenario::new(vec![
            ScenarioEntry::new("Later", 4, [X_RAY]),
            ScenarioEntry::new("Earlier", 0, [X_RAY]),
        ]),
    )
    .unwrap();
    assert!(run.history.patient_at(0, "Earlier").is_present());
    assert!(!run.history.patient_at(3, "Later").is_present());
    assert!(run.history.patient_at(4, "Later").is_present());
}
