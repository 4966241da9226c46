//! End-to-end tests of the transmission chain.
//!
//! Validation targets:
//! | Metric | Target | Source |
//! |--------|--------|--------|
//! | Conversational tone at the cochlea | ~60-80 dB SPL | Aibara et al. 2001 |
//! | Permissible exposure | 8 h at 85 dB | NIOSH 1998 |
//! | AOM conductive loss | efficiency falls with effusion | Ravicz et al. 2004 |

use glam::Vec3;
use tympanic_sim::{
    config::Parameters,
    coupling::TransmissionOrchestrator,
    pathology::DiseaseStage,
    physics::{PerforationGrade, PerforationZone},
    state::{HealthLevel, HealthWarning},
    HearingStatus,
};

fn orchestrator() -> TransmissionOrchestrator {
    TransmissionOrchestrator::new(&Parameters::default())
}

fn run(sim: &mut TransmissionOrchestrator, ticks: usize, dt: f64) {
    for _ in 0..ticks {
        sim.tick(dt);
    }
}

// ============================================================================
// Healthy ear
// ============================================================================

#[test]
fn test_steady_tone_settles() {
    let mut sim = orchestrator();
    sim.receive_sound(0.5, 1000.0);

    run(&mut sim, 80, 0.016);
    let early = sim.status_snapshot();
    run(&mut sim, 20, 0.016);
    let late = sim.status_snapshot();

    assert_eq!(late.tick_count, 100);
    assert!(late.sound_level_db > 0.0 && late.sound_level_db < 140.0);
    assert!(
        (late.sound_level_db - early.sound_level_db).abs() < 1.5,
        "level still moving: {:.2} -> {:.2} dB",
        early.sound_level_db,
        late.sound_level_db
    );
    assert!((late.transmission_efficiency_percent - 100.0).abs() < 1e-9);
    assert!(late.warnings.is_empty(), "unexpected warnings {:?}", late.warnings);
    assert!(!late.has_warning(HealthWarning::HighSoundLevel));
    assert_eq!(late.disease_stage, None);
    assert!(sim.nerve().unwrap().completed_count() > 0);
}

#[test]
fn test_louder_tone_is_louder() {
    let mut quiet = orchestrator();
    let mut loud = orchestrator();
    quiet.receive_sound(0.1, 1000.0);
    loud.receive_sound(0.8, 1000.0);
    run(&mut quiet, 100, 0.016);
    run(&mut loud, 100, 0.016);
    assert!(loud.status_snapshot().sound_level_db > quiet.status_snapshot().sound_level_db + 6.0);
}

#[test]
fn test_silence_propagates() {
    let mut sim = orchestrator();
    sim.receive_sound(0.5, 1000.0);
    run(&mut sim, 50, 0.016);
    let exposure = sim.cochlea().exposure().total_exposure_sec;

    sim.receive_sound(0.0, 1000.0);
    run(&mut sim, 50, 0.016);
    let snapshot = sim.status_snapshot();
    assert_eq!(snapshot.sound_level_db, 0.0);
    assert_eq!(sim.outputs().lever_output, 0.0);
    assert!(!sim.nerve().unwrap().is_active());
    assert_eq!(sim.cochlea().exposure().total_exposure_sec, exposure);
}

// ============================================================================
// Otitis media feedback
// ============================================================================

#[test]
fn test_acute_otitis_degrades_transmission() {
    let mut sim = orchestrator();
    sim.receive_sound(0.5, 1000.0);
    sim.pathology_mut().trigger(DiseaseStage::Acute, 0.9);

    let mut previous = f64::INFINITY;
    for _ in 0..500 {
        sim.tick(0.016);
        let efficiency = sim.status_snapshot().transmission_efficiency_percent;
        assert!(
            efficiency <= previous + 1e-9,
            "efficiency rose: {} -> {}",
            previous,
            efficiency
        );
        previous = efficiency;
    }

    let snapshot = sim.status_snapshot();
    assert!(snapshot.transmission_efficiency_percent < 100.0);
    assert_eq!(snapshot.disease_stage, Some(DiseaseStage::Acute));
    assert!(snapshot.disease_hearing_loss_db > 0.0);
    assert!(snapshot.blood_flow_percent < 85.0);
    assert!(snapshot.has_warning(HealthWarning::Inflammation));
    assert_ne!(snapshot.overall_health, HealthLevel::Excellent);

    let severity = sim.pathology().state().unwrap().severity;
    assert!((0.7..=1.0).contains(&severity), "severity {}", severity);
    // Risk stays below the perforation threshold
    assert!(!sim.pathology().state().unwrap().perforated);
}

#[test]
fn test_reset_restores_efficiency() {
    let mut sim = orchestrator();
    sim.receive_sound(0.5, 1000.0);
    sim.pathology_mut().trigger(DiseaseStage::Peak, 1.0);
    run(&mut sim, 200, 0.016);
    assert!(sim.status_snapshot().transmission_efficiency_percent < 100.0);

    sim.pathology_mut().reset();
    run(&mut sim, 2, 0.016);
    let snapshot = sim.status_snapshot();
    assert_eq!(snapshot.disease_stage, None);
    assert!((snapshot.transmission_efficiency_percent - 100.0).abs() < 1e-9);
}

#[test]
fn test_membrane_perforation_is_reported() {
    let mut sim = orchestrator();
    sim.membrane_mut()
        .add_perforation_zone(PerforationZone::new(Vec3::ZERO, 2.0, 1.0))
        .unwrap();
    sim.receive_sound(0.5, 1000.0);
    run(&mut sim, 100, 0.016);

    let snapshot = sim.status_snapshot();
    assert_ne!(snapshot.perforation_grade, PerforationGrade::None);
    assert!(snapshot.has_warning(HealthWarning::MembranePerforation));
    assert!(snapshot.transmission_efficiency_percent < 100.0);
}

#[test]
fn test_cure_restores_healthy_ear() {
    let mut sim = orchestrator();
    sim.membrane_mut()
        .add_perforation_zone(PerforationZone::new(Vec3::ZERO, 2.0, 1.0))
        .unwrap();
    sim.receive_sound(0.5, 1000.0);
    sim.pathology_mut().trigger(DiseaseStage::Peak, 1.0);
    run(&mut sim, 200, 0.016);

    let sick = sim.status_snapshot();
    assert!(sick.blood_flow_percent < 85.0);
    assert!(sick.has_warning(HealthWarning::MembranePerforation));
    assert_ne!(sick.overall_health, HealthLevel::Excellent);

    sim.cure();
    let cured = sim.status_snapshot();
    assert_eq!(cured.disease_stage, None);
    assert_eq!(cured.perforation_grade, PerforationGrade::None);
    assert!(cured.warnings.is_empty(), "{:?}", cured.warnings);
    assert_eq!(cured.overall_health, HealthLevel::Excellent);
    assert!((cured.blood_flow_percent - 85.0).abs() < 1e-9);
    assert!((cured.transmission_efficiency_percent - 100.0).abs() < 1e-9);
    assert_eq!(sim.membrane().zone_count(), 0);

    run(&mut sim, 100, 0.016);
    let later = sim.status_snapshot();
    assert!((later.transmission_efficiency_percent - 100.0).abs() < 1e-9);
    assert!((later.blood_flow_percent - 85.0).abs() < 1e-9);
    assert!(later.warnings.is_empty(), "{:?}", later.warnings);
    assert_eq!(later.tick_count, 300);
}

// ============================================================================
// Noise exposure
// ============================================================================

#[test]
fn test_long_exposure_is_dangerous() {
    let mut sim = orchestrator();
    sim.receive_sound(1.0, 440.0);
    // 1000 ticks of 30 s exceed an 8-hour day
    run(&mut sim, 1000, 30.0);

    let snapshot = sim.status_snapshot();
    assert!(sim.cochlea().exposure().total_exposure_sec > 28_800.0);
    assert!((snapshot.hearing_damage_risk - 1.0).abs() < 1e-9);
    assert_eq!(snapshot.hearing_status, HearingStatus::Danger);
    assert!(snapshot.has_warning(HealthWarning::HearingDamageRisk));
}

// ============================================================================
// Robustness
// ============================================================================

#[test]
fn test_adversarial_inputs_stay_bounded() {
    let amplitudes = [0.0, 1e-9, 0.5, 10.0, 1e6, f64::NAN, -1.0, f64::INFINITY];
    let frequencies = [f64::NAN, -1.0, 0.0, 20.0, 1000.0, 20_000.0, 1e9];
    let steps = [1e-4, 0.016, 1.0];

    for &amplitude in &amplitudes {
        for &frequency in &frequencies {
            for &dt in &steps {
                let mut sim = orchestrator();
                sim.receive_sound(amplitude, frequency);
                run(&mut sim, 20, dt);

                let s = sim.status_snapshot();
                let label = format!("({}, {} Hz, dt {})", amplitude, frequency, dt);
                assert!((0.0..=140.0).contains(&s.sound_level_db), "{} level {}", label, s.sound_level_db);
                assert!(
                    (0.0..=100.0).contains(&s.transmission_efficiency_percent),
                    "{} efficiency {}",
                    label,
                    s.transmission_efficiency_percent
                );
                assert!((0.0..=100.0).contains(&s.nerve_strength_percent), "{} nerve", label);
                assert!((0.0..=100.0).contains(&s.blood_flow_percent), "{} flow", label);
                assert!((0.0..=1.0).contains(&s.hearing_damage_risk), "{} risk", label);
                assert!(sim.outputs().lever_output.is_finite(), "{} lever", label);
            }
        }
    }
}

#[test]
fn test_missing_nerve() {
    let mut sim = orchestrator();
    let nerve = sim.detach_nerve().unwrap();
    sim.receive_sound(0.5, 1000.0);
    run(&mut sim, 50, 0.016);

    let snapshot = sim.status_snapshot();
    assert!((snapshot.transmission_efficiency_percent - 80.0).abs() < 1e-9);
    assert!(snapshot.nerve_strength_percent > 0.0);

    sim.attach_nerve(nerve);
    run(&mut sim, 5, 0.016);
    assert!((sim.status_snapshot().transmission_efficiency_percent - 100.0).abs() < 1e-9);
}

#[test]
fn test_seeded_runs_are_identical() {
    let mut params = Parameters::default();
    params.membrane.enable_thermal_noise = true;
    params.pathology.perforation_probability = 0.5;
    params.pathology.perforation_risk_threshold = 0.0;

    let mut a = TransmissionOrchestrator::new(&params);
    let mut b = TransmissionOrchestrator::new(&params);
    for sim in [&mut a, &mut b] {
        sim.receive_sound(0.4, 2000.0);
        sim.pathology_mut().trigger(DiseaseStage::Acute, 0.8);
        run(sim, 300, 0.016);
    }
    assert_eq!(a.status_snapshot(), b.status_snapshot());
    assert_eq!(a.pathology().state(), b.pathology().state());
}
