//! Otitis media progression state machine.
//!
//! Stage durations are given in disease days and compressed by the time
//! acceleration factor; young age, weak immunity and poor treatment stretch
//! them. Severity and effusion relax toward per-stage targets. A purulent
//! effusion under pressure may rupture the membrane, which starts a healing
//! task that runs across ticks until it completes or the episode is reset.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::PathologyParameters;
use crate::error::{TransmissionError, TransmissionResult};
use crate::numeric::{clamp01, clamp_finite, lerp};
use crate::tick::{valid_dt, TickContext};

use super::complications::{ComplicationRisks, HealingTask};
use super::diagnostics::PathologyDiagnostics;
use super::stage::{DiseaseStage, TransitionInputs};
use super::treatment::{time_acceleration, AntibioticCourse, TreatmentEffect, TreatmentPlan};
use super::PathologyView;

const SECONDS_PER_DAY: f64 = 86_400.0;
/// Relaxation rate of severity and fluid toward their targets (1/s)
const RELAXATION_RATE: f64 = 0.5;
const MAX_HEARING_LOSS_DB: f64 = 60.0;
/// Upper bound on complication checks evaluated in one tick
const MAX_CHECKS_PER_TICK: u64 = 1000;

/// Snapshot of an active episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseState {
    pub stage: DiseaseStage,
    /// [0,1]
    pub severity: f64,
    /// Middle-ear effusion [0,1]
    pub fluid_level: f64,
    /// [0,100]
    pub treatment_effectiveness: f64,
    /// Risks (%)
    pub perforation_risk: f64,
    pub mastoiditis_risk: f64,
    pub meningitis_risk: f64,
    pub antibiotic_active: bool,
    pub painkiller_active: bool,
    pub self_healing_active: bool,
    /// Perceived pain [0,1]
    pub pain_level: f64,
    /// Conductive hearing loss [0,60] dB
    pub hearing_loss_db: f64,
    /// Severity the episode scales toward [0,1]
    pub peak_severity: f64,
    pub perforated: bool,
    /// Area fraction of a disease-induced perforation [0,1]
    pub perforation_area_fraction: f64,
    /// Loss left behind by a healed perforation (dB)
    pub residual_loss_db: f64,
    pub stage_elapsed_sec: f64,
    pub episode_elapsed_sec: f64,
}

impl DiseaseState {
    fn onset(stage: DiseaseStage, peak_severity: f64, previous: Option<&DiseaseState>) -> Self {
        Self {
            stage,
            severity: previous.map(|p| p.severity).unwrap_or(0.0),
            fluid_level: previous.map(|p| p.fluid_level).unwrap_or(0.0),
            treatment_effectiveness: 0.0,
            perforation_risk: 0.0,
            mastoiditis_risk: 0.0,
            meningitis_risk: 0.0,
            antibiotic_active: false,
            painkiller_active: false,
            self_healing_active: true,
            pain_level: previous.map(|p| p.pain_level).unwrap_or(0.0),
            hearing_loss_db: previous.map(|p| p.hearing_loss_db).unwrap_or(0.0),
            peak_severity,
            perforated: previous.map(|p| p.perforated).unwrap_or(false),
            perforation_area_fraction: previous.map(|p| p.perforation_area_fraction).unwrap_or(0.0),
            residual_loss_db: previous.map(|p| p.residual_loss_db).unwrap_or(0.0),
            stage_elapsed_sec: 0.0,
            episode_elapsed_sec: 0.0,
        }
    }
}

/// Disease progression driven by the orchestrator once per tick
#[derive(Debug, Clone)]
pub struct PathologyStateMachine {
    params: PathologyParameters,
    state: Option<DiseaseState>,
    treatment: TreatmentPlan,
    healing: Option<HealingTask>,
    /// Simulation time since construction or reset (s)
    clock_sec: f64,
    check_timer_sec: f64,
    history: Vec<DiseaseStage>,
}

impl PathologyStateMachine {
    pub fn new(params: &PathologyParameters) -> Self {
        Self {
            params: params.clone(),
            state: None,
            treatment: TreatmentPlan::default(),
            healing: None,
            clock_sec: 0.0,
            check_timer_sec: 0.0,
            history: Vec::new(),
        }
    }

    /// Start (or restart) an episode at `entry_stage`.
    ///
    /// `initial_severity` sets the episode's peak severity; severity and
    /// fluid climb toward it from their current values.
    pub fn trigger(&mut self, entry_stage: DiseaseStage, initial_severity: f64) {
        let peak = if initial_severity.is_finite() {
            clamp01(initial_severity)
        } else {
            log::warn!("Invalid initial severity {}, using 0.5", initial_severity);
            0.5
        };

        let mut state = DiseaseState::onset(entry_stage, peak, self.state.as_ref());
        self.apply_treatment_flags(&mut state);
        self.state = Some(state);
        self.history = vec![entry_stage];
        self.check_timer_sec = 0.0;

        log::info!(
            "Otitis media triggered at {} (peak severity {:.2}, {})",
            entry_stage,
            peak,
            self.params.pathogen.name()
        );
    }

    /// Advance the episode by `ctx.dt`
    pub fn tick(&mut self, ctx: &mut TickContext) {
        let Some(dt) = valid_dt(ctx.dt) else {
            return;
        };
        self.clock_sec += dt;

        let Some(mut state) = self.state.take() else {
            return;
        };

        let effect = self.treatment.evaluate(&self.params, self.clock_sec);
        state.treatment_effectiveness = effect.total;
        state.episode_elapsed_sec += dt;
        state.stage_elapsed_sec += dt;

        self.advance_stage(&mut state, effect.total);
        self.relax_toward_targets(&mut state, &effect, dt);

        let risks = ComplicationRisks::assess(
            state.severity,
            state.fluid_level,
            self.params.pathogen.is_purulent(),
            effect.total,
        );
        state.perforation_risk = risks.perforation;
        state.mastoiditis_risk = risks.mastoiditis;
        state.meningitis_risk = risks.meningitis;

        self.advance_healing(&mut state, dt);
        self.run_complication_checks(&mut state, dt, ctx);

        let extra_loss = self
            .healing
            .map(|task| task.current_loss_db())
            .unwrap_or(state.residual_loss_db);
        state.hearing_loss_db = clamp_finite(
            30.0 * state.fluid_level + 10.0 * state.severity + extra_loss,
            0.0,
            MAX_HEARING_LOSS_DB,
        );

        let mut pain = state.severity * (0.6 + 0.4 * state.fluid_level);
        if state.perforated {
            pain *= 0.5;
        }
        if self.treatment.painkiller {
            pain *= 0.4;
        }
        state.pain_level = clamp01(pain);

        self.apply_treatment_flags(&mut state);
        self.state = Some(state);
    }

    fn advance_stage(&mut self, state: &mut DiseaseState, effectiveness: f64) {
        let Some(expected) = self.expected_stage_duration(state.stage, effectiveness) else {
            return;
        };
        if state.stage_elapsed_sec < expected {
            return;
        }

        let inputs = TransitionInputs {
            treatment_effectiveness: effectiveness,
            fluid_level: state.fluid_level,
            chronic_threshold: self.params.chronic_threshold,
            chronic_exit_threshold: self.params.chronic_exit_threshold,
        };
        let next = state.stage.next(&inputs);
        if next != state.stage {
            log::info!(
                "Disease stage {} -> {} after {:.1}s (treatment {:.0}%)",
                state.stage,
                next,
                state.stage_elapsed_sec,
                effectiveness
            );
            self.history.push(next);
        }
        state.stage = next;
        state.stage_elapsed_sec = 0.0;
    }

    fn relax_toward_targets(&self, state: &mut DiseaseState, effect: &TreatmentEffect, dt: f64) {
        let virulence = self.params.pathogen.virulence();
        let antibiotic = effect.antibiotic / 100.0;
        let scale = state.peak_severity * virulence;

        let severity_target = clamp01(state.stage.severity_target() * scale * (1.0 - antibiotic * 0.8));
        let mut fluid_target = clamp01(state.stage.fluid_target() * scale * (1.0 - antibiotic * 0.5));
        if state.perforated {
            // Otorrhoea drains the middle ear
            fluid_target *= 0.5;
        }

        let t = dt * RELAXATION_RATE;
        state.severity = clamp01(lerp(state.severity, severity_target, t));
        state.fluid_level = clamp01(lerp(state.fluid_level, fluid_target, t));
    }

    fn advance_healing(&mut self, state: &mut DiseaseState, dt: f64) {
        let Some(task) = self.healing.as_mut() else {
            return;
        };
        if task.advance(dt) {
            state.perforated = false;
            state.perforation_area_fraction = 0.0;
            state.residual_loss_db = task.residual_loss_db;
            self.healing = None;
            log::info!(
                "Perforation healed, residual loss {:.1} dB",
                state.residual_loss_db
            );
        }
    }

    fn run_complication_checks(&mut self, state: &mut DiseaseState, dt: f64, ctx: &mut TickContext) {
        let interval = self.params.complication_check_interval_sec;
        if !self.params.enable_complications || !(interval.is_finite() && interval > 0.0) {
            return;
        }

        self.check_timer_sec += dt;
        let due = ((self.check_timer_sec / interval).floor() as u64).min(MAX_CHECKS_PER_TICK);
        self.check_timer_sec = (self.check_timer_sec - due as f64 * interval).max(0.0) % interval;

        let probability = clamp01(self.params.perforation_probability);
        for _ in 0..due {
            if state.perforated || state.perforation_risk <= self.params.perforation_risk_threshold {
                break;
            }
            if ctx.rng.gen_bool(probability) {
                self.perforate(state);
            }
        }
    }

    fn perforate(&mut self, state: &mut DiseaseState) {
        state.perforated = true;
        state.perforation_area_fraction =
            clamp_finite(state.severity * self.params.perforation_area_per_severity, 0.01, 0.5);

        let healing_sec = self.params.healing_duration_days * SECONDS_PER_DAY / time_acceleration(&self.params);
        self.healing = Some(HealingTask::new(
            self.params.perforation_hearing_loss_db,
            self.params.healing_recovery_fraction,
            healing_sec,
        ));

        log::warn!(
            "Tympanic membrane perforated at {} (risk {:.0}%, {:.0}% of area)",
            state.stage,
            state.perforation_risk,
            state.perforation_area_fraction * 100.0
        );
    }

    fn apply_treatment_flags(&self, state: &mut DiseaseState) {
        state.antibiotic_active = self.treatment.antibiotic.is_some();
        state.painkiller_active = self.treatment.painkiller;
        state.self_healing_active = self.treatment.self_healing;
    }

    /// Expected length of a stage in simulation seconds; `None` for Recovery
    pub fn expected_stage_duration(&self, stage: DiseaseStage, effectiveness: f64) -> Option<f64> {
        let days = stage.base_duration_days()?;
        let age_factor = if self.params.patient_age_years < 2.0 {
            1.5
        } else if self.params.patient_age_years < 6.0 {
            1.2
        } else {
            1.0
        };
        let immune_factor = 2.0 / clamp_finite(self.params.immune_response, 0.1, 10.0);
        let treatment_factor = 1.0 - clamp_finite(effectiveness, 0.0, 100.0) / 100.0 * 0.5;

        Some(days * SECONDS_PER_DAY / time_acceleration(&self.params) * age_factor * immune_factor * treatment_factor)
    }

    /// Begin an antibiotic course. Declined when no episode is active.
    pub fn start_antibiotic(&mut self, effectiveness: f64) -> TransmissionResult<()> {
        if self.state.is_none() {
            return Err(TransmissionError::NoActiveDisease {
                operation: "start_antibiotic",
            });
        }
        if !self.params.pathogen.is_bacterial() {
            log::warn!("Antibiotics have no effect on {} otitis", self.params.pathogen.name());
        }
        self.treatment.antibiotic = Some(AntibioticCourse {
            effectiveness: clamp01(effectiveness),
            started_at_sec: self.clock_sec,
        });
        self.refresh_flags();
        log::info!("Antibiotic course started (effectiveness {:.2})", clamp01(effectiveness));
        Ok(())
    }

    /// Begin analgesia. Declined when no episode is active.
    pub fn start_painkiller(&mut self) -> TransmissionResult<()> {
        if self.state.is_none() {
            return Err(TransmissionError::NoActiveDisease {
                operation: "start_painkiller",
            });
        }
        self.treatment.painkiller = true;
        self.refresh_flags();
        Ok(())
    }

    /// Stop antibiotics and painkillers; natural healing continues
    pub fn stop_treatments(&mut self) {
        self.treatment.antibiotic = None;
        self.treatment.painkiller = false;
        self.refresh_flags();
    }

    pub fn set_self_healing(&mut self, enabled: bool) {
        self.treatment.self_healing = enabled;
        self.refresh_flags();
    }

    fn refresh_flags(&mut self) {
        if let Some(mut state) = self.state.take() {
            self.apply_treatment_flags(&mut state);
            self.state = Some(state);
        }
    }

    /// Cure: discard the episode, treatments and any healing in progress
    pub fn reset(&mut self) {
        if self.state.is_some() {
            log::info!("Disease state reset");
        }
        self.state = None;
        self.treatment = TreatmentPlan::default();
        self.healing = None;
        self.clock_sec = 0.0;
        self.check_timer_sec = 0.0;
        self.history.clear();
    }

    pub fn state(&self) -> Option<&DiseaseState> {
        self.state.as_ref()
    }

    pub fn stage(&self) -> Option<DiseaseStage> {
        self.state.as_ref().map(|s| s.stage)
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn treatment(&self) -> &TreatmentPlan {
        &self.treatment
    }

    /// Treatment effectiveness breakdown at the current time
    pub fn treatment_effect(&self) -> TreatmentEffect {
        self.treatment.evaluate(&self.params, self.clock_sec)
    }

    pub fn healing(&self) -> Option<&HealingTask> {
        self.healing.as_ref()
    }

    pub fn is_healing(&self) -> bool {
        self.healing.is_some()
    }

    /// Stages visited in the current episode, in order
    pub fn stage_history(&self) -> &[DiseaseStage] {
        &self.history
    }

    pub fn params(&self) -> &PathologyParameters {
        &self.params
    }

    /// Build a diagnostics report
    pub fn diagnostics(&self) -> PathologyDiagnostics {
        let mut diag = PathologyDiagnostics::new(&format!("Otitis media ({})", self.params.pathogen.name()));
        let Some(state) = &self.state else {
            diag.add_status("No active disease");
            return diag;
        };

        diag.severity = state.severity;
        diag.add_metric("Fluid level (%)", state.fluid_level * 100.0);
        diag.add_metric("Treatment effectiveness (%)", state.treatment_effectiveness);
        diag.add_metric("Perforation risk (%)", state.perforation_risk);
        diag.add_metric("Mastoiditis risk (%)", state.mastoiditis_risk);
        diag.add_metric("Meningitis risk (%)", state.meningitis_risk);
        diag.add_metric("Pain (%)", state.pain_level * 100.0);
        diag.add_metric("Hearing loss (dB)", state.hearing_loss_db);

        diag.add_status(&format!(
            "Stage: {} ({:.1}s of {})",
            state.stage,
            state.stage_elapsed_sec,
            self.expected_stage_duration(state.stage, state.treatment_effectiveness)
                .map(|d| format!("{:.1}s", d))
                .unwrap_or_else(|| "terminal".to_string())
        ));
        if state.antibiotic_active {
            diag.add_status("Antibiotic course active");
        }
        if state.painkiller_active {
            diag.add_status("Analgesia active");
        }
        if let Some(task) = &self.healing {
            diag.add_status(&format!("Perforation healing: {:.0}%", task.progress() * 100.0));
        }

        if state.perforated {
            diag.add_warning("Tympanic membrane perforated");
        }
        if state.perforation_risk > self.params.perforation_risk_threshold {
            diag.add_warning("High perforation risk");
        }
        if state.mastoiditis_risk > 20.0 {
            diag.add_warning("Risk of mastoiditis");
        }
        if state.meningitis_risk > 1.0 {
            diag.add_warning("Risk of intracranial spread");
        }
        if state.stage == DiseaseStage::Chronic {
            diag.add_warning("Chronic otitis media");
        }

        diag
    }
}

impl PathologyView for PathologyStateMachine {
    fn severity(&self) -> f64 {
        self.state.as_ref().map(|s| s.severity).unwrap_or(0.0)
    }

    fn fluid_level(&self) -> f64 {
        self.state.as_ref().map(|s| s.fluid_level).unwrap_or(0.0)
    }

    fn has_perforation(&self) -> bool {
        self.state.as_ref().map(|s| s.perforated).unwrap_or(false)
    }

    fn perforation_area_fraction(&self) -> f64 {
        self.state
            .as_ref()
            .filter(|s| s.perforated)
            .map(|s| s.perforation_area_fraction)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run(machine: &mut PathologyStateMachine, ticks: usize, dt: f64, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for i in 0..ticks {
            let mut ctx = TickContext::new(dt, i as f64 * dt, &mut rng);
            machine.tick(&mut ctx);
        }
    }

    #[test]
    fn test_no_disease_by_default() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        run(&mut machine, 10, 0.1, 1);
        assert!(machine.state().is_none());
        assert_eq!(machine.severity(), 0.0);
    }

    #[test]
    fn test_severity_climbs_after_trigger() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        machine.trigger(DiseaseStage::Acute, 0.9);
        assert_eq!(machine.severity(), 0.0);

        run(&mut machine, 100, 0.016, 1);
        let state = machine.state().unwrap();
        assert_eq!(state.stage, DiseaseStage::Acute);
        assert!(state.severity > 0.0 && state.severity < 0.9);
        assert!(state.fluid_level > 0.0);
        assert!(state.hearing_loss_db > 0.0);
    }

    #[test]
    fn test_acute_duration() {
        let machine = PathologyStateMachine::new(&PathologyParameters::default());
        // 2 days → 20 s, × 1.2 (age 4) × 2 (immune 1.0) × 0.9 (20% natural healing)
        let expected = machine.expected_stage_duration(DiseaseStage::Acute, 20.0).unwrap();
        assert!((expected - 43.2).abs() < 1e-9);
        assert!(machine.expected_stage_duration(DiseaseStage::Recovery, 0.0).is_none());
    }

    #[test]
    fn test_treatment_requires_disease() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        assert_eq!(
            machine.start_antibiotic(0.8),
            Err(TransmissionError::NoActiveDisease {
                operation: "start_antibiotic"
            })
        );
        assert!(machine.start_painkiller().is_err());
        assert!(machine.treatment().antibiotic.is_none());

        machine.trigger(DiseaseStage::EarlyOnset, 0.5);
        assert!(machine.start_antibiotic(0.8).is_ok());
        assert!(machine.state().unwrap().antibiotic_active);
        machine.stop_treatments();
        assert!(!machine.state().unwrap().antibiotic_active);
    }

    #[test]
    fn test_forced_perforation_starts_healing() {
        let params = PathologyParameters {
            perforation_probability: 1.0,
            perforation_risk_threshold: 0.0,
            ..Default::default()
        };
        let mut machine = PathologyStateMachine::new(&params);
        machine.trigger(DiseaseStage::Peak, 1.0);
        run(&mut machine, 400, 0.016, 3);

        assert!(machine.has_perforation());
        assert!(machine.is_healing());
        assert!(machine.perforation_area_fraction() > 0.0);

        let before = machine.state().unwrap().hearing_loss_db;
        machine.reset();
        assert!(!machine.is_healing());
        assert!(!machine.has_perforation());
        assert!(before > 0.0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        machine.trigger(DiseaseStage::Acute, 0.7);
        machine.start_painkiller().unwrap();
        run(&mut machine, 50, 0.1, 1);

        machine.reset();
        let once = (machine.state().cloned(), machine.treatment().clone(), machine.is_healing());
        machine.reset();
        let twice = (machine.state().cloned(), machine.treatment().clone(), machine.is_healing());
        assert_eq!(once, twice);
        assert!(machine.stage_history().is_empty());
    }

    #[test]
    fn test_invalid_severity_defaults() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        machine.trigger(DiseaseStage::Incubation, f64::NAN);
        assert_eq!(machine.state().unwrap().peak_severity, 0.5);
        machine.trigger(DiseaseStage::Incubation, 7.0);
        assert_eq!(machine.state().unwrap().peak_severity, 1.0);
    }

    #[test]
    fn test_diagnostics() {
        let mut machine = PathologyStateMachine::new(&PathologyParameters::default());
        assert_eq!(machine.diagnostics().status, vec!["No active disease".to_string()]);

        machine.trigger(DiseaseStage::Acute, 0.9);
        run(&mut machine, 10, 0.1, 1);
        let diag = machine.diagnostics();
        assert!(diag.severity > 0.0);
        assert!(diag.metric("Hearing loss (dB)").unwrap() > 0.0);
    }
}
