//! Tests for the orchestration loop.

use pretty_assertions::assert_eq;

use super::*;
use crate::beat::Beat;
use crate::candidate::FillRole;
use crate::memory::MemoryConfig;
use crate::operator::groove::{Backbeat, GrooveOperator, Subdivision, Timekeeper};
use crate::operator::phrase::{CrashOnOne, PhraseOperator, TomFill};
use crate::physicality::StrictnessLevel;
use crate::plan::SectionSpec;

fn generator() -> Generator {
    Generator::new(
        LimbModel::right_handed(),
        PhysicalityRules::default(),
        StyleConfig::default(),
    )
    .unwrap()
}

fn generator_with_style(style: StyleConfig) -> Generator {
    Generator::new(LimbModel::right_handed(), PhysicalityRules::default(), style).unwrap()
}

fn context(generator: &Generator, bar: u32) -> AgentContext {
    AgentContext::builder(bar, SectionType::Verse)
        .phrase_position(0.25)
        .bars_until_section_end(3)
        .seed(11)
        .available_roles(generator.kit_roles())
        .build()
        .unwrap()
}

fn fill_context(generator: &Generator, bar: u32) -> AgentContext {
    AgentContext::builder(bar, SectionType::Verse)
        .phrase_position(0.75)
        .bars_until_section_end(0)
        .fill_window(true)
        .tension(0.9)
        .seed(11)
        .available_roles(generator.kit_roles())
        .build()
        .unwrap()
}

fn plan() -> SectionPlan {
    SectionPlan::new(vec![
        SectionSpec::new(SectionType::Intro, 2).with_levels(0.4, 0.3, 0.2),
        SectionSpec::new(SectionType::Verse, 4).with_levels(0.6, 0.5, 0.8),
        SectionSpec::new(SectionType::Chorus, 4).with_levels(0.9, 0.8, 0.6),
    ])
    .unwrap()
}

#[test]
fn steady_bar_has_a_full_groove() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let survivors = generator
        .generate_bar(&context(&generator, 2), &mut memory, None)
        .unwrap();

    let snares: Vec<f64> = survivors
        .iter()
        .filter(|c| c.operator_id == "groove.backbeat")
        .map(|c| c.beat.as_f64())
        .collect();
    assert_eq!(snares, vec![2.0, 4.0]);
    assert!(survivors.iter().any(|c| c.role == Role::KICK));
    assert!(survivors.iter().any(|c| c.role == Role::CLOSED_HAT));
    assert!(survivors.iter().all(|c| !c.operator_id.starts_with("phrase.")));
}

#[test]
fn survivors_are_in_time_order() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let survivors = generator
        .generate_bar(&fill_context(&generator, 4), &mut memory, None)
        .unwrap();
    let mut sorted = survivors.clone();
    sorted.sort_by(time_order);
    assert_eq!(survivors, sorted);
}

#[test]
fn crash_takes_the_downbeat_from_the_hat() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let ctx = AgentContext::builder(5, SectionType::Chorus)
        .phrase_position(0.0)
        .bars_until_section_end(3)
        .energy(0.5)
        .available_roles(generator.kit_roles())
        .build()
        .unwrap();
    let mut log = DiagnosticLog::new();
    let survivors = generator
        .generate_bar(&ctx, &mut memory, Some(&mut log))
        .unwrap();

    let on_one: Vec<&Role> = survivors
        .iter()
        .filter(|c| c.beat == Beat::ONE && c.role.is_cymbal())
        .map(|c| &c.role)
        .collect();
    assert_eq!(on_one, vec![&Role::CRASH]);
    assert!(log.removals().any(|d| {
        d.role == Some(Role::CLOSED_HAT)
            && d.reason
                == DiagnosticReason::Outscored {
                    survivor: "phrase.crash_on_one:5:0".to_string(),
                }
    }));
}

#[test]
fn protected_backbeat_survives_a_tom_fill() {
    let generator = generator().with_operators(vec![
        DrumOperator::Groove(GrooveOperator::Backbeat(Backbeat)),
        DrumOperator::Phrase(PhraseOperator::TomFill(TomFill::ascending())),
    ]);
    let strict = Generator::new(
        LimbModel::right_handed(),
        PhysicalityRules::new(StrictnessLevel::Strict, 32),
        StyleConfig::default(),
    )
    .unwrap()
    .with_operators(generator.operators().to_vec());

    for generator in [generator, strict] {
        let mut memory = AgentMemory::default();
        let survivors = generator
            .generate_bar(&fill_context(&generator, 8), &mut memory, None)
            .unwrap();
        let backbeat: Vec<f64> = survivors
            .iter()
            .filter(|c| c.protected)
            .map(|c| c.beat.as_f64())
            .collect();
        assert_eq!(backbeat, vec![2.0, 4.0]);
        assert!(!survivors
            .iter()
            .any(|c| c.role.is_tom() && c.beat == Beat::whole(4)));
    }
}

#[test]
fn disabled_operators_never_fire() {
    let mut style = StyleConfig::default();
    style
        .disabled_operators
        .insert("groove.timekeeper".to_string());
    let generator = generator_with_style(style);
    let mut memory = AgentMemory::default();
    let survivors = generator
        .generate_bar(&context(&generator, 1), &mut memory, None)
        .unwrap();
    assert!(survivors.iter().all(|c| c.operator_id != "groove.timekeeper"));
}

#[test]
fn style_weight_scales_scores() {
    let mut style = StyleConfig::default();
    style
        .operator_weights
        .insert("groove.pulse_kick".to_string(), 0.5);
    let generator = generator_with_style(style);
    let memory = AgentMemory::default();
    let proposed = generator.propose(&context(&generator, 1), &memory).unwrap();
    let kick = proposed
        .iter()
        .find(|c| c.operator_id == "groove.pulse_kick")
        .unwrap();
    assert!((kick.score - 0.425).abs() < 1e-12);
}

#[test]
fn repetition_lowers_scores_on_later_bars() {
    let generator = generator();
    let mut memory = AgentMemory::new(MemoryConfig::default()).unwrap();

    let first = generator.propose(&context(&generator, 1), &memory).unwrap();
    generator
        .generate_bar(&context(&generator, 1), &mut memory, None)
        .unwrap();
    let second = generator.propose(&context(&generator, 2), &memory).unwrap();

    let kick_score = |candidates: &[Candidate]| {
        candidates
            .iter()
            .find(|c| c.operator_id == "groove.pulse_kick")
            .map(|c| c.score)
            .unwrap()
    };
    assert!(kick_score(&second) < kick_score(&first));
}

#[test]
fn role_caps_remove_lowest_scores_first() {
    let mut style = StyleConfig::default();
    style.role_caps.insert(Role::CLOSED_HAT, 2);
    style.role_caps.insert(Role::SNARE, 0);
    let generator = generator_with_style(style).with_operators(vec![
        DrumOperator::Groove(GrooveOperator::Backbeat(Backbeat)),
        DrumOperator::Groove(GrooveOperator::Timekeeper(Timekeeper::new(
            Subdivision::Eighth,
        ))),
    ]);
    let mut memory = AgentMemory::default();
    let mut log = DiagnosticLog::new();
    let survivors = generator
        .generate_bar(&context(&generator, 1), &mut memory, Some(&mut log))
        .unwrap();

    // Equal scores: the tie-break keeps the lowest candidate ids.
    let hats: Vec<&str> = survivors
        .iter()
        .filter(|c| c.role == Role::CLOSED_HAT)
        .map(|c| c.candidate_id.as_str())
        .collect();
    assert_eq!(hats, vec!["groove.timekeeper:1:0", "groove.timekeeper:1:1"]);
    // A protected snare ignores the cap.
    assert_eq!(survivors.iter().filter(|c| c.role == Role::SNARE).count(), 2);
    assert_eq!(
        log.removals()
            .filter(|d| d.reason == DiagnosticReason::RoleCap { cap: 2 })
            .count(),
        6
    );
}

#[test]
fn memory_receives_decisions_and_signatures() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let survivors = generator
        .generate_bar(&context(&generator, 3), &mut memory, None)
        .unwrap();

    assert_eq!(memory.current_bar(), 3);
    assert_eq!(memory.decisions_for(3).len(), survivors.len());
    let signature = memory.section_signature(SectionType::Verse);
    assert!(signature.contains(&"groove.backbeat".to_string()));
    assert!(memory.last_fill_shape().is_none());
}

#[test]
fn fill_bars_record_a_fill_shape() {
    let generator = generator().with_operators(vec![DrumOperator::Phrase(
        PhraseOperator::TomFill(TomFill::descending()),
    )]);
    let mut memory = AgentMemory::default();
    generator
        .generate_bar(&fill_context(&generator, 8), &mut memory, None)
        .unwrap();

    let shape = memory.last_fill_shape().unwrap();
    assert_eq!(shape.bar, 8);
    assert_eq!(shape.tag.as_deref(), Some("phrase.drop_fill_descending"));
    assert!(shape.roles.iter().all(|r| r.is_tom()));
    assert!(shape.density > 0.0 && shape.density <= 1.0);
}

#[test]
fn recent_fill_reaches_operators() {
    let generator = generator().with_operators(vec![DrumOperator::Phrase(
        PhraseOperator::TomFill(TomFill::ascending()),
    )]);
    let mut memory = AgentMemory::default();
    let first = generator
        .generate_bar(&fill_context(&generator, 4), &mut memory, None)
        .unwrap();
    let second = generator
        .generate_bar(&fill_context(&generator, 8), &mut memory, None)
        .unwrap();
    let start = |c: &[Candidate]| {
        c.iter()
            .find(|c| c.fill_role == FillRole::FillStart)
            .map(|c| c.score)
            .unwrap()
    };
    assert!(start(&second) < start(&first));
}

#[test]
fn crash_only_operator_set() {
    let generator =
        generator().with_operators(vec![DrumOperator::Phrase(PhraseOperator::CrashOnOne(
            CrashOnOne,
        ))]);
    let performance = generator
        .generate_pass(&plan(), 3, &mut AgentMemory::default())
        .unwrap();
    let crash_bars: Vec<u32> = performance.events().map(|c| c.bar).collect();
    assert_eq!(crash_bars, vec![1, 3, 7]);
}

#[test]
fn pass_is_deterministic_and_clears_memory() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let a = generator.generate_pass(&plan(), 42, &mut memory).unwrap();
    let b = generator.generate_pass(&plan(), 42, &mut memory).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.bars.len(), 10);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn seed_changes_the_performance() {
    let generator = generator();
    let mut memory = AgentMemory::default();
    let base = generator.generate_pass(&plan(), 1, &mut memory).unwrap();
    let differs = (2..12).any(|seed| {
        let other = generator.generate_pass(&plan(), seed, &mut memory).unwrap();
        other.bars != base.bars
    });
    assert!(differs);
}

#[test]
fn section_signatures_are_reported() {
    let generator = generator();
    let performance = generator
        .generate_pass(&plan(), 5, &mut AgentMemory::default())
        .unwrap();
    let chorus = &performance.section_signatures[&SectionType::Chorus];
    assert!(chorus.contains(&"phrase.crash_on_one".to_string()));
    assert!(chorus.contains(&"groove.backbeat".to_string()));
    let mut sorted = chorus.clone();
    sorted.sort();
    assert_eq!(chorus, &sorted);
}

#[test]
fn validation_does_not_modify_the_performance() {
    let generator = generator();
    let performance = generator
        .generate_pass(&plan(), 5, &mut AgentMemory::default())
        .unwrap();
    let before = performance.clone();
    let report = generator.validate_performance(&performance);
    assert_eq!(performance, before);
    assert_eq!(report.ok, report.violations.is_empty());
    for violation in &report.violations {
        assert!(generator
            .sticking_validator()
            .rule_ids()
            .contains(&violation.rule_id.as_str()));
    }
}

#[test]
fn fill_shape_tag_prefers_most_hits() {
    let generator = generator();
    let ctx = fill_context(&generator, 8);
    let mut candidates = TomFill::ascending().generate_candidates(&ctx).unwrap();
    let mut extra = candidates[0].clone();
    extra.operator_id = "phrase.aaa".to_string();
    candidates.push(extra);
    let shape = fill_shape(&ctx, &candidates).unwrap();
    assert_eq!(shape.tag.as_deref(), Some("phrase.build_fill_ascending"));
    assert!(fill_shape(&ctx, &[]).is_none());
}

#[test]
fn invalid_context_is_rejected() {
    let generator = generator();
    let mut ctx = context(&generator, 1);
    ctx.energy = 2.0;
    let err = generator
        .generate_bar(&ctx, &mut AgentMemory::default(), None)
        .unwrap_err();
    assert_eq!(err.code(), "STICK_011");
}
