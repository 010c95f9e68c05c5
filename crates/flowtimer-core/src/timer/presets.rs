//! Built-in timer definitions.

use super::definition::{Repetitions, TimerDefinition, TimerStep};

/// All built-in presets, in display order.
pub fn all() -> Vec<TimerDefinition> {
    vec![
        box_breathing(),
        breathing_478(),
        tabata(),
        hiit_40_20(),
        emom(),
        boxing_rounds(),
        pomodoro(),
        yoga_flow(),
        meditation_3min(),
    ]
}

/// Look up a preset by id.
pub fn find(id: &str) -> Option<TimerDefinition> {
    all().into_iter().find(|p| p.id == id)
}

pub fn box_breathing() -> TimerDefinition {
    TimerDefinition::new(
        "Box Breathing",
        vec![
            TimerStep::new("Inhale", 4).with_id("1").with_speech("Inhale"),
            TimerStep::new("Hold", 4).with_id("2").with_speech("Hold"),
            TimerStep::new("Exhale", 4).with_id("3").with_speech("Exhale"),
            TimerStep::new("Hold", 4).with_id("4").with_speech("Hold"),
        ],
        Repetitions::Infinite,
    )
    .with_id("box-breathing")
    .with_tags(&["breathwork", "calm", "focus"])
    .with_color("#4ADE80")
}

pub fn breathing_478() -> TimerDefinition {
    TimerDefinition::new(
        "4-7-8 Breathing",
        vec![
            TimerStep::new("Inhale through the nose", 4).with_id("1"),
            TimerStep::new("Hold", 7).with_id("2"),
            TimerStep::new("Exhale through the mouth", 8).with_id("3"),
        ],
        Repetitions::Count(4),
    )
    .with_id("478")
    .with_tags(&["breathwork", "sleep", "anxiety"])
    .with_color("#818cf8")
}

pub fn tabata() -> TimerDefinition {
    TimerDefinition::new(
        "Tabata",
        vec![
            TimerStep::new("Sprint", 20).with_id("1"),
            TimerStep::new("Rest", 10).with_id("2"),
        ],
        Repetitions::Count(8),
    )
    .with_id("tabata")
    .with_tags(&["workout", "hiit", "intense"])
    .with_color("#ef4444")
}

pub fn hiit_40_20() -> TimerDefinition {
    TimerDefinition::new(
        "HIIT 40/20",
        vec![
            TimerStep::new("High intensity", 40).with_id("1"),
            TimerStep::new("Recovery", 20).with_id("2"),
        ],
        Repetitions::Count(10),
    )
    .with_id("hiit-40-20")
    .with_tags(&["workout", "hiit", "cardio"])
    .with_color("#f87171")
}

/// Every minute on the minute: a single step repeated.
pub fn emom() -> TimerDefinition {
    TimerDefinition::new(
        "EMOM",
        vec![TimerStep::new("Perform task", 60).with_id("1")],
        Repetitions::Count(10),
    )
    .with_id("emom")
    .with_tags(&["workout", "strength"])
}

pub fn boxing_rounds() -> TimerDefinition {
    TimerDefinition::new(
        "Boxing Rounds",
        vec![
            TimerStep::new("Fight round", 180).with_id("1"),
            TimerStep::new("Rest", 60).with_id("2"),
        ],
        Repetitions::Count(3),
    )
    .with_id("boxing")
    .with_tags(&["workout", "boxing"])
}

pub fn pomodoro() -> TimerDefinition {
    TimerDefinition::new(
        "Pomodoro",
        vec![
            TimerStep::new("Focus", 25 * 60).with_id("1"),
            TimerStep::new("Short break", 5 * 60).with_id("2"),
        ],
        Repetitions::Count(4),
    )
    .with_id("pomodoro")
    .with_tags(&["productivity", "focus"])
}

pub fn yoga_flow() -> TimerDefinition {
    TimerDefinition::new(
        "Yoga Flow",
        vec![
            TimerStep::new("Forward and back bend", 30)
                .with_id("yf1")
                .with_instructions("Bend forward slowly, then arch backward. Hold each position."),
            TimerStep::new("Sun salutation", 45)
                .with_id("yf2")
                .with_instructions("Flow through the full sun salutation sequence."),
            TimerStep::new("Relaxation", 60)
                .with_id("yf3")
                .with_instructions("Lie down in Shavasana. Breathe naturally."),
        ],
        Repetitions::Count(2),
    )
    .with_id("yoga-flow")
    .with_tags(&["yoga", "stretch"])
}

pub fn meditation_3min() -> TimerDefinition {
    TimerDefinition::new(
        "3 Minute Meditation",
        vec![
            TimerStep::new("Preparation", 15).with_id("3m1"),
            TimerStep::new("Meditate", 3 * 60).with_id("3m2"),
        ],
        Repetitions::Infinite,
    )
    .with_id("meditation-3min")
    .with_tags(&["meditation"])
}
