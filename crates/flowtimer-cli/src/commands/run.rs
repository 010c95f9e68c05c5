use std::path::PathBuf;

use clap::Args;
use flowtimer_core::storage::NotificationsConfig;
use flowtimer_core::timer::presets;
use flowtimer_core::{
    Config, EffectHandler, Event, EventSink, Repetitions, TimerDefinition, TimerEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use super::{format_clock, read_definition};

#[derive(Args)]
pub struct RunArgs {
    /// Built-in preset id (see `presets list`)
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    preset: Option<String>,
    /// JSON timer definition file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Override the repetition count (-1 for infinite)
    #[arg(long, allow_negative_numbers = true)]
    repetitions: Option<i64>,
    /// Print events and snapshots as JSON lines
    #[arg(long)]
    json: bool,
}

/// Interactive commands read from stdin while a timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Toggle,
    Next,
    Prev,
    Reset,
    Restart,
    Jump(usize),
    Status,
    Quit,
}

fn parse_control(line: &str) -> Option<Control> {
    let mut parts = line.split_whitespace();
    let control = match parts.next()? {
        "p" | "pause" | "start" => Control::Toggle,
        "n" | "next" => Control::Next,
        "b" | "prev" => Control::Prev,
        "r" | "reset" => Control::Reset,
        "R" | "restart" => Control::Restart,
        "j" | "jump" => {
            // Steps are shown 1-based.
            let n: usize = parts.next()?.parse().ok()?;
            Control::Jump(n.checked_sub(1)?)
        }
        "s" | "status" => Control::Status,
        "q" | "quit" => Control::Quit,
        _ => return None,
    };
    Some(control)
}

/// Sound and speech cues for a terminal: a bell for step changes and the
/// step's cue text on stderr. Every effect is also forwarded as an event.
struct TerminalCues {
    definition: TimerDefinition,
    sound: bool,
    speech: bool,
    sink: EventSink,
}

impl TerminalCues {
    fn new(definition: TimerDefinition, notifications: &NotificationsConfig, sink: EventSink) -> Self {
        let audible = notifications.volume > 0;
        Self {
            definition,
            sound: notifications.sound && audible,
            speech: notifications.speech && audible,
            sink,
        }
    }

    fn bell(&self, times: usize) {
        if self.sound {
            eprint!("{}", "\x07".repeat(times));
        }
    }
}

impl EffectHandler for TerminalCues {
    fn on_step_change(&mut self, step_index: usize, repetition: u32) {
        self.bell(1);
        if self.speech {
            if let Some(text) = self.definition.step(step_index).and_then(|s| s.cue_text()) {
                eprintln!("» {text}");
            }
        }
        self.sink.on_step_change(step_index, repetition);
    }

    fn on_cycle_complete(&mut self) {
        self.sink.on_cycle_complete();
    }

    fn on_complete(&mut self) {
        self.bell(3);
        self.sink.on_complete();
    }
}

fn load_definition(args: &RunArgs) -> Result<TimerDefinition, Box<dyn std::error::Error>> {
    let mut definition = match (&args.preset, &args.file) {
        (Some(id), _) => presets::find(id).ok_or_else(|| format!("unknown preset: {id}"))?,
        (None, Some(path)) => read_definition(path)?,
        (None, None) => return Err("either --preset or --file is required".into()),
    };
    if let Some(n) = args.repetitions {
        definition.repetitions = Repetitions::try_from(n)?;
    }
    Ok(definition)
}

fn status_line(engine: &TimerEngine) -> String {
    let definition = engine.definition();
    let run = engine.run_state();
    let step_name = engine.current_step().map(|s| s.name.as_str()).unwrap_or("");
    let state = if run.is_running { "" } else { "  [paused]" };
    format!(
        "{:>6}  {:<24} step {}/{}  rep {}/{}  {:>3.0}%{}",
        format_clock(u64::from(run.remaining_secs)),
        step_name,
        run.step_index + 1,
        definition.step_count(),
        run.repetition,
        definition.repetitions,
        engine.progress_ratio() * 100.0,
        state,
    )
}

fn print_event(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        Event::CycleCompleted {
            completed_repetition,
            ..
        } => println!("-- repetition {completed_repetition} complete"),
        Event::TimerCompleted { .. } => println!("-- timer complete"),
        Event::TimerPaused { .. } => println!("-- paused"),
        Event::TimerReset { restarted, .. } => {
            println!("-- reset{}", if *restarted { " (restarted)" } else { "" })
        }
        _ => {}
    }
    Ok(())
}

fn render(engine: &TimerEngine, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&engine.snapshot_event())?);
    } else {
        println!("{}", status_line(engine));
    }
    Ok(())
}

fn apply(engine: &mut TimerEngine, control: Control) -> Option<Event> {
    match control {
        Control::Toggle if engine.is_running() => engine.pause(),
        Control::Toggle => engine.start(),
        Control::Next => engine.next_step(),
        Control::Prev => engine.prev_step(),
        Control::Reset => engine.reset(false),
        Control::Restart => engine.reset(true),
        Control::Jump(index) => engine.jump_to_step(index),
        Control::Status | Control::Quit => None,
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let definition = load_definition(&args)?;
    let mut config = Config::load_or_default();
    config.record_recent(&definition.id);
    if let Err(e) = config.save() {
        warn!("could not save recent timers: {e}");
    }

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(drive(definition, config, args.json));
    // A stdin read may still be blocked on the terminal.
    rt.shutdown_background();
    result
}

async fn drive(
    definition: TimerDefinition,
    config: Config,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = TimerEngine::bind_with(definition.clone(), config.ticker_options())?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    engine.set_effects(Box::new(TerminalCues::new(
        definition,
        &config.notifications,
        EventSink::new(event_tx),
    )));

    if !json {
        println!(
            "{} -- p pause/resume, n next, b back, r reset, R restart, j N jump, q quit",
            engine.definition().name
        );
    }
    if let Some(event) = engine.start() {
        print_event(&event, json)?;
    }
    render(&engine, json)?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = engine.wait_event() => {
                if event.is_none() {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line? {
                Some(line) => match parse_control(&line) {
                    Some(Control::Quit) => {
                        engine.pause();
                        break;
                    }
                    Some(control) => {
                        if let Some(event) = apply(&mut engine, control) {
                            print_event(&event, json)?;
                        }
                    }
                    None => eprintln!("unknown command: {}", line.trim()),
                },
                None => stdin_open = false,
            },
        }

        let mut finished = false;
        while let Ok(event) = event_rx.try_recv() {
            finished |= matches!(event, Event::TimerCompleted { .. });
            print_event(&event, json)?;
        }
        render(&engine, json)?;
        if finished {
            break;
        }
    }
    Ok(())
}
