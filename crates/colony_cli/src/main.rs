use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colony_control::{CommandSource, ControllerSet};
use colony_core::admin::{
    AdminRequest, CommandOutcome, Invoker, MessageSink, NoRefund, OperatorList, ResearchAdmin,
};
use colony_core::{
    ActorId, AdminError, BranchId, ColonyId, Command, CommandEnvelope, CommandId, DimensionId, Event,
    EventEnvelope, EventLevel, GameState, RequiresAssignedWorker, ResearchId, ResearchRegistry,
};
use colony_world::{
    build_initial_state, load_content, load_state, save_state, validate_state, HOME_DIMENSION,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "colony_cli", about = "Colony research simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation for a fixed number of ticks.
    Run {
        #[arg(long)]
        ticks: u64,
        /// Generate the world from this seed. Mutually exclusive with --state.
        #[arg(long, conflicts_with = "state_file")]
        seed: Option<u64>,
        /// Load the initial GameState from a JSON file. Mutually exclusive with --seed.
        #[arg(long = "state", conflicts_with = "seed")]
        state_file: Option<String>,
        #[arg(long, default_value = "./content")]
        content_dir: String,
        #[arg(long, default_value_t = 100)]
        print_every: u64,
        #[arg(long, value_enum, default_value_t = Level::Normal)]
        event_level: Level,
        /// Write the final GameState to this file.
        #[arg(long)]
        save: Option<String>,
    },
    /// Inspect or override a colony's research.
    Research {
        #[command(flatten)]
        session: Session,
        #[command(subcommand)]
        action: ResearchAction,
    },
}

/// Who runs a research command, and against which saved world.
#[derive(Args)]
struct Session {
    #[arg(long = "state")]
    state_file: String,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    #[arg(long)]
    actor: String,
    /// Run with operator privileges.
    #[arg(long)]
    op: bool,
    #[arg(long, default_value = HOME_DIMENSION)]
    dimension: String,
}

#[derive(Subcommand)]
enum ResearchAction {
    /// Show in-progress research with the estimated time left.
    List { colony_id: u32 },
    /// Fill a research's progress. Requires --op.
    Complete {
        colony_id: u32,
        #[arg(default_value = "")]
        research_id: String,
    },
    /// Remove a research and attempt a refund.
    Cancel {
        colony_id: u32,
        #[arg(default_value = "")]
        research_id: String,
    },
    /// Start a research; applied on the next tick.
    Begin {
        colony_id: u32,
        research_id: String,
        branch: String,
        depth: u32,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Level {
    Normal,
    Debug,
}

impl From<Level> for EventLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Normal => EventLevel::Normal,
            Level::Debug => EventLevel::Debug,
        }
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

fn run(
    ticks: u64,
    seed: Option<u64>,
    state_file: Option<&str>,
    content_dir: &str,
    print_every: u64,
    event_level: EventLevel,
    save: Option<&str>,
) -> Result<()> {
    let content = load_content(content_dir)?;
    let registry =
        ResearchRegistry::from_content(&content).context("building research registry")?;

    let (mut state, mut rng) = if let Some(path) = state_file {
        let loaded = load_state(path)?;
        validate_state(&loaded, &content, &registry)
            .with_context(|| format!("state file {path} does not fit the current content"))?;
        let rng_seed = loaded.meta.seed ^ loaded.meta.tick;
        (loaded, ChaCha8Rng::seed_from_u64(rng_seed))
    } else {
        let resolved_seed = seed.unwrap_or_else(rand::random);
        let mut new_rng = ChaCha8Rng::seed_from_u64(resolved_seed);
        let new_state = build_initial_state(&content, resolved_seed, &mut new_rng);
        (new_state, new_rng)
    };

    let mut controllers = ControllerSet::standard();
    let print_every = print_every.max(1);

    println!(
        "Starting simulation: ticks={ticks} seed={} colonies={} content_version={}",
        state.meta.seed,
        state.colonies.len(),
        content.content_version,
    );
    println!("{}", "-".repeat(80));

    for _ in 0..ticks {
        let mut next_command_id = state.counters.next_command_id;
        let commands = controllers.generate_commands(&state, &content, &mut next_command_id);
        state.counters.next_command_id = next_command_id;

        let events = colony_core::tick(
            &mut state,
            &commands,
            &registry,
            &RequiresAssignedWorker,
            &mut rng,
            event_level,
        );
        print_notable(&events);

        if state.meta.tick % print_every == 0 {
            print_status(&state);
        }
    }

    println!("{}", "-".repeat(80));
    println!("Done. Final state at tick {}:", state.meta.tick);
    print_status(&state);

    if let Some(path) = save {
        save_state(path, &state)?;
        println!("State written to {path}");
    }
    Ok(())
}

fn print_notable(events: &[EventEnvelope]) {
    for envelope in events {
        match &envelope.event {
            Event::ResearchCompleted {
                colony_id,
                research_id,
            } => println!(
                "*** RESEARCH COMPLETED: {research_id} in colony {colony_id} at tick={:04} ***",
                envelope.tick
            ),
            Event::PickupFulfilled {
                colony_id,
                building_id,
                items,
                ..
            } => println!(
                "    pickup: colony {colony_id} collected {items} items from {building_id}"
            ),
            _ => {}
        }
    }
}

fn print_status(state: &GameState) {
    let tick = state.meta.tick;
    for colony in &state.colonies {
        println!(
            "[tick={tick:04}]  colony={id}  researchers={researchers}  \
             in_progress={open}  completed={done}  pickups={pickups}",
            id = colony.id,
            researchers = colony.researchers,
            open = colony.research.len(),
            done = colony.research.completed().len(),
            pickups = colony.pickup_queue.len(),
        );
    }
}

// ---------------------------------------------------------------------------
// Research commands
// ---------------------------------------------------------------------------

/// Prints delivered messages for the invoking actor.
struct Console;

impl MessageSink for Console {
    fn deliver(&mut self, _actor: &ActorId, message: String) {
        println!("{message}");
    }
}

fn research(session: &Session, action: ResearchAction) -> Result<bool> {
    let content = load_content(&session.content_dir)?;
    let registry =
        ResearchRegistry::from_content(&content).context("building research registry")?;
    let mut state = load_state(&session.state_file)?;
    validate_state(&state, &content, &registry).with_context(|| {
        format!(
            "state file {} does not fit the current content",
            session.state_file
        )
    })?;
    let invoker = Invoker {
        actor: ActorId(session.actor.clone()),
        dimension: DimensionId(session.dimension.clone()),
    };

    let (outcome, events) = match route(action) {
        Routed::Admin(request) => {
            let operators = if session.op {
                OperatorList([invoker.actor.clone()].into_iter().collect())
            } else {
                OperatorList::default()
            };
            let mut refunds = NoRefund;
            let mut admin = ResearchAdmin::new(&registry, &operators, &mut refunds);
            let mut events = Vec::new();
            let outcome =
                admin.execute(&mut state, &invoker, &request, &mut Console, &mut events);
            (outcome, events)
        }
        Routed::Begin(command) => begin_research(&mut state, &registry, &invoker, command),
    };

    for envelope in &events {
        tracing::info!(id = %envelope.id, tick = envelope.tick, event = ?envelope.event, "research event");
    }
    if outcome.success && !events.is_empty() {
        save_state(&session.state_file, &state)?;
    }
    Ok(outcome.success)
}

/// Where a research action is handled.
#[derive(Debug, PartialEq)]
enum Routed {
    Admin(AdminRequest),
    /// Starting research goes through the tick like any other colony command.
    Begin(Command),
}

fn route(action: ResearchAction) -> Routed {
    match action {
        ResearchAction::List { colony_id } => Routed::Admin(AdminRequest::List {
            colony_id: ColonyId(colony_id),
        }),
        ResearchAction::Complete {
            colony_id,
            research_id,
        } => Routed::Admin(AdminRequest::Complete {
            colony_id: ColonyId(colony_id),
            research_id,
        }),
        ResearchAction::Cancel {
            colony_id,
            research_id,
        } => Routed::Admin(AdminRequest::Cancel {
            colony_id: ColonyId(colony_id),
            research_id,
        }),
        ResearchAction::Begin {
            colony_id,
            research_id,
            branch,
            depth,
        } => Routed::Begin(Command::BeginResearch {
            colony_id: ColonyId(colony_id),
            research_id: ResearchId(research_id),
            branch: BranchId(branch),
            depth,
        }),
    }
}

/// Why the tick would drop this `BeginResearch`, phrased for the invoker.
fn begin_rejection(
    state: &GameState,
    registry: &ResearchRegistry,
    invoker: &Invoker,
    command: &Command,
) -> Option<String> {
    let Command::BeginResearch {
        colony_id,
        research_id,
        branch,
        depth,
    } = command
    else {
        return None;
    };
    let Some(colony) = state.resolve_colony(*colony_id, &invoker.dimension) else {
        return Some(AdminError::ColonyNotFound(*colony_id).to_string());
    };
    if !colony.is_officer(&invoker.actor) {
        return Some(format!(
            "Research could not be started: {} is not an officer of colony {colony_id}.",
            invoker.actor
        ));
    }
    colony
        .research
        .can_begin(registry, research_id, branch, *depth)
        .err()
        .map(|err| format!("Research could not be started: {err}."))
}

fn begin_research(
    state: &mut GameState,
    registry: &ResearchRegistry,
    invoker: &Invoker,
    command: Command,
) -> (CommandOutcome, Vec<EventEnvelope>) {
    if let Some(message) = begin_rejection(state, registry, invoker, &command) {
        Console.deliver(&invoker.actor, message.clone());
        return (
            CommandOutcome {
                success: false,
                messages: vec![message],
            },
            Vec::new(),
        );
    }

    let tick = state.meta.tick;
    let envelope = CommandEnvelope {
        id: CommandId(format!("cmd_{:06}", state.counters.next_command_id)),
        issued_by: invoker.actor.clone(),
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    };
    state.counters.next_command_id += 1;

    let mut rng = ChaCha8Rng::seed_from_u64(state.meta.seed ^ tick);
    let events = colony_core::tick(
        state,
        &[envelope],
        registry,
        &RequiresAssignedWorker,
        &mut rng,
        EventLevel::Normal,
    );
    let started = events.iter().find_map(|e| match &e.event {
        Event::ResearchStarted { research_id, .. } => Some(research_id.clone()),
        _ => None,
    });
    let messages = match &started {
        Some(id) => vec![format!("Research {id} started.")],
        None => vec!["Research could not be started.".to_string()],
    };
    for message in &messages {
        Console.deliver(&invoker.actor, message.clone());
    }
    (
        CommandOutcome {
            success: started.is_some(),
            messages,
        },
        events,
    )
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            ticks,
            seed,
            state_file,
            content_dir,
            print_every,
            event_level,
            save,
        } => {
            run(
                ticks,
                seed,
                state_file.as_deref(),
                &content_dir,
                print_every,
                event_level.into(),
                save.as_deref(),
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Research { session, action } => {
            if research(&session, action)? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
