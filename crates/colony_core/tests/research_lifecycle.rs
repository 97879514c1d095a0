//! Integration test: begin → contribute → operator overrides → completion.

use colony_core::admin::{AdminRequest, Invoker, MessageLog, NoRefund, OperatorList, ResearchAdmin};
use colony_core::test_fixtures::{base_content, base_registry, base_state, make_rng, MAYOR, OVERWORLD};
use colony_core::*;

fn envelope(tick: u64, command: Command) -> CommandEnvelope {
    CommandEnvelope {
        id: CommandId(format!("cmd_{tick:06}")),
        issued_by: ActorId::from(MAYOR),
        issued_tick: tick,
        execute_at_tick: tick,
        command,
    }
}

#[test]
fn full_research_lifecycle() {
    let content = base_content();
    let registry = base_registry();
    let mut state = base_state(&content);
    let mut rng = make_rng();
    let colony_id = ColonyId(1);

    let starts = [
        ("technology/woodwork", "technology", 0),
        ("civilian/housing", "civilian", 0),
        ("combat/drill", "combat", 0),
    ];
    let commands: Vec<CommandEnvelope> = starts
        .iter()
        .map(|(id, branch, depth)| {
            envelope(
                0,
                Command::BeginResearch {
                    colony_id,
                    research_id: ResearchId::from(*id),
                    branch: BranchId::from(*branch),
                    depth: *depth,
                },
            )
        })
        .collect();
    tick(
        &mut state,
        &commands,
        &registry,
        &RequiresAssignedWorker,
        &mut rng,
        EventLevel::Normal,
    );
    assert_eq!(state.colony(colony_id).unwrap().research.len(), 3);

    // Some organic progress on the technology branch.
    let cmd = envelope(
        1,
        Command::Contribute {
            colony_id,
            research_id: ResearchId::from("technology/woodwork"),
            amount: 45,
        },
    );
    tick(
        &mut state,
        &[cmd],
        &registry,
        &RequiresAssignedWorker,
        &mut rng,
        EventLevel::Normal,
    );

    let operators = OperatorList([ActorId::from("actor_operator")].into_iter().collect());
    let mut refunds = NoRefund;
    let mut admin = ResearchAdmin::new(&registry, &operators, &mut refunds);
    let mayor = Invoker {
        actor: ActorId::from(MAYOR),
        dimension: DimensionId::from(OVERWORLD),
    };
    let operator = Invoker {
        actor: ActorId::from("actor_operator"),
        dimension: DimensionId::from(OVERWORLD),
    };
    let mut sink = MessageLog::default();
    let mut events = Vec::new();

    let listed = admin.execute(
        &mut state,
        &mayor,
        &AdminRequest::List { colony_id },
        &mut sink,
        &mut events,
    );
    assert!(listed.success);
    assert_eq!(
        listed.messages,
        [
            "ID: technology/woodwork (0:45)",
            "ID: civilian/housing (0:30)",
            "ID: combat/drill (0:45)",
        ]
    );

    let cancelled = admin.execute(
        &mut state,
        &mayor,
        &AdminRequest::Cancel {
            colony_id,
            research_id: "civilian/housing".to_string(),
        },
        &mut sink,
        &mut events,
    );
    assert!(cancelled.success);

    let denied = admin.execute(
        &mut state,
        &mayor,
        &AdminRequest::Complete {
            colony_id,
            research_id: "combat/drill".to_string(),
        },
        &mut sink,
        &mut events,
    );
    assert!(!denied.success);

    let forced = admin.execute(
        &mut state,
        &operator,
        &AdminRequest::Complete {
            colony_id,
            research_id: "combat/drill".to_string(),
        },
        &mut sink,
        &mut events,
    );
    assert!(forced.success);
    assert_eq!(sink.delivered.len(), 6);

    let events = tick(
        &mut state,
        &[],
        &registry,
        &RequiresAssignedWorker,
        &mut rng,
        EventLevel::Normal,
    );
    assert!(events.iter().any(|e| e.event
        == Event::ResearchCompleted {
            colony_id,
            research_id: ResearchId::from("combat/drill"),
        }));

    let colony = state.colony(colony_id).unwrap();
    assert_eq!(colony.research.completed(), [ResearchId::from("combat/drill")]);
    let remaining: Vec<&str> = colony
        .research
        .in_progress()
        .iter()
        .map(|record| record.id().0.as_str())
        .collect();
    assert_eq!(remaining, ["technology/woodwork"]);
}

#[test]
fn state_round_trips_through_json() {
    let content = base_content();
    let registry = base_registry();
    let mut state = base_state(&content);
    state
        .colony_mut(ColonyId(1))
        .unwrap()
        .research
        .begin(
            &registry,
            ResearchId::from("civilian/housing"),
            BranchId::from("civilian"),
            1,
        )
        .unwrap();

    let json = serde_json::to_string(&state).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(
        restored.colony(ColonyId(1)).unwrap().research,
        state.colony(ColonyId(1)).unwrap().research
    );
}
