use entangle_sim::simulation::{EventScheduler, SignalType, SimEvent};

fn main() {
    let mut scheduler = EventScheduler::new();

    println!("entangle-sim - Event Scheduler Demo\n");

    let sig = |node: &str| SimEvent::SyncSignal {
        node: node.to_string(),
        phase: SignalType::External,
    };

    scheduler.schedule_at(0.0, sig("A"));
    scheduler.schedule_at(0.5, sig("B"));
    scheduler.schedule_at(1.0, sig("A"));
    scheduler.schedule_at(1.5, sig("B"));

    println!("Processing {} events:\n", scheduler.pending_events());

    while let Some(event) = scheduler.next_event() {
        println!("Time {:.2}s: {:?}", event.time, event.payload);
    }
}
