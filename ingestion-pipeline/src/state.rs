use state_machines::state_machine;

/// The per-chunk ingestion pipeline stages, mirroring the template's
/// `IngestionMachine`: C1 (chunking) has already happened by the time a
/// chunk enters this machine, so it starts at `Chunked` and moves through
/// C2 (extraction, with its own internal glean/retry loop — see
/// `extraction::driver`), C3 (merge), and C4 (vector sync).
state_machine! {
    name: IngestionMachine,
    state: IngestionState,
    initial: Chunked,
    states: [Chunked, Extracted, Merged, Synced, Failed],
    events {
        extract { transition: { from: Chunked, to: Extracted } }
        merge { transition: { from: Extracted, to: Merged } }
        sync { transition: { from: Merged, to: Synced } }
        abort {
            transition: { from: Chunked, to: Failed }
            transition: { from: Extracted, to: Failed }
            transition: { from: Merged, to: Failed }
        }
    }
}

pub fn chunked() -> IngestionMachine<(), Chunked> {
    IngestionMachine::new(())
}
