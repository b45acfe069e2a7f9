use std::io::Write;

use crate::intent::Intent;
use crate::provider::ProviderChoice;

/// One line per routing decision.
pub fn decision(choice: ProviderChoice, intent: Intent) {
    println!(
        "[ai] provider={} fallback={} intent={}",
        choice.kind, choice.fallback, intent
    );
    std::io::stdout().flush().ok();
}

/// A best-effort feature degraded; the request itself still succeeds.
pub fn degrade(what: &str, detail: &str) {
    eprintln!("[degrade] {what}: {detail}");
    std::io::stderr().flush().ok();
}
