//! Diagnostics-only registry exports.
//!
//! Serialises a registry for consumption by external tooling, in the same
//! spirit as the `unused` query but with invocation counts attached.

use serde::Serialize;

use super::Steps;

#[derive(Serialize)]
struct DumpedStep<'a> {
    pattern: &'a str,
    invocations: usize,
    used: bool,
}

#[derive(Serialize)]
struct RegistryDump<'a> {
    match_mode: &'static str,
    steps: Vec<DumpedStep<'a>>,
}

impl Steps {
    /// Serialise the registry's patterns and invocation counts as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn dump_json(&self) -> serde_json::Result<String> {
        let steps = self
            .iter()
            .map(|def| DumpedStep {
                pattern: def.pattern(),
                invocations: def.invocations(),
                used: def.invocations() > 0,
            })
            .collect();
        serde_json::to_string(&RegistryDump {
            match_mode: self.mode.as_str(),
            steps,
        })
    }
}
