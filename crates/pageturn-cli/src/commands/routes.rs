use anyhow::Result;

use pageturn_core::transition::{SelectionReason, TransitionTable};
use pageturn_core::AppConfig;

pub fn run(config: &AppConfig) -> Result<()> {
    let table = TransitionTable::from_config(config)?;
    let namespaces: Vec<&str> = config.views.iter().map(|v| v.namespace.as_str()).collect();

    if namespaces.is_empty() {
        println!("No views configured.");
        return Ok(());
    }

    println!("Transitions ({} declared):\n", table.defs().len());

    let width = namespaces.iter().map(|n| n.len()).max().unwrap_or(0).max(6);
    let origins = std::iter::once(None).chain(namespaces.iter().copied().map(Some));
    for from in origins {
        for &to in &namespaces {
            if from == Some(to) {
                continue;
            }
            let selection = table.select(from, to);
            let reason = match selection.reason {
                SelectionReason::Boot => "boot",
                SelectionReason::Matched => "matched",
                SelectionReason::Default => "default",
                SelectionReason::Fallback => "fallback",
            };
            println!(
                "  {:<width$} -> {:<width$}  {} ({})",
                from.unwrap_or("(boot)"),
                to,
                selection.def.name,
                reason,
                width = width
            );
        }
    }

    Ok(())
}
