use anyhow::Result;

use crate::config::MarginaliaConfig;
use crate::persona::PersonaCatalog;

/// Print the configured persona catalog.
pub fn personas(config: &MarginaliaConfig) -> Result<()> {
    let (catalog, source) = match config.resolved_personas_path() {
        Some(path) => (PersonaCatalog::load_from(&path)?, path.display().to_string()),
        None => (PersonaCatalog::builtin(), "built-in".to_string()),
    };

    println!("Personas ({source})");
    println!("{}", "=".repeat(40));
    for (id, persona) in catalog.iter() {
        println!("  {:<12} {} ({}, {})", id, persona.name, persona.icon, persona.color);
        if !persona.system_prompt.is_empty() {
            println!("               {}", persona.system_prompt);
        }
    }

    Ok(())
}
