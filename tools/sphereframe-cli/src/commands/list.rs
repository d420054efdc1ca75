//! List registered modules.

use sphereframe_module_engine::{ModuleCategory, ModuleRegistry};

pub fn run(category: Option<String>, json: bool) -> anyhow::Result<()> {
    let registry = ModuleRegistry::with_builtins();
    let modules = match category {
        Some(name) => {
            let category = ModuleCategory::parse(&name).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown category '{name}'. Expected one of: {}",
                    ModuleCategory::ALL.map(|c| c.as_str()).join(", ")
                )
            })?;
            registry.list_by_category(category)
        }
        None => registry.list(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    println!("{:<22} {:<14} {:>6}  DESCRIPTION", "NAME", "CATEGORY", "INPUTS");
    for m in &modules {
        println!(
            "{:<22} {:<14} {:>6}  {}",
            m.name,
            m.category.as_str(),
            m.input_frames,
            m.tooltip
        );
    }
    println!("\n{} module(s)", modules.len());
    Ok(())
}
