//! Show a module's metadata and options.

use serde::Serialize;
use sphereframe_module_engine::{ModuleMetadata, ModuleRegistry, OptionKind, OptionSpec};

#[derive(Serialize)]
struct Description<'a> {
    #[serde(flatten)]
    metadata: ModuleMetadata,
    options: &'a [OptionSpec],
}

pub fn run(name: &str, json: bool) -> anyhow::Result<()> {
    let registry = ModuleRegistry::with_builtins();
    let module = registry.create_instance(name)?;
    let metadata = module.metadata();

    if json {
        let description = Description {
            metadata,
            options: module.options().specs(),
        };
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }

    println!("Module: {}", metadata.name);
    println!("  Category: {}", metadata.category);
    println!("  {}", metadata.tooltip);
    println!("  Input frames per call: {}", metadata.input_frames);

    let flags = metadata.flags;
    let set: Vec<&str> = [
        (flags.requires_options, "requires-options"),
        (flags.requires_new_window, "requires-new-window"),
        (flags.skip_while_playing, "skip-while-playing"),
        (flags.variable_frame_count, "variable-frame-count"),
    ]
    .into_iter()
    .filter_map(|(on, label)| on.then_some(label))
    .collect();
    if !set.is_empty() {
        println!("  Flags: {}", set.join(", "));
    }
    println!();

    if module.options().is_empty() {
        println!("No options.");
        return Ok(());
    }
    println!("Options:");
    for spec in module.options().specs() {
        let kind = match &spec.kind {
            OptionKind::Int { min, max } => format!("int {min}..={max}"),
            OptionKind::Float { min, max } => format!("float {min}..={max}"),
            OptionKind::Bool => "bool".to_string(),
            OptionKind::Text => "text".to_string(),
        };
        println!("  {} ({kind}, default {})", spec.name, spec.default);
        println!("      {}", spec.description);
    }
    Ok(())
}
