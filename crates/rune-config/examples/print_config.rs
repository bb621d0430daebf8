/// Example program to print the loaded configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::MotionConfig::load();

    println!("=== Rune Motion Configuration ===\n");

    println!("Gate Settings:");
    println!("  Fallback Timeout: {}ms", config.gate.fallback_timeout_ms);
    println!("  Collision Policy: {:?}", config.gate.collision_policy);
    println!("  Detain Outgoing: {}", config.gate.detain_outgoing);
    println!("  History Limit: {}", config.gate.history_limit);
    println!();

    println!("Transition Defaults:");
    println!("  Duration: {}ms", config.transition.duration_ms);
    println!("  Delay: {}ms", config.transition.delay_ms);
    println!("  Easing: {}", config.transition.easing);
    println!();

    println!("Interaction Settings:");
    println!(
        "  Hover Leave Delay: {}ms",
        config.interaction.hover_leave_delay_ms
    );
    println!("  Debug: {}", config.debug.enabled);
    println!();

    if let Err(e) = config.validate() {
        eprintln!("Configuration is invalid: {}", e);
    }

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
