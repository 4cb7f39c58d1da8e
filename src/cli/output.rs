//! Output formatting for CLI

use crate::pipeline::SimulationResult;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print the headline numbers of a simulation run
pub fn print_result(result: &SimulationResult) {
    print_kv("Trips", &format_number(result.trials));
    print_kv(
        "Arrived",
        &format!(
            "{} ({:.1}%)",
            format_number(result.successes),
            result.success_rate * 100.0
        ),
    );
    print_kv("Deadline misses", &format_number(result.deadline_misses));
    if result.tick_limit_hits > 0 {
        print_kv("Tick limit hits", &format_number(result.tick_limit_hits));
    }
    print_kv(
        "Reward per trip",
        &format!("{:.2} ± {:.2}", result.mean_reward, result.reward_std_dev),
    );
    print_kv("Ticks per trip", &format!("{:.1}", result.mean_ticks));
}
