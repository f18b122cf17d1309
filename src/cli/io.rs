use std::fmt;

use colored::Colorize;

/// Print an informational message.
pub fn print_info(message: impl fmt::Display) {
    println!("[i] {message}");
}

/// Print a success message.
pub fn print_success(message: impl fmt::Display) {
    println!("{}", format!("[✓] {message}").bright_green());
}

/// Print a warning message.
pub fn print_warning(message: impl fmt::Display) {
    println!("{}", format!("[!] {message}").bright_yellow());
}

/// Print an error message.
pub fn print_error(message: impl fmt::Display) {
    println!("{}", format!("[x] {message}").bright_red());
}

/// Print a section header.
pub fn print_section(title: impl fmt::Display) {
    println!("\n{}", format!("=== {title} ===").bold());
}

/// Formats an amount in naira with thousands grouping, e.g. `₦1,250,000`.
pub fn format_naira(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let negative = rounded < 0;
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (idx, ch) in digits.chars().enumerate() {
        let remaining = digits.len() - idx;
        if idx > 0 && remaining % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-₦{grouped}")
    } else {
        format!("₦{grouped}")
    }
}
