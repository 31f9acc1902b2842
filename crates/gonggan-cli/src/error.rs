use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{err:#}").to_lowercase();

    if msg.contains("api key") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Set your Gemini API key with:");
        eprintln!("  {} export GEMINI_API_KEY=<value>", "$".dimmed());
        eprintln!("  or run offline with {}", "--mock".bold());
    }

    if msg.contains("thread not found") || msg.contains("message not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List threads and messages with:");
        eprintln!("  {} gonggan inspect <archive> --thread <id>", "$".dimmed());
    }

    if msg.contains("connection refused") || msg.contains("network") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check your internet connection and try again.");
    }

    std::process::exit(1);
}
