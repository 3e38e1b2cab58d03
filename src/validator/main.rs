//! Standalone validator for template catalog files.
//!
//! Checks a catalog JSON file for proper structure, known template ids,
//! unique ids, and valid colors and sections.

use std::process::ExitCode;

use clap::Parser;

use sitecraft_bot::config::Catalog;

/// Template catalog validator.
#[derive(Parser, Debug)]
#[command(name = "validate_catalog")]
#[command(about = "Validates template and theme catalog files for the site builder")]
#[command(version)]
struct Args {
    /// Path to the JSON catalog file to validate.
    #[arg(short, long, default_value = "catalog.json")]
    file: String,

    /// Generate an example catalog file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// Show detailed information for each entry.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_catalog(&args.file, args.verbose)
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = Catalog::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example catalog written to: {output_path}");
            println!(
                "\nThe file contains {} templates and {} themes.",
                example.templates.len(),
                example.themes.len()
            );
            println!("Template ids must stay one of: memecoin, nft, defi.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_catalog(path: &str, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    let catalog = match Catalog::load_from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    if verbose {
        for template in &catalog.templates {
            println!(
                "[template {}] {} - \"{}\"",
                template.id,
                template.name,
                truncate(&template.description, 40)
            );
            println!("  sections: {}", template.default_sections.join(", "));
        }
        for theme in &catalog.themes {
            let colors = &theme.colors;
            println!(
                "[theme {}] {} ({}, {}, {})",
                theme.id, theme.name, colors.primary, colors.secondary, colors.accent
            );
        }
        println!();
    }

    let results = catalog.validate_all();
    let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    for e in &errors {
        println!("  ✗ Error: {e}");
    }

    let total = catalog.templates.len() + catalog.themes.len();
    if errors.is_empty() {
        println!(
            "✓ All {total} entries are valid ({} templates, {} themes)",
            catalog.templates.len(),
            catalog.themes.len()
        );

        let missing: Vec<_> = sitecraft_bot::config::TemplateKind::ALL
            .iter()
            .filter(|kind| !catalog.templates.iter().any(|t| t.kind() == Some(**kind)))
            .map(|kind| kind.as_str())
            .collect();
        if !missing.is_empty() {
            println!("  ⚠ Warning: no entry for template(s): {}", missing.join(", "));
        }

        ExitCode::SUCCESS
    } else {
        println!("\n✗ Validation failed: {} error(s) in {total} entries", errors.len());
        ExitCode::FAILURE
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
