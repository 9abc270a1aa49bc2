//! Output formatting module for kubelab
//!
//! Provides colored, verbosity-aware output for the CLI. Errors and warnings
//! go to stderr so that stdout stays clean for machine-readable output such
//! as `kubelab stack output --json`.

use colored::Colorize;
use kubelab::provision::{DropletSpec, StackPlan};

/// Output formatter for the CLI
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color = use_color && std::env::var("NO_COLOR").is_err();
        if !use_color {
            colored::control::set_override(false);
        }

        Self {
            use_color,
            verbosity,
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an informational message (shown with -v)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a success message (always shown)
    pub fn success(&self, message: &str) {
        if self.use_color {
            println!("{}", message.green().bold());
        } else {
            println!("{}", message);
        }
    }

    /// Print a key/value line (always shown)
    pub fn field(&self, key: &str, value: &str) {
        if self.use_color {
            println!("  {:<20} {}", key.bright_white().bold(), value);
        } else {
            println!("  {:<20} {}", key, value);
        }
    }

    /// Print the resources of a plan
    pub fn plan(&self, plan: &StackPlan) {
        let key = format!(
            "+ ssh-key   {:<16} {}",
            plan.ssh_key.name,
            abbreviate_key(&plan.ssh_key.public_key)
        );
        if self.use_color {
            println!("{}", key.green());
        } else {
            println!("{}", key);
        }

        for droplet in plan.droplets() {
            let line = droplet_line(droplet);
            if self.use_color {
                println!("{}", line.green());
            } else {
                println!("{}", line);
            }
        }
    }
}

fn droplet_line(droplet: &DropletSpec) -> String {
    format!(
        "+ droplet   {:<16} size={} image={} region={} tags={}",
        droplet.name,
        droplet.size,
        droplet.image,
        droplet.region,
        droplet.tags.join(",")
    )
}

/// Keep the key type and comment, elide the base64 body
fn abbreviate_key(public_key: &str) -> String {
    let parts: Vec<&str> = public_key.split_whitespace().collect();
    match parts.as_slice() {
        [kind, body, rest @ ..] if body.len() > 12 && body.is_ascii() => {
            let mut shown = format!("{} {}...{}", kind, &body[..6], &body[body.len() - 6..]);
            for part in rest {
                shown.push(' ');
                shown.push_str(part);
            }
            shown
        }
        _ => public_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_key() {
        assert_eq!(
            abbreviate_key("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIGx lab@example"),
            "ssh-ed25519 AAAAC3...AAAIGx lab@example"
        );
        assert_eq!(abbreviate_key("ssh-rsa short"), "ssh-rsa short");
    }
}
