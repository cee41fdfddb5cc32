//! Doctor command handler
//!
//! Handles `gopin doctor`: checks everything a pin run depends on.

use anyhow::Result;
use colored::*;

use crate::config::{GOPATH_VAR, GOROOT_VAR, GoEnv, Settings};
use crate::vcs::VCS_LIST;

/// Run the `gopin doctor` command. Returns `false` when a required piece
/// (fetch tool or GOPATH) is missing.
pub fn run_doctor() -> Result<bool> {
    println!("{} Running System Doctor...", "🚑".red());
    println!("-------------------------------");

    let settings = Settings::load()?;
    let mut healthy = true;

    print!("Checking fetch tool ({})... ", settings.fetch_tool);
    match which::which(&settings.fetch_tool).ok() {
        Some(path) => println!("{} ({})", "Found".green(), path.display()),
        None => {
            println!("{}", "Not Found (Install Go)".red());
            healthy = false;
        }
    }

    print!("Checking {}... ", GOPATH_VAR);
    match GoEnv::from_env() {
        Ok(env) => {
            let roots: Vec<String> = env.gopath.iter().map(|p| p.display().to_string()).collect();
            println!("{}", roots.join(", ").green());
            print!("Checking {}... ", GOROOT_VAR);
            match env.goroot {
                Some(root) => println!("{}", root.display().to_string().green()),
                None => println!("{}", "Not Set (Optional)".yellow()),
            }
        }
        Err(_) => {
            println!("{}", "Not Set".red());
            healthy = false;
        }
    }

    for vcs in VCS_LIST {
        print!("Checking {} ({})... ", vcs.name, vcs.tool);
        match which::which(vcs.tool).ok() {
            Some(path) => println!("{} ({})", "Found".green(), path.display()),
            None => println!("{}", "Not Found (Optional)".yellow()),
        }
    }

    if let Some(path) = crate::config::settings_path() {
        print!("Checking settings... ");
        if path.exists() {
            println!("{}", path.display().to_string().cyan());
        } else {
            println!("{}", "Defaults".cyan());
        }
    }

    Ok(healthy)
}
