use clap::Parser;
use std::process;

use taskdesk::cli;
use taskdesk::cli::commands::{Cli, Commands};
use taskdesk::cli::identity::Claims;

fn main() {
    let cli_args = Cli::parse();
    let json_output = cli_args.json;
    let claims = Claims {
        actor: cli_args.actor.clone(),
        role: cli_args.role.clone(),
        dept: cli_args.dept.clone(),
        as_of: cli_args.as_of.clone(),
    };

    let exit_code = match cli_args.command {
        Commands::Init => cli::init::run(json_output),
        Commands::Task(cmd) => cli::task::run(cmd, json_output, &claims),
        Commands::Status => cli::status::run(json_output, &claims),
    };

    process::exit(exit_code);
}
