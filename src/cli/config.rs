use std::process;

use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the tiny smoke-run configuration instead of the defaults
    #[arg(long)]
    pub quick: bool,
}

pub fn cmd_config(args: ConfigArgs) {
    let config = super::load_config(None, args.quick);
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
