use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(
    name = "seqgan",
    version,
    about = "SeqGAN: adversarial training of sequence generators against a synthetic oracle"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the SeqGAN schedule (resumes from checkpoints when present)
    Train(cli::train::TrainArgs),
    /// Print sequences from the latest trained generator
    Sample(cli::sample::SampleArgs),
    /// Print a configuration as JSON
    Config(cli::config::ConfigArgs),
}

fn main() {
    seqgan::telemetry::init_tracing("seqgan=info");
    let cli = Cli::parse();

    match cli.command {
        Command::Train(args) => cli::train::cmd_train(args),
        Command::Sample(args) => cli::sample::cmd_sample(args),
        Command::Config(args) => cli::config::cmd_config(args),
    }
}
