// ============================================================
// Layer 1 — CLI Layer
// ============================================================
// Clap surface of the binary. Each subcommand owns its argument
// struct in commands.rs and converts it into a use case; nothing
// below this layer sees clap types.

/// Per-subcommand argument structs and their use-case conversion
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use self::commands::{CopyTaskArgs, Seq2ClfArgs, Seq2SeqArgs};

#[derive(Parser)]
#[command(name = "seqtrain", about = "Sequence model training loops", version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an LSTM encoder/decoder on aligned source/target files
    #[command(name = "seq2seq")]
    Seq2Seq(Seq2SeqArgs),
    /// Train a convolutional sequence classifier on labeled sources
    #[command(name = "seq2clf")]
    Seq2Clf(Seq2ClfArgs),
    /// Train seq2seq on the synthetic copy dataset (sanity check)
    CopyTask(CopyTaskArgs),
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Seq2Seq(args) => args.into_use_case().run(),
            Commands::Seq2Clf(args) => args.into_use_case().run(),
            Commands::CopyTask(args) => args.into_use_case().run(),
        }
    }
}
