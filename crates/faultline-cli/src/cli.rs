//! CLI command parsing.

use clap::{ArgAction, Parser, Subcommand};
use faultline_core::RunConfig;

/// faultline - typed failure pipelines from the command line.
#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Run demo pipelines with typed failures and defects")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Let panics in steps unwind instead of turning them into defects.
    #[arg(long, global = true)]
    pub no_catch_panics: bool,

    /// Log every stage at debug level.
    #[arg(
        long,
        env = "FAULTLINE_TRACE_STEPS",
        default_value_t = true,
        action = ArgAction::Set,
        global = true
    )]
    pub trace_steps: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run_config(&self) -> RunConfig {
        RunConfig::new()
            .with_catch_panics(!self.no_catch_panics)
            .with_trace_steps(self.trace_steps)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Divide A by B.
    #[command(allow_negative_numbers = true)]
    Divide {
        a: f64,
        b: f64,

        /// Recover from a division by zero with a message.
        #[arg(long)]
        recover: bool,
    },

    /// divide, square, then run two fallible steps.
    #[command(allow_negative_numbers = true)]
    Pipeline {
        a: f64,
        b: f64,

        /// Force the first step to fail with FooError.
        #[arg(long)]
        fail_foo: bool,

        /// Force the second step to fail with BarError.
        #[arg(long)]
        fail_bar: bool,

        /// Make the second step panic.
        #[arg(long)]
        panic: bool,

        /// Recover from every expected failure.
        #[arg(long)]
        recover_all: bool,

        /// Run on the async interpreter, yielding between stages.
        #[arg(long = "async")]
        run_async: bool,
    },

    /// Lift a JSON failure such as `{"_tag":"FooError","n":1}` into the
    /// demo failure union.
    Decode {
        json: String,
    },
}
