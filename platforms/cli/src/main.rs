use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use minsky::binarize::{Binarization, BinarizationMap, Binarizer};
use minsky::runner::{Runner, Stepper};
use minsky::tag::WordTrace;
use minsky::types::Step;
use minsky::{
    CanonicalSystem, MachineDefinition, Outcome, ProgramLoader, ProgramManager, RewriteTrace,
    TagPipeline, TagSystem, TuringMachine, TwoTagEngine,
};
use serde::Serialize;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_MAX_STEPS: usize = 1_000_000;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Log library events (same as RUST_LOG=minsky=debug)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Turing machine directly
    Run {
        /// A `.tm` file or the name of an embedded machine
        program: String,

        /// Input tape; defaults to the machine's initial tape
        #[clap(short, long)]
        input: Option<String>,

        /// Run the binarized machine and decode its tape
        #[clap(short, long)]
        binarize: bool,

        /// Print every configuration
        #[clap(short, long)]
        trace: bool,

        #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Run a Turing machine through its two-tag image
    Compile {
        /// A `.tm` file or the name of an embedded machine
        program: String,

        /// Input tape; defaults to the machine's initial tape
        #[clap(short, long)]
        input: Option<String>,

        /// Print the productions instead of running them
        #[clap(long)]
        rules: bool,

        /// Print every tag word
        #[clap(short, long)]
        trace: bool,

        #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,

        /// Print the result as JSON
        #[clap(long)]
        json: bool,
    },
    /// Run a tag system given as text rules
    Tag {
        /// Comma-separated symbols, e.g. `a1,a2,a3`
        #[clap(short, long)]
        alphabet: String,

        /// A production such as `a1 -> a2a1a3`; `*` halts, `_` is empty
        #[clap(short, long = "rule")]
        rules: Vec<String>,

        /// Initial word
        #[clap(short, long)]
        word: String,

        /// Print every word
        #[clap(short, long)]
        trace: bool,

        #[clap(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,
    },
    /// Rewrite a string with a canonical system
    Canonical {
        /// Comma-separated symbols, e.g. `1,P`
        #[clap(short, long)]
        alphabet: String,

        /// A production such as `($1)P($2) -> ($1)11P($2)($1)`
        #[clap(short, long = "rule")]
        rules: Vec<String>,

        /// Input string
        #[clap(short, long)]
        input: String,

        /// Number of times to apply the whole rule list
        #[clap(short, long, default_value_t = 1)]
        passes: usize,

        /// Print the string after every production
        #[clap(short, long)]
        trace: bool,
    },
    /// List the embedded machines
    Programs {
        /// Print the list as JSON
        #[clap(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct RunReport {
    machine: String,
    outcome: Outcome,
    state: String,
    steps: usize,
    tape: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("minsky=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            program,
            input,
            binarize,
            trace,
            max_steps,
            json,
        } => run_machine(&program, input, binarize, trace, max_steps, json),
        Commands::Compile {
            program,
            input,
            rules,
            trace,
            max_steps,
            json,
        } => compile_machine(&program, input, rules, trace, max_steps, json),
        Commands::Tag {
            alphabet,
            rules,
            word,
            trace,
            max_steps,
        } => run_tag(&alphabet, &rules, &word, trace, max_steps),
        Commands::Canonical {
            alphabet,
            rules,
            input,
            passes,
            trace,
        } => run_canonical(&alphabet, &rules, &input, passes, trace),
        Commands::Programs { json } => list_programs(json),
    }
}

/// Loads `program` from a file if one exists at that path, otherwise from the catalogue.
fn resolve(program: &str) -> Result<MachineDefinition> {
    let path = Path::new(program);
    let definition = if path.exists() {
        ProgramLoader::load_program(path)
    } else {
        ProgramManager::get_program_by_name(program)
    };

    definition.with_context(|| format!("Cannot load program '{program}'"))
}

fn split_alphabet(alphabet: &str) -> Vec<&str> {
    alphabet
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn run_machine(
    program: &str,
    input: Option<String>,
    binarize: bool,
    trace: bool,
    max_steps: usize,
    json: bool,
) -> Result<()> {
    let definition = resolve(program)?;
    let input = input.unwrap_or_else(|| definition.initial_tape.clone());

    let (definition, map): (MachineDefinition, Option<BinarizationMap>) = if binarize {
        match Binarizer::binarize(&definition)? {
            Binarization::Identity(definition) => (definition, None),
            Binarization::Binarized(machine) => (machine.definition, Some(machine.map)),
        }
    } else {
        (definition, None)
    };

    let machine_input: String = match &map {
        Some(map) => {
            let symbols: Vec<char> = input.chars().collect();
            map.encode_tape(&symbols)?.into_iter().collect()
        }
        None => input,
    };
    debug!(machine = %definition.name, input = %machine_input, "running machine");

    let mut machine = TuringMachine::new(definition)?;
    machine.load(machine_input.as_str())?;
    if trace {
        println!("{}", machine.trace());
    }

    while machine.step()? == Step::Continue {
        if machine.step_count() > max_steps {
            bail!("Machine did not halt within {max_steps} steps");
        }
        if trace {
            println!("{}", machine.trace());
        }
    }

    let tape = match &map {
        Some(map) => map.decode_tape_string(&machine.tape().cells(), machine.tape().head())?,
        None => machine.tape().render(),
    };
    let report = RunReport {
        machine: machine.definition().name.clone(),
        outcome: machine.output(),
        state: machine.state().to_string(),
        steps: machine.step_count(),
        tape,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{:?} in state {} after {} steps\n{}",
            report.outcome, report.state, report.steps, report.tape
        );
    }

    Ok(())
}

fn compile_machine(
    program: &str,
    input: Option<String>,
    rules: bool,
    trace: bool,
    max_steps: usize,
    json: bool,
) -> Result<()> {
    let definition = resolve(program)?;
    let input = input.unwrap_or_else(|| definition.initial_tape.clone());
    let pipeline = TagPipeline::new(&definition)?;

    if rules {
        let system = pipeline.compiled().system();
        if json {
            println!("{}", serde_json::to_string_pretty(system)?);
        } else {
            for production in system.productions() {
                println!("{production}");
            }
        }
        return Ok(());
    }

    let run = if trace {
        pipeline.run_traced(&input, max_steps, Some(&mut |t: &WordTrace| println!("{t}")))?
    } else {
        pipeline.run(&input, max_steps)?
    };
    let Some(run) = run else {
        bail!("Tag system did not halt within {max_steps} steps");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!(
            "{:?} after {} tag steps ({} productions, longest word {})\n{}\n{}",
            run.outcome,
            run.steps,
            pipeline.compiled().system().len(),
            run.peak_len,
            run.decoded,
            run.tape
        );
    }

    Ok(())
}

fn run_tag(alphabet: &str, rules: &[String], word: &str, trace: bool, max_steps: usize) -> Result<()> {
    let rules: Vec<&str> = rules.iter().map(String::as_str).collect();
    let system = TagSystem::from_rules(&split_alphabet(alphabet), &rules)?;
    let mut engine = TwoTagEngine::new(&system);

    engine.load(&system.parse_word(word)?)?;
    if trace {
        println!("{:>6}  {}", engine.step_count(), engine.word().concat());
    }

    while engine.step()? == Step::Continue {
        if engine.step_count() > max_steps {
            bail!("Tag system did not halt within {max_steps} steps");
        }
        if trace {
            println!("{:>6}  {}", engine.step_count(), engine.word().concat());
        }
    }

    println!(
        "Halted after {} steps\n{}",
        engine.step_count(),
        engine.output().concat()
    );

    Ok(())
}

fn run_canonical(alphabet: &str, rules: &[String], input: &str, passes: usize, trace: bool) -> Result<()> {
    let rules: Vec<&str> = rules.iter().map(String::as_str).collect();
    let mut system = CanonicalSystem::new(&split_alphabet(alphabet), &rules)?;

    let mut word = input.to_string();
    for _ in 0..passes {
        word = if trace {
            system.run_traced(&word, &mut |t: &RewriteTrace| println!("{t}"))?
        } else {
            system.forward(&word)?
        };
    }

    println!("{word}");
    Ok(())
}

fn list_programs(json: bool) -> Result<()> {
    let programs = ProgramManager::list_programs();

    if json {
        println!("{}", serde_json::to_string_pretty(&programs)?);
        return Ok(());
    }

    for info in programs {
        println!(
            "{:>2}  {:<16} {} states, {} symbols, {} transitions, tape {}",
            info.index,
            info.name,
            info.state_count,
            info.symbol_count,
            info.transition_count,
            info.initial_tape
        );
    }

    Ok(())
}
