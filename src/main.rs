use structopt::StructOpt;

use sethic::compiler::compile_program;
use sethic::error::SourceMetadata;
use sethic::labeling::{describe_weights, label_program};
use sethic::parser::Parser;

use tracing_subscriber::fmt;

fn main() {
    if let Err(ref e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), anyhow::Error> {
    use std::fs;

    let opt = Opt::from_args();

    if let Some((_, filter)) = std::env::vars().find(|x| x.0 == "SETHIC_TRACE") {
        fmt::Subscriber::builder()
            .with_ansi(true)
            .pretty()
            .with_env_filter(filter)
            .init();
    }

    let filename = opt.file;
    let file = fs::read_to_string(&filename)?;
    let out_file = opt.output.unwrap_or_else(|| filename.with_extension("s"));
    let meta = SourceMetadata::new(&file).with_file(filename);

    let program = Parser::new(&meta).parse_program()?;
    let weights = label_program(&program);
    if opt.weights {
        for line in describe_weights(&program, &weights) {
            println!("{}", line);
        }
    }
    let output = compile_program(&program, &weights, &meta)?;
    log::debug!("generated {} functions", program.functions.0.len());

    // nothing is written unless generation succeeded
    fs::write(&out_file, output.to_string())?;
    log::debug!("wrote {}", out_file.display());

    Ok(())
}

#[derive(Debug, StructOpt)]
struct Opt {
    /// The file to compile
    #[structopt(parse(from_os_str))]
    file: std::path::PathBuf,
    /// The (optional) output file, defaults to the input with a `.s` extension
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: Option<std::path::PathBuf>,
    /// Print every expression with its register weight
    #[structopt(short = "w", long = "weights")]
    weights: bool,
}
