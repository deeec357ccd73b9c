use clap::{Parser, Subcommand};
use slot_gen::cmds;
use slot_gen::cmds::analyze::IrOutputFormat;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "slot-gen")]
#[command(about = "Packed storage layout compiler: one 256-bit word per struct", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Generate Solidity libraries, tests, the index and the debug library */
    Codegen {
        /* Schema files; the first one is the root */
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /* Include directories for imported schema files */
        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Output directory; files land in its src/ and test/ subdirectories */
        #[arg(
            short = 'o',
            long = "output",
            value_name = "DIR",
            default_value = "generated"
        )]
        output_dir: PathBuf,

        /* Schema generation, overriding the schema file */
        #[arg(long = "generation", value_name = "N")]
        generation: Option<u32>,

        /* Only emit the library files and the index */
        #[arg(long = "skip-tests")]
        skip_tests: bool,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Print the layout of each struct */
    Analyze {
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        #[arg(long = "generation", value_name = "N")]
        generation: Option<u32>,

        /* Print the layout IR after the tables */
        #[arg(long = "print-ir")]
        print_ir: bool,

        #[arg(long = "ir-format", value_enum, default_value = "json")]
        ir_format: IrOutputFormat,

        /* Only report this struct */
        #[arg(long = "struct", value_name = "NAME")]
        struct_name: Option<String>,
    },

    /* Resolve imports and shared fields into one schema file */
    Flatten {
        /* Root schema file */
        #[arg(short = 'f', long = "file", value_name = "FILE")]
        file: PathBuf,

        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        /* Output schema file */
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output: PathBuf,

        /* Generation to validate against and record in the output */
        #[arg(long = "generation", value_name = "N")]
        generation: Option<u32>,

        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Run the generated round-trip tests in the interpreter */
    Verify {
        #[arg(short = 'f', long = "files", value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 'i', long = "include-dir", value_name = "DIR")]
        include_dirs: Vec<PathBuf>,

        #[arg(long = "generation", value_name = "N")]
        generation: Option<u32>,

        /* Random cases per test */
        #[arg(long = "runs", default_value_t = 256)]
        runs: usize,

        #[arg(long = "seed", default_value_t = 0)]
        seed: u64,

        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Codegen {
            files,
            include_dirs,
            output_dir,
            generation,
            skip_tests,
            verbose,
        } => {
            cmds::codegen::run(files, include_dirs, output_dir, generation, skip_tests, verbose)?;
        }

        Commands::Analyze {
            files,
            include_dirs,
            generation,
            print_ir,
            ir_format,
            struct_name,
        } => {
            cmds::analyze::run(files, include_dirs, generation, print_ir, ir_format, struct_name)?;
        }

        Commands::Flatten {
            file,
            include_dirs,
            output,
            generation,
            verbose,
        } => {
            cmds::flatten::run(file, include_dirs, output, generation, verbose)?;
        }

        Commands::Verify {
            files,
            include_dirs,
            generation,
            runs,
            seed,
            verbose,
        } => {
            cmds::verify::run(files, include_dirs, generation, runs, seed, verbose)?;
        }
    }

    Ok(())
}
