#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "paramtree", about = "Parameterized asset inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Classes {
		#[arg(long)]
		json: bool,
	},
	Schema {
		class: String,
		#[arg(long)]
		json: bool,
	},
	Show(cmd::show::Args),
	Get {
		image: PathBuf,
		path: String,
		#[arg(long)]
		json: bool,
	},
	New {
		class: String,
		#[arg(short = 'o', long = "output")]
		output: PathBuf,
		#[arg(long)]
		zstd: bool,
	},
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> paramtree::param::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Classes { json } => cmd::classes::run(json),
		Commands::Schema { class, json } => cmd::schema::run(class, json),
		Commands::Show(args) => cmd::show::run(args),
		Commands::Get { image, path, json } => cmd::get::run(image, path, json),
		Commands::New { class, output, zstd } => cmd::new::run(class, output, zstd),
	}
}
