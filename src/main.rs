use clap::Parser;
use eduforge::cli::{
    handle_archive, handle_describe, handle_generate, handle_list, handle_new, handle_preview,
    handle_prompt, handle_revise, handle_studio, handle_validate, load_config, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "eduforge=warn",
        1 => "eduforge=info",
        _ => "eduforge=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::New { path, force } => handle_new(path, force),
        Commands::Validate { spec } => handle_validate(&config, spec),
        Commands::Prompt { spec, json } => handle_prompt(&config, spec, json),
        Commands::Generate { spec, scene, zip } => handle_generate(&config, spec, scene, zip),
        Commands::Revise {
            artifact,
            instruction,
            zip,
        } => handle_revise(&config, artifact, instruction, zip),
        Commands::Describe { image } => handle_describe(&config, image),
        Commands::Archive { artifact } => handle_archive(&config, artifact),
        Commands::List { json } => handle_list(&config, json),
        Commands::Studio { spec } => handle_studio(&config, spec),
        Commands::Preview { artifact, port } => handle_preview(&config, artifact, port),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
