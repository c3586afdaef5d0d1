//! Entry point for the nctoolbox application.
//! Handles CLI parsing and logging setup, and dispatches the selected command.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command, RequestArgs};
use nctoolbox::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = match args.threads {
        Some(threads) => ParallelConfig::with_threads(threads),
        None => ParallelConfig::all_cores(),
    };
    pool.setup_global_pool()?;

    match args.command {
        Command::Vars { file, output } => {
            let handle = NetCDFFile::open(&file)?;
            let descriptors = print_vars(&handle, output.as_deref())?;
            if let Some(output) = output {
                println!(
                    "✅ Wrote {} variables to {}",
                    descriptors.len(),
                    output.display()
                );
            }
        }

        Command::Extract {
            file,
            request,
            head,
        } => {
            let handle = NetCDFFile::open(&file)?;
            let extracted = extract(&handle, &request.var_request(), &extract_options(&request))?;
            report_diagnostics(&extracted.diagnostics);
            match extracted.result {
                Some(Extraction::Table(table)) => table.print_head(head),
                Some(Extraction::Arrays(arrays)) => {
                    println!("\n Variables do not share the time dimension:");
                    for (name, data) in &arrays {
                        println!("    {name}: shape {:?}", data.shape());
                    }
                }
                None => println!("⚠ No matching variables in {}", file.display()),
            }
        }

        Command::Summary {
            folder,
            filter,
            brief,
            sep,
        } => {
            let folder = NetCDFFolder::discover(&folder, &filter.file_filter())?;
            folder.summary(!brief, &sep);
        }

        Command::Process {
            folder,
            filter,
            request,
            include,
            save_to,
            key,
            parallel,
            head,
        } => {
            let folder = NetCDFFolder::discover(&folder, &filter.file_filter())?;
            let options = ProcessOptions {
                include,
                save_to,
                key,
                extract: extract_options(&request),
                parallel: parallel || args.threads.is_some(),
            };
            let aggregation = folder.process(&request.var_request(), &options)?;
            report_diagnostics(&aggregation.diagnostics);

            match &aggregation.table {
                Some(table) => table.print_head(head),
                None => println!("⚠ No file produced a table"),
            }
            if let Some(path) = &aggregation.saved_to {
                println!("✅ Saved result to {}", path.display());
            }
            if let Some(error) = &aggregation.save_error {
                eprintln!("⚠ {error}");
            }
        }

        Command::Show { file, key, head } => {
            let table = read_table(&file, &key)?;
            table.print_head(head);
        }
    }

    Ok(())
}

fn extract_options(request: &RequestArgs) -> ExtractOptions {
    ExtractOptions {
        resample: request.resample.clone(),
        reducer: request.how,
        tolerate_empty: request.tolerate_empty,
    }
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        if !matches!(diagnostic, Diagnostic::UnmatchedToken { .. }) {
            tracing::info!("{diagnostic}");
        }
    }
}
