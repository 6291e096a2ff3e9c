//! The `info` subcommand: describe a VPF database.

use std::path::PathBuf;

use clap::Args;
use vpfmap::LibrarySelectionTable;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// VPF root paths, each containing a library attribute table ("lat")
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

pub fn run(args: InfoArgs) -> Result<(), CliError> {
    let lst = LibrarySelectionTable::new(&args.paths)?;

    let name = lst.database_name();
    println!(
        "Database: {}",
        if name.is_empty() { "(unnamed)" } else { name }
    );

    for library in lst.libraries() {
        let extent = library.extent();
        println!(
            "Library {} [{:.1}W {:.1}S .. {:.1}E {:.1}N] {}",
            library.name(),
            extent.west(),
            extent.south(),
            extent.east(),
            extent.north(),
            if library.is_tiled() { "tiled" } else { "untiled" },
        );
        for coverage in library.coverages() {
            println!("  {}", coverage);
        }
    }

    Ok(())
}
